//! A client-side D-Bus engine for Tokio.
//!
//! This crate provides a typed message model, the D-Bus wire codec and an
//! asynchronous [`Connection`] which authenticates against a bus, registers
//! with it and exchanges messages.
//!
//! ```no_run
//! use tokio_dbus_engine::org_freedesktop_dbus::{NameFlag, NameReply};
//! use tokio_dbus_engine::{Connection, Message};
//!
//! # #[tokio::main] async fn main() -> tokio_dbus_engine::Result<()> {
//! let mut c = Connection::session_bus().await?;
//!
//! let reply = c.request_name("org.test.Demo", NameFlag::DO_NOT_QUEUE).await?;
//! assert_eq!(reply, NameReply::PRIMARY_OWNER);
//!
//! let mut m = Message::new_signal("/org/test/Demo", "org.test.Demo", "Ping")?;
//! m.append_argument("hello")?;
//! c.send(&mut m)?;
//! c.flush().await?;
//! # Ok(()) }
//! ```

#![allow(clippy::module_inception)]

#[macro_use]
mod macros;

#[doc(inline)]
pub use self::error::{DaemonError, Error, Result, SendError};
mod error;

pub mod proto;

pub(crate) mod frame;

#[doc(inline)]
pub use self::buf::{MarshalError, UnmarshalError};
mod buf;

#[doc(inline)]
pub use self::signature::{OwnedSignature, Signature, SignatureError};
pub mod signature;

#[doc(inline)]
pub use self::object_path::{ObjectPath, ObjectPathError, OwnedObjectPath};
mod object_path;

#[doc(inline)]
pub use self::names::{InvalidName, NameKind};
pub mod names;

#[doc(inline)]
pub use self::argument::{Argument, Array};
pub mod argument;

#[doc(inline)]
pub use self::message::{Message, MessageKind, Serial, SerialAllocator};
pub mod message;

#[doc(inline)]
pub use self::match_rule::{MatchRule, MatchRuleError};
mod match_rule;

pub mod sasl;

pub mod org_freedesktop_dbus;

#[doc(inline)]
pub use self::connection::{BusKind, ConnectError};
#[cfg(feature = "tokio")]
#[doc(inline)]
pub use self::connection::{Connection, ConnectionBuilder, ConnectionState};
pub mod connection;
