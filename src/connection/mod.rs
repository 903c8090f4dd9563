//! Connections to a message bus.

#[cfg(test)]
mod tests;

pub use self::address::Address;
mod address;

pub use self::bus_kind::BusKind;
mod bus_kind;

pub use self::connect_error::ConnectError;
mod connect_error;

#[cfg(feature = "tokio")]
use self::transport::Transport;
#[cfg(feature = "tokio")]
mod transport;

#[cfg(feature = "tokio")]
use self::send_buf::SendBuf;
#[cfg(feature = "tokio")]
mod send_buf;

#[cfg(feature = "tokio")]
use self::recv_buf::RecvBuf;
#[cfg(feature = "tokio")]
mod recv_buf;

#[cfg(feature = "tokio")]
pub use self::builder::ConnectionBuilder;
#[cfg(feature = "tokio")]
mod builder;

#[cfg(feature = "tokio")]
pub use self::connection::{Connection, ConnectionState};
#[cfg(feature = "tokio")]
mod connection;
