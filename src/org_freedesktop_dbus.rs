//! Types and messages associated with the `org.freedesktop.DBus` interface.

use crate::error::Result;
use crate::{MatchRule, Message};

/// Well known destination name.
pub const DESTINATION: &str = "org.freedesktop.DBus";

/// Well known interface name.
pub const INTERFACE: &str = "org.freedesktop.DBus";

/// Well known D-Bus path.
pub const PATH: &str = "/org/freedesktop/DBus";

/// Error name used when the destination of a call has no owner.
pub const ERROR_SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";

/// Error name used when a method does not exist.
pub const ERROR_UNKNOWN_METHOD: &str = "org.freedesktop.DBus.Error.UnknownMethod";

/// Error name used when arguments are not what the method expects.
pub const ERROR_INVALID_ARGS: &str = "org.freedesktop.DBus.Error.InvalidArgs";

raw_set! {
    /// The flags to a `RequestName` call.
    #[repr(u32)]
    pub enum NameFlag {
        /// If an application A specifies this flag and succeeds in becoming the
        /// owner of the name, and another application B later calls
        /// `RequestName` with the `REPLACE_EXISTING` flag, then application A
        /// will lose ownership and receive a `org.freedesktop.DBus.NameLost`
        /// signal, and application B will become the new owner.
        ALLOW_REPLACEMENT = 1,
        /// Try to replace the current owner if there is one. The application
        /// only replaces the current owner if that owner specified
        /// `ALLOW_REPLACEMENT`.
        REPLACE_EXISTING = 2,
        /// Without this flag, if an application requests a name that is already
        /// owned, the application will be placed in a queue to own the name
        /// when the current owner gives it up. If this flag is given, the
        /// request for the name will simply fail.
        DO_NOT_QUEUE = 4,
    }
}

raw_enum! {
    /// The reply to a `RequestName` call.
    #[repr(u32)]
    pub enum NameReply {
        /// The caller is now the primary owner of the name, replacing any
        /// previous owner.
        PRIMARY_OWNER = 1,
        /// The name already had an owner, [`NameFlag::DO_NOT_QUEUE`] was not
        /// specified, and the owner could not be replaced.
        IN_QUEUE = 2,
        /// The name already has an owner, [`NameFlag::DO_NOT_QUEUE`] was
        /// specified, and the owner could not be replaced.
        EXISTS = 3,
        /// The application trying to request ownership of a name is already the
        /// owner of it.
        ALREADY_OWNER = 4,
    }
}

raw_enum! {
    /// The reply to a `ReleaseName` call.
    #[repr(u32)]
    pub enum ReleaseNameReply {
        /// The caller has released their claim on the name.
        RELEASED = 1,
        /// The given name does not exist on this bus.
        NON_EXISTENT = 2,
        /// The caller was not the primary owner of this name, and was also not
        /// waiting in the queue to own this name.
        NOT_OWNER = 3,
    }
}

fn method_call(member: &str) -> Result<Message> {
    Message::new_method_call(DESTINATION, PATH, INTERFACE, member)
}

/// Build the `Hello` call which registers a connection with the bus.
pub fn hello() -> Result<Message> {
    method_call("Hello")
}

/// Build a `RequestName(su)` call.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::org_freedesktop_dbus::{self, NameFlag};
///
/// let m = org_freedesktop_dbus::request_name("org.test.Demo", NameFlag::DO_NOT_QUEUE)?;
/// assert_eq!(m.signature(), "su");
/// assert_eq!(m.member(), Some("RequestName"));
/// # Ok::<_, tokio_dbus_engine::Error>(())
/// ```
pub fn request_name(name: &str, flags: NameFlag) -> Result<Message> {
    let mut m = method_call("RequestName")?;
    m.append_argument(name)?;
    m.append_argument(flags.bits())?;
    Ok(m)
}

/// Build a `ReleaseName(s)` call.
pub fn release_name(name: &str) -> Result<Message> {
    let mut m = method_call("ReleaseName")?;
    m.append_argument(name)?;
    Ok(m)
}

/// Build a `NameHasOwner(s)` call.
pub fn name_has_owner(name: &str) -> Result<Message> {
    let mut m = method_call("NameHasOwner")?;
    m.append_argument(name)?;
    Ok(m)
}

/// Build an `AddMatch(s)` call.
pub fn add_match(rule: &MatchRule) -> Result<Message> {
    let mut m = method_call("AddMatch")?;
    m.append_argument(rule.to_string())?;
    Ok(m)
}

/// Build a `RemoveMatch(s)` call.
pub fn remove_match(rule: &MatchRule) -> Result<Message> {
    let mut m = method_call("RemoveMatch")?;
    m.append_argument(rule.to_string())?;
    Ok(m)
}
