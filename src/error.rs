use std::error;
use std::fmt;
use std::io;

use crate::connection::ConnectError;
use crate::names::InvalidName;
use crate::{MarshalError, Message, OwnedSignature, Serial, UnmarshalError};

/// Result alias using an [`Error`] as the error type by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised by this crate.
///
/// The error is opaque; use the accessors to inspect which kind of failure it
/// describes.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Self { kind }
    }

    /// Test if the error indicates that the operation would block.
    #[cfg(feature = "tokio")]
    #[inline]
    pub(crate) fn would_block(&self) -> bool {
        matches!(self.kind, ErrorKind::WouldBlock)
    }

    #[cfg(feature = "tokio")]
    #[inline]
    pub(crate) fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Test if the error indicates that the remote side hung up.
    #[cfg(feature = "tokio")]
    pub(crate) fn is_hang_up(&self) -> bool {
        match &self.kind {
            ErrorKind::Io(error) => matches!(
                error.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }

    /// Convert into the error reported when establishing a connection fails.
    #[cfg(feature = "tokio")]
    pub(crate) fn into_connect_error(self) -> ConnectError {
        match self.kind {
            ErrorKind::Connect(error) => error,
            kind => ConnectError::Handshake(Box::new(Error::new(kind))),
        }
    }

    /// The connection error, if connecting to the bus failed.
    pub fn connect_error(&self) -> Option<&ConnectError> {
        match &self.kind {
            ErrorKind::Connect(error) => Some(error),
            _ => None,
        }
    }

    /// The encoding error, if a value could not be encoded.
    pub fn marshal_error(&self) -> Option<&MarshalError> {
        match &self.kind {
            ErrorKind::Marshal(error) => Some(error),
            _ => None,
        }
    }

    /// The decoding error, if received bytes could not be decoded.
    pub fn unmarshal_error(&self) -> Option<&UnmarshalError> {
        match &self.kind {
            ErrorKind::Unmarshal(error) => Some(error),
            _ => None,
        }
    }

    /// The send error, if a message could not be queued.
    pub fn send_error(&self) -> Option<SendError> {
        match self.kind {
            ErrorKind::Send(error) => Some(error),
            _ => None,
        }
    }

    /// The rejected name, if a name failed its grammar.
    pub fn invalid_name(&self) -> Option<&InvalidName> {
        match &self.kind {
            ErrorKind::InvalidName(error) => Some(error),
            _ => None,
        }
    }

    /// The error reply, if the remote side answered with an error.
    pub fn daemon_error(&self) -> Option<&DaemonError> {
        match &self.kind {
            ErrorKind::Daemon(error) => Some(error),
            _ => None,
        }
    }

    /// Test if a sealed message was modified or sent again.
    #[inline]
    pub fn is_message_sealed(&self) -> bool {
        matches!(self.kind, ErrorKind::MessageSealed)
    }

    /// Test if waiting for a reply timed out.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout(..))
    }

    /// Test if the connection is closed.
    #[inline]
    pub fn is_not_connected(&self) -> bool {
        matches!(self.kind, ErrorKind::Send(SendError::NotConnected))
    }

    /// Test if memory ran out, either locally or in the bus daemon.
    pub fn is_out_of_memory(&self) -> bool {
        match &self.kind {
            ErrorKind::Send(SendError::OutOfMemory) => true,
            ErrorKind::Daemon(error) => error.name() == DaemonError::NO_MEMORY,
            _ => false,
        }
    }

    /// Test if a reply was built for something other than a method call with
    /// a serial.
    #[inline]
    pub fn is_invalid_reply_target(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidReplyTarget)
    }

    /// Test if the bus answered a call with a reply this crate does not
    /// understand.
    #[inline]
    pub fn is_unexpected_reply(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UnexpectedReply { .. } | ErrorKind::UnknownReplyValue { .. }
        )
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::WouldBlock => Self::new(ErrorKind::WouldBlock),
            io::ErrorKind::OutOfMemory => Self::new(ErrorKind::Send(SendError::OutOfMemory)),
            _ => Self::new(ErrorKind::Io(error)),
        }
    }
}

impl From<ConnectError> for Error {
    #[inline]
    fn from(error: ConnectError) -> Self {
        Self::new(ErrorKind::Connect(error))
    }
}

impl From<MarshalError> for Error {
    #[inline]
    fn from(error: MarshalError) -> Self {
        Self::new(ErrorKind::Marshal(error))
    }
}

impl From<UnmarshalError> for Error {
    #[inline]
    fn from(error: UnmarshalError) -> Self {
        Self::new(ErrorKind::Unmarshal(error))
    }
}

impl From<InvalidName> for Error {
    #[inline]
    fn from(error: InvalidName) -> Self {
        Self::new(ErrorKind::InvalidName(error))
    }
}

impl From<SendError> for Error {
    #[inline]
    fn from(error: SendError) -> Self {
        Self::new(ErrorKind::Send(error))
    }
}

impl From<DaemonError> for Error {
    #[inline]
    fn from(error: DaemonError) -> Self {
        Self::new(ErrorKind::Daemon(error))
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(..) => write!(f, "I/O error"),
            ErrorKind::WouldBlock => write!(f, "Would block"),
            ErrorKind::Connect(error) => error.fmt(f),
            ErrorKind::Marshal(..) => write!(f, "Failed to encode message"),
            ErrorKind::Unmarshal(..) => write!(f, "Failed to decode message"),
            ErrorKind::Send(error) => error.fmt(f),
            ErrorKind::InvalidName(error) => error.fmt(f),
            ErrorKind::MessageSealed => write!(f, "Message is sealed"),
            ErrorKind::Timeout(serial) => {
                write!(f, "Timed out waiting for reply to serial {serial}")
            }
            ErrorKind::Daemon(error) => error.fmt(f),
            ErrorKind::InvalidReplyTarget => {
                write!(f, "Replies can only be built for method calls with a serial")
            }
            ErrorKind::UnexpectedReply { expected, actual } => {
                write!(
                    f,
                    "Expected reply with signature `{expected}` but got `{actual}`"
                )
            }
            ErrorKind::UnknownReplyValue { member, value } => {
                write!(f, "Unknown value {value} in reply to `{member}`")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(error) => Some(error),
            ErrorKind::Connect(error) => error.source(),
            ErrorKind::Marshal(error) => Some(error),
            ErrorKind::Unmarshal(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ErrorKind {
    Io(io::Error),
    WouldBlock,
    Connect(ConnectError),
    Marshal(MarshalError),
    Unmarshal(UnmarshalError),
    Send(SendError),
    InvalidName(InvalidName),
    MessageSealed,
    Timeout(Serial),
    Daemon(DaemonError),
    InvalidReplyTarget,
    UnexpectedReply {
        expected: &'static str,
        actual: OwnedSignature,
    },
    UnknownReplyValue {
        member: &'static str,
        value: u32,
    },
}

/// Failure to hand a message to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SendError {
    /// The connection is closed.
    NotConnected,
    /// The outbound queue could not grow.
    OutOfMemory,
}

impl fmt::Display for SendError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NotConnected => write!(f, "Not connected"),
            SendError::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl error::Error for SendError {}

/// An error reported by the remote side, carried verbatim.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::DaemonError;
///
/// let error = DaemonError::new("org.freedesktop.DBus.Error.ServiceUnknown", "The name is not activatable");
/// assert_eq!(
///     error.to_string(),
///     "org.freedesktop.DBus.Error.ServiceUnknown: The name is not activatable"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonError {
    name: Box<str>,
    message: Box<str>,
}

impl DaemonError {
    /// The error name the bus uses when it runs out of memory.
    pub const NO_MEMORY: &'static str = "org.freedesktop.DBus.Error.NoMemory";

    /// Construct a new daemon error.
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Construct from an error message.
    ///
    /// Returns `None` if the message is not an error.
    pub fn from_message(message: &Message) -> Option<Self> {
        let name = message.error_name()?;
        Some(Self::new(name, message.error_message().unwrap_or_default()))
    }

    /// The error name, such as `org.freedesktop.DBus.Error.Failed`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error text.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DaemonError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl error::Error for DaemonError {}
