use std::error;
use std::fmt;
use std::io;

use crate::{DaemonError, Error};

use super::BusKind;

/// Failure to establish a connection to a bus.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectError {
    /// No address is configured for the bus.
    MissingBus(BusKind),
    /// The address does not follow the address grammar.
    MalformedAddress(Box<str>),
    /// The address names a transport which is not supported.
    UnsupportedTransport(Box<str>),
    /// None of the addresses could be connected to.
    Unreachable(io::Error),
    /// The server rejected authentication.
    AuthRejected(Box<str>),
    /// The server sent something other than a SASL response.
    InvalidSaslResponse,
    /// The user id needed for `EXTERNAL` authentication is unavailable.
    UnsupportedAuthUid,
    /// The bus answered `Hello` with an error.
    Registration(DaemonError),
    /// The connection failed during the handshake.
    Handshake(Box<Error>),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::MissingBus(bus) => write!(f, "No address configured for the {bus} bus"),
            ConnectError::MalformedAddress(address) => {
                write!(f, "Malformed bus address `{address}`")
            }
            ConnectError::UnsupportedTransport(transport) => {
                write!(f, "Unsupported transport `{transport}`")
            }
            ConnectError::Unreachable(..) => write!(f, "Bus is unreachable"),
            ConnectError::AuthRejected(mechanisms) => {
                write!(f, "Authentication rejected, server supports `{mechanisms}`")
            }
            ConnectError::InvalidSaslResponse => write!(f, "Invalid SASL response"),
            ConnectError::UnsupportedAuthUid => {
                write!(f, "User id is not available for EXTERNAL authentication")
            }
            ConnectError::Registration(error) => write!(f, "Hello failed: {error}"),
            ConnectError::Handshake(..) => write!(f, "Connection failed during handshake"),
        }
    }
}

impl error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ConnectError::Unreachable(error) => Some(error),
            ConnectError::Registration(error) => Some(error),
            ConnectError::Handshake(error) => Some(&**error),
            _ => None,
        }
    }
}
