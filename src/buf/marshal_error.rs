use std::error;
use std::fmt;

use crate::{ObjectPathError, SignatureError};

/// An error raised while encoding values into the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MarshalError {
    /// A string contains a NUL byte.
    EmbeddedNul,
    /// An object path failed validation.
    InvalidObjectPath(ObjectPathError),
    /// A signature failed validation, or a message signature would become
    /// invalid.
    InvalidSignature(SignatureError),
    /// An array element does not have the element type of the array.
    HeterogeneousArray {
        /// The element signature of the array.
        expected: String,
        /// The signature of the rejected element.
        actual: String,
    },
    /// An encoded array body exceeds 67108864 bytes.
    ArrayTooLong(usize),
    /// An encoded message exceeds 134217728 bytes.
    MessageTooLong(usize),
    /// The message has not been assigned a serial.
    ZeroSerial,
    /// Containers are nested deeper than 64 levels.
    ExceededMaximumDepth,
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalError::EmbeddedNul => write!(f, "String contains a NUL byte"),
            MarshalError::InvalidObjectPath(..) => write!(f, "Invalid object path"),
            MarshalError::InvalidSignature(..) => write!(f, "Invalid signature"),
            MarshalError::HeterogeneousArray { expected, actual } => {
                write!(
                    f,
                    "Array of `{expected}` cannot hold an element of type `{actual}`"
                )
            }
            MarshalError::ArrayTooLong(length) => {
                write!(f, "Array of length {length} is too long (max is 67108864)")
            }
            MarshalError::MessageTooLong(length) => {
                write!(
                    f,
                    "Message of length {length} is too long (max is 134217728)"
                )
            }
            MarshalError::ZeroSerial => write!(f, "Message has no serial"),
            MarshalError::ExceededMaximumDepth => {
                write!(f, "Exceeded maximum container depth")
            }
        }
    }
}

impl error::Error for MarshalError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MarshalError::InvalidObjectPath(error) => Some(error),
            MarshalError::InvalidSignature(error) => Some(error),
            _ => None,
        }
    }
}

impl From<SignatureError> for MarshalError {
    #[inline]
    fn from(error: SignatureError) -> Self {
        MarshalError::InvalidSignature(error)
    }
}

impl From<ObjectPathError> for MarshalError {
    #[inline]
    fn from(error: ObjectPathError) -> Self {
        MarshalError::InvalidObjectPath(error)
    }
}
