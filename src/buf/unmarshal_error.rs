use std::error;
use std::fmt;
use std::str::Utf8Error;

use crate::{ObjectPathError, SignatureError};

/// An error raised while decoding the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnmarshalError {
    /// The input ended before the value it declares.
    Truncated,
    /// Alignment padding contains a non-zero byte.
    NonZeroPadding,
    /// A boolean was neither 0 nor 1.
    InvalidBoolean(u32),
    /// A string or signature lacks its NUL terminator.
    NotNullTerminated,
    /// A string contains a NUL byte before its terminator.
    EmbeddedNul,
    /// A string is not valid UTF-8.
    InvalidUtf8(Utf8Error),
    /// An object path failed validation.
    InvalidObjectPath(ObjectPathError),
    /// A signature failed validation, or a variant signature is not a single
    /// complete type.
    InvalidSignature(SignatureError),
    /// An array declares a length above 67108864 bytes.
    ArrayTooLong(u32),
    /// An array length does not end on an element boundary.
    ArrayLengthMismatch,
    /// Containers, variants included, are nested deeper than 64 levels.
    ExceededMaximumDepth,
    /// The endianness byte is neither `l` nor `B`.
    InvalidEndianness(u8),
    /// The protocol version is not 1.
    UnsupportedVersion(u8),
    /// The message type is `INVALID` or unknown.
    InvalidMessageType(u8),
    /// The message declares a length above 134217728 bytes.
    MessageTooLong(usize),
    /// The message serial is zero.
    ZeroSerial,
    /// A header required by the message type is missing.
    MissingHeader(&'static str),
    /// A header field holds a value of the wrong type or an invalid name.
    InvalidHeader(&'static str),
    /// Bytes were left over after the message body.
    TrailingBytes(usize),
}

impl fmt::Display for UnmarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmarshalError::Truncated => write!(f, "Input is truncated"),
            UnmarshalError::NonZeroPadding => write!(f, "Non-zero alignment padding"),
            UnmarshalError::InvalidBoolean(value) => {
                write!(f, "Invalid boolean value {value}")
            }
            UnmarshalError::NotNullTerminated => write!(f, "String is not null terminated"),
            UnmarshalError::EmbeddedNul => write!(f, "String contains a NUL byte"),
            UnmarshalError::InvalidUtf8(..) => write!(f, "String is not valid UTF-8"),
            UnmarshalError::InvalidObjectPath(..) => write!(f, "Invalid object path"),
            UnmarshalError::InvalidSignature(..) => write!(f, "Invalid signature"),
            UnmarshalError::ArrayTooLong(length) => {
                write!(f, "Array of length {length} is too long (max is 67108864)")
            }
            UnmarshalError::ArrayLengthMismatch => {
                write!(f, "Array length does not match its elements")
            }
            UnmarshalError::ExceededMaximumDepth => {
                write!(f, "Exceeded maximum container depth")
            }
            UnmarshalError::InvalidEndianness(b) => write!(f, "Invalid endianness {b:#04x}"),
            UnmarshalError::UnsupportedVersion(version) => {
                write!(f, "Unsupported protocol version {version}")
            }
            UnmarshalError::InvalidMessageType(n) => write!(f, "Invalid message type {n}"),
            UnmarshalError::MessageTooLong(length) => {
                write!(
                    f,
                    "Message of length {length} is too long (max is 134217728)"
                )
            }
            UnmarshalError::ZeroSerial => write!(f, "Zero in header serial"),
            UnmarshalError::MissingHeader(name) => {
                write!(f, "Missing required {name} header")
            }
            UnmarshalError::InvalidHeader(name) => write!(f, "Invalid {name} header"),
            UnmarshalError::TrailingBytes(n) => {
                write!(f, "{n} trailing bytes after message body")
            }
        }
    }
}

impl error::Error for UnmarshalError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            UnmarshalError::InvalidUtf8(error) => Some(error),
            UnmarshalError::InvalidObjectPath(error) => Some(error),
            UnmarshalError::InvalidSignature(error) => Some(error),
            _ => None,
        }
    }
}

impl From<SignatureError> for UnmarshalError {
    #[inline]
    fn from(error: SignatureError) -> Self {
        UnmarshalError::InvalidSignature(error)
    }
}

impl From<ObjectPathError> for UnmarshalError {
    #[inline]
    fn from(error: ObjectPathError) -> Self {
        UnmarshalError::InvalidObjectPath(error)
    }
}

impl From<Utf8Error> for UnmarshalError {
    #[inline]
    fn from(error: Utf8Error) -> Self {
        UnmarshalError::InvalidUtf8(error)
    }
}
