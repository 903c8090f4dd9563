//! Typed argument values and their wire encoding.


pub use self::argument::Argument;
mod argument;

pub use self::array::Array;
mod array;

mod marshal;
mod unmarshal;

use crate::buf::{MarshalError, ReadBuf, UnmarshalError, WriteBuf};
use crate::proto::Endianness;
use crate::Signature;

/// The maximum nesting of containers, variants included.
pub(crate) const MAX_DEPTH: usize = 64;

/// Encode a sequence of arguments as a message body.
///
/// Alignment is relative to the start of the returned buffer, which is how a
/// body is laid out after the 8-byte aligned message header.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::argument::{self, Argument};
/// use tokio_dbus_engine::proto::Endianness;
///
/// let bytes = argument::encode(&[Argument::Byte(1), Argument::Uint32(2)], Endianness::LITTLE)?;
/// assert_eq!(bytes, [1, 0, 0, 0, 2, 0, 0, 0]);
/// # Ok::<_, tokio_dbus_engine::MarshalError>(())
/// ```
pub fn encode(arguments: &[Argument], endianness: Endianness) -> Result<Vec<u8>, MarshalError> {
    let mut buf = WriteBuf::new(endianness);

    for argument in arguments {
        encode_into(&mut buf, argument)?;
    }

    Ok(buf.into_inner())
}

/// Encode a single argument into an existing buffer.
fn encode_into(buf: &mut WriteBuf, argument: &Argument) -> Result<(), MarshalError> {
    self::marshal::marshal(buf, argument, 0)
}

/// Decode a message body with the given signature.
///
/// The whole input must be consumed.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::argument::{self, Argument};
/// use tokio_dbus_engine::proto::Endianness;
/// use tokio_dbus_engine::Signature;
///
/// let sig = Signature::new("yu")?;
/// let args = argument::decode(&[1, 0, 0, 0, 2, 0, 0, 0], sig, Endianness::LITTLE)?;
/// assert_eq!(args, [Argument::Byte(1), Argument::Uint32(2)]);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub fn decode(
    bytes: &[u8],
    signature: &Signature,
    endianness: Endianness,
) -> Result<Vec<Argument>, UnmarshalError> {
    let mut buf = ReadBuf::new(bytes, endianness);
    let arguments = decode_from(&mut buf, signature)?;

    if buf.remaining() > 0 {
        return Err(UnmarshalError::TrailingBytes(buf.remaining()));
    }

    Ok(arguments)
}

/// Decode arguments for every complete type in `signature`.
pub(crate) fn decode_from(
    buf: &mut ReadBuf<'_>,
    signature: &Signature,
) -> Result<Vec<Argument>, UnmarshalError> {
    let mut arguments = Vec::new();

    for element in signature.iter() {
        arguments.push(self::unmarshal::unmarshal(buf, element, 0)?);
    }

    Ok(arguments)
}
