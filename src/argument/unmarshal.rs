use crate::buf::{ReadBuf, UnmarshalError, MAX_ARRAY_LENGTH};
use crate::proto::Type;
use crate::signature::{Element, SignatureErrorKind};
use crate::{OwnedObjectPath, Signature, SignatureError};

use super::{Argument, Array, MAX_DEPTH};

/// Decode a single argument of the given complete type.
pub(super) fn unmarshal(
    buf: &mut ReadBuf<'_>,
    element: Element<'_>,
    depth: usize,
) -> Result<Argument, UnmarshalError> {
    let argument = match element {
        Element::Code(t) => match t {
            Type::BYTE => Argument::Byte(buf.load()?),
            Type::BOOLEAN => match buf.load::<u32>()? {
                0 => Argument::Boolean(false),
                1 => Argument::Boolean(true),
                n => return Err(UnmarshalError::InvalidBoolean(n)),
            },
            Type::INT16 => Argument::Int16(buf.load()?),
            Type::UINT16 => Argument::Uint16(buf.load()?),
            Type::INT32 => Argument::Int32(buf.load()?),
            Type::UINT32 => Argument::Uint32(buf.load()?),
            Type::INT64 => Argument::Int64(buf.load()?),
            Type::UINT64 => Argument::Uint64(buf.load()?),
            Type::DOUBLE => Argument::Double(buf.load()?),
            Type::UNIX_FD => Argument::UnixFd(buf.load()?),
            Type::STRING => Argument::String(buf.read_str()?.to_owned()),
            Type::OBJECT_PATH => Argument::ObjectPath(OwnedObjectPath::new(buf.read_str()?)?),
            Type::SIGNATURE => Argument::Signature(buf.read_signature()?.to_owned()),
            Type::VARIANT => {
                let depth = enter(depth)?;
                let signature = buf.read_signature()?;
                signature.require_single()?;
                Argument::Variant(Box::new(unmarshal(buf, first(signature)?, depth)?))
            }
            t => {
                return Err(UnmarshalError::InvalidSignature(SignatureError::new(
                    SignatureErrorKind::UnknownTypeCode(t),
                )));
            }
        },
        Element::Array(element) => {
            let depth = enter(depth)?;
            let length = buf.load::<u32>()?;

            if length as usize > MAX_ARRAY_LENGTH {
                return Err(UnmarshalError::ArrayTooLong(length));
            }

            buf.align(element.alignment())?;

            if length as usize > buf.remaining() {
                return Err(UnmarshalError::Truncated);
            }

            let end = buf.pos() + length as usize;
            let mut items = Vec::new();

            while buf.pos() < end {
                items.push(unmarshal(buf, first(element)?, depth)?);
            }

            if buf.pos() != end {
                return Err(UnmarshalError::ArrayLengthMismatch);
            }

            Argument::Array(Array::from_parts(element, items))
        }
        Element::Struct(fields) => {
            let depth = enter(depth)?;
            buf.align(8)?;

            let mut values = Vec::new();

            for field in fields.iter() {
                values.push(unmarshal(buf, field, depth)?);
            }

            Argument::Struct(values)
        }
        Element::Dict(key, value) => {
            let depth = enter(depth)?;
            buf.align(8)?;
            let key = unmarshal(buf, first(key)?, depth)?;
            let value = unmarshal(buf, first(value)?, depth)?;
            Argument::DictEntry(Box::new(key), Box::new(value))
        }
    };

    Ok(argument)
}

fn first(signature: &Signature) -> Result<Element<'_>, UnmarshalError> {
    signature.iter().next().ok_or_else(|| {
        UnmarshalError::InvalidSignature(SignatureError::new(
            SignatureErrorKind::NotSingleCompleteType,
        ))
    })
}

#[inline]
fn enter(depth: usize) -> Result<usize, UnmarshalError> {
    if depth >= MAX_DEPTH {
        return Err(UnmarshalError::ExceededMaximumDepth);
    }

    Ok(depth + 1)
}
