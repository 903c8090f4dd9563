use crate::buf::{MarshalError, WriteBuf};
use crate::Signature;

use super::{Argument, MAX_DEPTH};

/// Encode a single argument at the given container depth.
pub(super) fn marshal(
    buf: &mut WriteBuf,
    argument: &Argument,
    depth: usize,
) -> Result<(), MarshalError> {
    match argument {
        Argument::Byte(value) => buf.store(*value),
        Argument::Boolean(value) => buf.store(u32::from(*value)),
        Argument::Int16(value) => buf.store(*value),
        Argument::Uint16(value) => buf.store(*value),
        Argument::Int32(value) => buf.store(*value),
        Argument::Uint32(value) => buf.store(*value),
        Argument::Int64(value) => buf.store(*value),
        Argument::Uint64(value) => buf.store(*value),
        Argument::Double(value) => buf.store(*value),
        Argument::UnixFd(value) => buf.store(*value),
        Argument::String(string) => buf.write_str(string)?,
        Argument::ObjectPath(path) => buf.write_str(path.as_str())?,
        Argument::Signature(signature) => {
            Signature::new(signature.as_bytes())?;
            buf.write_signature(signature);
        }
        Argument::Array(array) => {
            let depth = enter(depth)?;
            let start = buf.begin_array(array.element().alignment());

            for item in array.items() {
                marshal(buf, item, depth)?;
            }

            buf.finish_array(start)?;
        }
        Argument::Struct(fields) => {
            let depth = enter(depth)?;
            buf.align(8);

            for field in fields {
                marshal(buf, field, depth)?;
            }
        }
        Argument::Variant(inner) => {
            let depth = enter(depth)?;
            let signature = inner.signature()?;
            buf.write_signature(&signature);
            marshal(buf, inner, depth)?;
        }
        Argument::DictEntry(key, value) => {
            let depth = enter(depth)?;
            buf.align(8);
            marshal(buf, key, depth)?;
            marshal(buf, value, depth)?;
        }
    }

    Ok(())
}

#[inline]
fn enter(depth: usize) -> Result<usize, MarshalError> {
    if depth >= MAX_DEPTH {
        return Err(MarshalError::ExceededMaximumDepth);
    }

    Ok(depth + 1)
}
