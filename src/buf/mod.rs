//! Aligned buffers used by the wire codec.


pub(crate) use self::write_buf::WriteBuf;
mod write_buf;

pub(crate) use self::read_buf::ReadBuf;
mod read_buf;

pub use self::marshal_error::MarshalError;
mod marshal_error;

pub use self::unmarshal_error::UnmarshalError;
mod unmarshal_error;

/// The maximum length of an array in bytes.
pub(crate) const MAX_ARRAY_LENGTH: usize = 1 << 26;

/// The maximum length of a whole message in bytes.
pub(crate) const MAX_MESSAGE_LENGTH: usize = 1 << 27;

/// Calculate padding with the assumption that alignment is a power of two.
#[inline(always)]
pub(crate) fn padding_to(align: usize, len: usize) -> usize {
    let mask = align - 1;
    (align - (len & mask)) & mask
}
