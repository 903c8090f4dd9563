use std::str;

use crate::frame::Frame;
use crate::proto::Endianness;
use crate::Signature;

use super::{padding_to, UnmarshalError};

/// A read cursor over a byte slice.
///
/// Alignment is relative to the start of the slice, and no read ever goes
/// past its end.
pub(crate) struct ReadBuf<'a> {
    data: &'a [u8],
    pos: usize,
    endianness: Endianness,
}

impl<'a> ReadBuf<'a> {
    #[inline]
    pub(crate) fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Self {
            data,
            pos: 0,
            endianness,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Skip alignment padding, which must be zeroed.
    pub(crate) fn align(&mut self, align: usize) -> Result<(), UnmarshalError> {
        let padding = padding_to(align, self.pos);
        let bytes = self.load_slice(padding)?;

        if bytes.iter().any(|&b| b != 0) {
            return Err(UnmarshalError::NonZeroPadding);
        }

        Ok(())
    }

    /// Load an aligned frame.
    pub(crate) fn load<T>(&mut self) -> Result<T, UnmarshalError>
    where
        T: Frame,
    {
        self.align(T::SIZE)?;
        let bytes = self.load_slice(T::SIZE)?;
        T::load(bytes, self.endianness).ok_or(UnmarshalError::Truncated)
    }

    /// Load `len` raw bytes.
    pub(crate) fn load_slice(&mut self, len: usize) -> Result<&'a [u8], UnmarshalError> {
        if len > self.remaining() {
            return Err(UnmarshalError::Truncated);
        }

        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Load `len` bytes followed by a NUL terminator.
    fn load_slice_nul(&mut self, len: usize) -> Result<&'a [u8], UnmarshalError> {
        let bytes = self.load_slice(len)?;

        if self.load_slice(1)? != [0] {
            return Err(UnmarshalError::NotNullTerminated);
        }

        if bytes.contains(&0) {
            return Err(UnmarshalError::EmbeddedNul);
        }

        Ok(bytes)
    }

    /// Read a length-prefixed and NUL-terminated string.
    pub(crate) fn read_str(&mut self) -> Result<&'a str, UnmarshalError> {
        let len = self.load::<u32>()? as usize;
        let bytes = self.load_slice_nul(len)?;
        Ok(str::from_utf8(bytes)?)
    }

    /// Read a signature with its single byte length prefix.
    pub(crate) fn read_signature(&mut self) -> Result<&'a Signature, UnmarshalError> {
        let len = self.load::<u8>()? as usize;
        let bytes = self.load_slice_nul(len)?;
        Ok(Signature::new(bytes)?)
    }
}
