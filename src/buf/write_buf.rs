use crate::frame::Frame;
use crate::proto::Endianness;
use crate::Signature;

use super::{padding_to, MarshalError, MAX_ARRAY_LENGTH};

/// Position of an array under construction, as returned by
/// [`WriteBuf::begin_array`].
#[must_use = "an array must be completed with WriteBuf::finish_array"]
pub(crate) struct ArrayStart {
    length_at: usize,
    start: usize,
}

/// A growable buffer which writes values at their wire alignment.
///
/// Alignment is relative to the start of the buffer.
pub(crate) struct WriteBuf {
    data: Vec<u8>,
    endianness: Endianness,
}

impl WriteBuf {
    pub(crate) fn new(endianness: Endianness) -> Self {
        Self {
            data: Vec::new(),
            endianness,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Pad with zeros up to the given alignment.
    #[inline]
    pub(crate) fn align(&mut self, align: usize) {
        let padding = padding_to(align, self.data.len());
        self.data.resize(self.data.len() + padding, 0);
    }

    /// Store an aligned frame.
    #[inline]
    pub(crate) fn store<T>(&mut self, value: T)
    where
        T: Frame,
    {
        self.align(T::SIZE);
        value.store(self.endianness, &mut self.data);
    }

    /// Overwrite a previously stored frame at `at`.
    #[inline]
    pub(crate) fn store_at<T>(&mut self, at: usize, value: T)
    where
        T: Frame,
    {
        value.store_at(self.endianness, &mut self.data[at..at + T::SIZE]);
    }

    #[inline]
    pub(crate) fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write a length-prefixed and NUL-terminated string.
    pub(crate) fn write_str(&mut self, string: &str) -> Result<(), MarshalError> {
        if string.as_bytes().contains(&0) {
            return Err(MarshalError::EmbeddedNul);
        }

        let len = u32::try_from(string.len())
            .map_err(|_| MarshalError::MessageTooLong(string.len()))?;

        self.store(len);
        self.data.extend_from_slice(string.as_bytes());
        self.data.push(0);
        Ok(())
    }

    /// Write a signature, which has a single byte length prefix.
    pub(crate) fn write_signature(&mut self, signature: &Signature) {
        // NB: Validated signatures are at most 255 bytes long.
        self.data.push(signature.len() as u8);
        self.data.extend_from_slice(signature.as_bytes());
        self.data.push(0);
    }

    /// Start an array whose elements have the given alignment.
    ///
    /// The padding to the first element is emitted even if the array ends up
    /// empty, and is not part of the array length.
    pub(crate) fn begin_array(&mut self, element_align: usize) -> ArrayStart {
        self.store(0u32);
        let length_at = self.data.len() - 4;
        self.align(element_align);

        ArrayStart {
            length_at,
            start: self.data.len(),
        }
    }

    /// Patch the length of an array started with [`WriteBuf::begin_array`].
    pub(crate) fn finish_array(&mut self, array: ArrayStart) -> Result<(), MarshalError> {
        let length = self.data.len() - array.start;

        if length > MAX_ARRAY_LENGTH {
            return Err(MarshalError::ArrayTooLong(length));
        }

        self.store_at(array.length_at, length as u32);
        Ok(())
    }
}
