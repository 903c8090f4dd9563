use std::io::{self, Write};

use crate::SendError;

/// Outbound bytes waiting to be written to the transport.
#[derive(Default)]
pub(crate) struct SendBuf {
    buf: Vec<u8>,
    written: usize,
}

impl SendBuf {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Test if there is nothing left to write.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.written == self.buf.len()
    }

    /// The number of bytes left to write.
    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }

    /// Queue bytes for writing.
    ///
    /// Either all of `bytes` are queued or none are.
    pub(crate) fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        if self.is_empty() {
            self.clear();
        }

        self.buf
            .try_reserve(bytes.len())
            .map_err(|_| SendError::OutOfMemory)?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write as much as possible to `out`.
    ///
    /// Bytes which have been written are never written again, so this can be
    /// retried after it reports would-block.
    pub(crate) fn send_to<W>(&mut self, out: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        while !self.is_empty() {
            let n = out.write(&self.buf[self.written..])?;

            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero));
            }

            self.written += n;
        }

        self.clear();
        Ok(())
    }

    /// Discard everything queued.
    pub(crate) fn clear(&mut self) {
        self.buf.clear();
        self.written = 0;
    }
}
