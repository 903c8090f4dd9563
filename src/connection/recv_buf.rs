use std::collections::VecDeque;
use std::io::{self, Read};

use crate::message::frame_length;
use crate::proto::MessageType;
use crate::{Message, Serial, UnmarshalError};

const READ_CHUNK: usize = 4096;

/// Inbound bytes which have not been decoded yet, and the queue of messages
/// which have.
#[derive(Default)]
pub(crate) struct RecvBuf {
    buf: Vec<u8>,
    queue: VecDeque<Message>,
}

impl RecvBuf {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Read whatever is available from `input`.
    ///
    /// Returns the number of bytes read, where zero indicates end of stream.
    pub(crate) fn recv_from<R>(&mut self, input: &mut R) -> io::Result<usize>
    where
        R: ?Sized + Read,
    {
        let len = self.buf.len();
        self.buf.resize(len + READ_CHUNK, 0);

        match input.read(&mut self.buf[len..]) {
            Ok(n) => {
                self.buf.truncate(len + n);
                Ok(n)
            }
            Err(error) => {
                self.buf.truncate(len);
                Err(error)
            }
        }
    }

    /// Take a complete `\r\n` terminated line, without its terminator.
    pub(crate) fn take_line(&mut self) -> Option<Vec<u8>> {
        let n = self.buf.windows(2).position(|w| w == b"\r\n")?;
        let mut line = self.buf.drain(..n + 2).collect::<Vec<_>>();
        line.truncate(n);
        Some(line)
    }

    /// Decode every complete message in the buffer onto the queue.
    ///
    /// Returns the number of messages decoded.
    pub(crate) fn decode_frames(&mut self) -> Result<usize, UnmarshalError> {
        let mut decoded = 0;

        while let Some(total) = frame_length(&self.buf)? {
            if self.buf.len() < total {
                break;
            }

            let message = Message::decode(&self.buf[..total])?;
            self.buf.drain(..total);

            tracing::trace!(
                serial = ?message.serial(),
                message_type = ?message.message_type(),
                member = message.member(),
                "Received message"
            );

            self.queue.push_back(message);
            decoded += 1;
        }

        Ok(decoded)
    }

    /// Pop the oldest queued message.
    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }

    /// Take the reply to `serial` out of the queue, leaving every other
    /// message in order.
    pub(crate) fn take_reply(&mut self, serial: Serial) -> Option<Message> {
        let index = self.queue.iter().position(|message| {
            matches!(
                message.message_type(),
                MessageType::METHOD_RETURN | MessageType::ERROR
            ) && message.reply_serial() == Some(serial)
        })?;

        self.queue.remove(index)
    }

    /// Discard every buffered byte and queued message.
    pub(crate) fn clear(&mut self) {
        self.buf.clear();
        self.queue.clear();
    }
}
