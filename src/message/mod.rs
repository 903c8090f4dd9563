//! The message model and its framing on the wire.

#[cfg(test)]
mod tests;

pub use self::message::Message;
mod message;

pub use self::message_kind::MessageKind;
mod message_kind;

pub use self::serial::{Serial, SerialAllocator};
mod serial;

pub use self::codec::frame_length;
mod codec;
