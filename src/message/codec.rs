use crate::argument::{self, Argument};
use crate::buf::{
    padding_to, MarshalError, ReadBuf, UnmarshalError, WriteBuf, MAX_ARRAY_LENGTH,
    MAX_MESSAGE_LENGTH,
};
use crate::frame::Frame;
use crate::names;
use crate::proto::{Endianness, Flags, HeaderField, MessageType, FIXED_HEADER_LENGTH, VERSION};
use crate::{OwnedObjectPath, OwnedSignature, Serial, Signature};

use super::{Message, MessageKind};

/// Compute the total length of the message which starts at the front of
/// `bytes`.
///
/// Only the 16 bytes of the fixed header are inspected. Returns `None` if
/// fewer bytes than that are available.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::message::frame_length;
///
/// assert_eq!(frame_length(b"l\x02\x00\x01")?, None);
///
/// // 4 body bytes, 15 bytes of header fields padded to 16.
/// let header = b"l\x02\x02\x01\x04\x00\x00\x00\x78\x56\x34\x12\x0f\x00\x00\x00";
/// assert_eq!(frame_length(header)?, Some(36));
/// # Ok::<_, tokio_dbus_engine::UnmarshalError>(())
/// ```
pub fn frame_length(bytes: &[u8]) -> Result<Option<usize>, UnmarshalError> {
    let Some(header) = bytes.get(..FIXED_HEADER_LENGTH) else {
        return Ok(None);
    };

    let endianness = endianness(header[0])?;
    let body_length = load::<u32>(&header[4..], endianness)? as usize;
    let fields_length = load::<u32>(&header[12..], endianness)? as usize;

    if fields_length > MAX_ARRAY_LENGTH {
        return Err(UnmarshalError::ArrayTooLong(fields_length as u32));
    }

    let header_length = FIXED_HEADER_LENGTH + fields_length;
    let total = header_length + padding_to(8, header_length) + body_length;

    if total > MAX_MESSAGE_LENGTH {
        return Err(UnmarshalError::MessageTooLong(total));
    }

    Ok(Some(total))
}

fn endianness(b: u8) -> Result<Endianness, UnmarshalError> {
    match Endianness::new(b) {
        e @ (Endianness::LITTLE | Endianness::BIG) => Ok(e),
        _ => Err(UnmarshalError::InvalidEndianness(b)),
    }
}

fn load<T>(bytes: &[u8], endianness: Endianness) -> Result<T, UnmarshalError>
where
    T: Frame,
{
    T::load(bytes, endianness).ok_or(UnmarshalError::Truncated)
}

impl Message {
    /// Encode the message in native byte order.
    ///
    /// The message must have been sealed with a serial.
    #[inline]
    pub fn encode(&self) -> Result<Vec<u8>, MarshalError> {
        self.encode_with(Endianness::NATIVE)
    }

    /// Encode the message in the given byte order.
    pub fn encode_with(&self, endianness: Endianness) -> Result<Vec<u8>, MarshalError> {
        let serial = self.serial.ok_or(MarshalError::ZeroSerial)?;
        self.encode_as(serial, endianness)
    }

    /// Encode the message as if it had been sealed with `serial`.
    pub(crate) fn encode_as(
        &self,
        serial: Serial,
        endianness: Endianness,
    ) -> Result<Vec<u8>, MarshalError> {
        let body = argument::encode(&self.arguments, endianness)?;

        if body.len() > MAX_MESSAGE_LENGTH {
            return Err(MarshalError::MessageTooLong(body.len()));
        }

        let mut buf = WriteBuf::new(endianness);
        buf.store(endianness.get());
        buf.store(self.message_type().get());
        buf.store(self.flags.bits());
        buf.store(VERSION);
        buf.store(body.len() as u32);
        buf.store(serial.get());

        let fields = buf.begin_array(8);

        match &self.kind {
            MessageKind::MethodCall { path, member } | MessageKind::Signal { path, member } => {
                field(&mut buf, HeaderField::PATH, Signature::OBJECT_PATH);
                buf.write_str(path.as_str())?;
                self.write_interface(&mut buf)?;
                field(&mut buf, HeaderField::MEMBER, Signature::STRING);
                buf.write_str(member)?;
            }
            MessageKind::MethodReturn { reply_serial } => {
                self.write_interface(&mut buf)?;
                field(&mut buf, HeaderField::REPLY_SERIAL, Signature::UINT32);
                buf.store(reply_serial.get());
            }
            MessageKind::Error {
                error_name,
                reply_serial,
            } => {
                self.write_interface(&mut buf)?;
                field(&mut buf, HeaderField::ERROR_NAME, Signature::STRING);
                buf.write_str(error_name)?;
                field(&mut buf, HeaderField::REPLY_SERIAL, Signature::UINT32);
                buf.store(reply_serial.get());
            }
        }

        if let Some(destination) = &self.destination {
            field(&mut buf, HeaderField::DESTINATION, Signature::STRING);
            buf.write_str(destination)?;
        }

        if let Some(sender) = &self.sender {
            field(&mut buf, HeaderField::SENDER, Signature::STRING);
            buf.write_str(sender)?;
        }

        if !self.signature.is_empty() {
            field(&mut buf, HeaderField::SIGNATURE, Signature::SIGNATURE);
            buf.write_signature(&self.signature);
        }

        if let Some(unix_fds) = self.unix_fds {
            field(&mut buf, HeaderField::UNIX_FDS, Signature::UINT32);
            buf.store(unix_fds);
        }

        buf.finish_array(fields)?;
        buf.align(8);

        let total = buf.len() + body.len();

        if total > MAX_MESSAGE_LENGTH {
            return Err(MarshalError::MessageTooLong(total));
        }

        buf.extend_from_slice(&body);
        Ok(buf.into_inner())
    }

    fn write_interface(&self, buf: &mut WriteBuf) -> Result<(), MarshalError> {
        if let Some(interface) = &self.interface {
            field(buf, HeaderField::INTERFACE, Signature::STRING);
            buf.write_str(interface)?;
        }

        Ok(())
    }

    /// Decode exactly one message.
    ///
    /// The decoded message is sealed.
    pub fn decode(bytes: &[u8]) -> Result<Message, UnmarshalError> {
        let Some(&first) = bytes.first() else {
            return Err(UnmarshalError::Truncated);
        };

        let endianness = endianness(first)?;
        let mut buf = ReadBuf::new(bytes, endianness);

        buf.load::<u8>()?;
        let message_type = MessageType::new(buf.load::<u8>()?);
        let flags = Flags::from_bits(buf.load::<u8>()?);
        let version = buf.load::<u8>()?;

        if version != VERSION {
            return Err(UnmarshalError::UnsupportedVersion(version));
        }

        let body_length = buf.load::<u32>()? as usize;
        let serial = Serial::new(buf.load::<u32>()?).ok_or(UnmarshalError::ZeroSerial)?;

        let fields_length = buf.load::<u32>()?;

        if fields_length as usize > MAX_ARRAY_LENGTH {
            return Err(UnmarshalError::ArrayTooLong(fields_length));
        }

        buf.align(8)?;

        if fields_length as usize > buf.remaining() {
            return Err(UnmarshalError::Truncated);
        }

        let end = buf.pos() + fields_length as usize;
        let mut headers = Headers::default();

        while buf.pos() < end {
            buf.align(8)?;
            let code = HeaderField::new(buf.load::<u8>()?);
            let signature = buf.read_signature()?;
            signature.require_single()?;

            let mut values = argument::decode_from(&mut buf, signature)?;
            let value = values.pop().ok_or(UnmarshalError::Truncated)?;
            headers.insert(code, value)?;
        }

        if buf.pos() != end {
            return Err(UnmarshalError::ArrayLengthMismatch);
        }

        buf.align(8)?;

        let total = buf.pos() + body_length;

        if total > MAX_MESSAGE_LENGTH {
            return Err(UnmarshalError::MessageTooLong(total));
        }

        if total > buf.len() {
            return Err(UnmarshalError::Truncated);
        }

        if total < buf.len() {
            return Err(UnmarshalError::TrailingBytes(buf.len() - total));
        }

        let signature = headers.signature.unwrap_or_default();
        let body = buf.load_slice(body_length)?;
        let arguments = argument::decode(body, &signature, endianness)?;

        let kind = match message_type {
            MessageType::METHOD_CALL => MessageKind::MethodCall {
                path: headers.path.ok_or(UnmarshalError::MissingHeader("PATH"))?,
                member: headers
                    .member
                    .ok_or(UnmarshalError::MissingHeader("MEMBER"))?,
            },
            MessageType::METHOD_RETURN => MessageKind::MethodReturn {
                reply_serial: headers
                    .reply_serial
                    .ok_or(UnmarshalError::MissingHeader("REPLY_SERIAL"))?,
            },
            MessageType::ERROR => MessageKind::Error {
                error_name: headers
                    .error_name
                    .ok_or(UnmarshalError::MissingHeader("ERROR_NAME"))?,
                reply_serial: headers
                    .reply_serial
                    .ok_or(UnmarshalError::MissingHeader("REPLY_SERIAL"))?,
            },
            MessageType::SIGNAL => MessageKind::Signal {
                path: headers.path.ok_or(UnmarshalError::MissingHeader("PATH"))?,
                member: headers
                    .member
                    .ok_or(UnmarshalError::MissingHeader("MEMBER"))?,
            },
            other => return Err(UnmarshalError::InvalidMessageType(other.get())),
        };

        if matches!(kind, MessageKind::Signal { .. }) && headers.interface.is_none() {
            return Err(UnmarshalError::MissingHeader("INTERFACE"));
        }

        Ok(Message {
            kind,
            serial: Some(serial),
            flags,
            interface: headers.interface,
            destination: headers.destination,
            sender: headers.sender,
            signature,
            arguments,
            unix_fds: headers.unix_fds,
            sealed: true,
        })
    }
}

/// Write the code and the variant signature of a header field.
fn field(buf: &mut WriteBuf, code: HeaderField, signature: &Signature) {
    buf.align(8);
    buf.store(code.get());
    buf.write_signature(signature);
}

/// Header fields collected while decoding.
#[derive(Default)]
struct Headers {
    path: Option<OwnedObjectPath>,
    interface: Option<Box<str>>,
    member: Option<Box<str>>,
    error_name: Option<Box<str>>,
    reply_serial: Option<Serial>,
    destination: Option<Box<str>>,
    sender: Option<Box<str>>,
    signature: Option<OwnedSignature>,
    unix_fds: Option<u32>,
}

impl Headers {
    fn insert(&mut self, code: HeaderField, value: Argument) -> Result<(), UnmarshalError> {
        match (code, value) {
            (HeaderField::PATH, Argument::ObjectPath(path)) => {
                self.path = Some(path);
            }
            (HeaderField::INTERFACE, Argument::String(name)) => {
                names::validate_interface(&name)
                    .map_err(|_| UnmarshalError::InvalidHeader("INTERFACE"))?;
                self.interface = Some(name.into());
            }
            (HeaderField::MEMBER, Argument::String(name)) => {
                names::validate_member(&name)
                    .map_err(|_| UnmarshalError::InvalidHeader("MEMBER"))?;
                self.member = Some(name.into());
            }
            (HeaderField::ERROR_NAME, Argument::String(name)) => {
                names::validate_error_name(&name)
                    .map_err(|_| UnmarshalError::InvalidHeader("ERROR_NAME"))?;
                self.error_name = Some(name.into());
            }
            (HeaderField::REPLY_SERIAL, Argument::Uint32(serial)) => {
                self.reply_serial =
                    Some(Serial::new(serial).ok_or(UnmarshalError::InvalidHeader("REPLY_SERIAL"))?);
            }
            (HeaderField::DESTINATION, Argument::String(name)) => {
                names::validate_bus_name(&name)
                    .map_err(|_| UnmarshalError::InvalidHeader("DESTINATION"))?;
                self.destination = Some(name.into());
            }
            (HeaderField::SENDER, Argument::String(name)) => {
                names::validate_bus_name(&name)
                    .map_err(|_| UnmarshalError::InvalidHeader("SENDER"))?;
                self.sender = Some(name.into());
            }
            (HeaderField::SIGNATURE, Argument::Signature(signature)) => {
                self.signature = Some(signature);
            }
            (HeaderField::UNIX_FDS, Argument::Uint32(n)) => {
                self.unix_fds = Some(n);
            }
            (code, _) if code.is_known() => {
                return Err(UnmarshalError::InvalidHeader(header_name(code)));
            }
            // Unknown header fields must be ignored.
            _ => {}
        }

        Ok(())
    }
}

fn header_name(code: HeaderField) -> &'static str {
    match code {
        HeaderField::PATH => "PATH",
        HeaderField::INTERFACE => "INTERFACE",
        HeaderField::MEMBER => "MEMBER",
        HeaderField::ERROR_NAME => "ERROR_NAME",
        HeaderField::REPLY_SERIAL => "REPLY_SERIAL",
        HeaderField::DESTINATION => "DESTINATION",
        HeaderField::SENDER => "SENDER",
        HeaderField::SIGNATURE => "SIGNATURE",
        _ => "UNIX_FDS",
    }
}
