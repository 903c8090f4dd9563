use crate::argument::Argument;
use crate::error::{ErrorKind, Result};
use crate::names::{self, InvalidName, NameKind};
use crate::proto::{Flags, MessageType};
use crate::{MarshalError, ObjectPath, OwnedObjectPath, OwnedSignature, Serial, Signature};

use super::MessageKind;

/// A D-Bus message.
///
/// A message is built locally, then sealed with a serial when it is sent.
/// Messages decoded from the wire are sealed from the start. Sealed messages
/// can no longer be modified.
///
/// The signature of a message always matches its arguments.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::Message;
///
/// let mut m = Message::new_signal("/org/test/Demo", "org.test.Demo", "Ping")?;
/// m.append_argument("hello")?;
/// m.append_argument(42u32)?;
///
/// assert_eq!(m.signature(), "su");
/// assert_eq!(m.member(), Some("Ping"));
/// # Ok::<_, tokio_dbus_engine::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub(super) kind: MessageKind,
    pub(super) serial: Option<Serial>,
    pub(super) flags: Flags,
    pub(super) interface: Option<Box<str>>,
    pub(super) destination: Option<Box<str>>,
    pub(super) sender: Option<Box<str>>,
    pub(super) signature: OwnedSignature,
    pub(super) arguments: Vec<Argument>,
    pub(super) unix_fds: Option<u32>,
    pub(super) sealed: bool,
}

impl Message {
    fn with_kind(kind: MessageKind) -> Self {
        Self {
            kind,
            serial: None,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: OwnedSignature::empty(),
            arguments: Vec::new(),
            unix_fds: None,
            sealed: false,
        }
    }

    /// Construct a method call.
    ///
    /// Every name is checked against its grammar.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::Message;
    ///
    /// let m = Message::new_method_call(
    ///     "org.freedesktop.DBus",
    ///     "/org/freedesktop/DBus",
    ///     "org.freedesktop.DBus",
    ///     "Hello",
    /// )?;
    ///
    /// assert_eq!(m.destination(), Some("org.freedesktop.DBus"));
    ///
    /// let error = Message::new_method_call("", "/a", "x.y", "Z").unwrap_err();
    /// assert!(error.invalid_name().is_some());
    /// # Ok::<_, tokio_dbus_engine::Error>(())
    /// ```
    pub fn new_method_call(
        destination: &str,
        path: &str,
        interface: &str,
        member: &str,
    ) -> Result<Self> {
        names::validate_bus_name(destination)?;
        let path = object_path(path)?;
        names::validate_interface(interface)?;
        names::validate_member(member)?;

        let mut this = Self::with_kind(MessageKind::MethodCall {
            path,
            member: member.into(),
        });

        this.destination = Some(destination.into());
        this.interface = Some(interface.into());
        Ok(this)
    }

    /// Construct a signal emission.
    pub fn new_signal(path: &str, interface: &str, member: &str) -> Result<Self> {
        let path = object_path(path)?;
        names::validate_interface(interface)?;
        names::validate_member(member)?;

        let mut this = Self::with_kind(MessageKind::Signal {
            path,
            member: member.into(),
        });

        this.interface = Some(interface.into());
        Ok(this)
    }

    /// Construct a method return replying to `original`.
    ///
    /// The original must be a method call which has been assigned a serial.
    /// The reply is addressed to the sender of the original.
    pub fn new_method_return(original: &Message) -> Result<Self> {
        let reply_serial = original.reply_target()?;
        let mut this = Self::with_kind(MessageKind::MethodReturn { reply_serial });
        this.destination = original.sender.clone();
        Ok(this)
    }

    /// Construct an error replying to `original`.
    ///
    /// The error name follows the interface grammar, and the message text
    /// becomes the single string argument of the error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::{Message, Serial};
    ///
    /// let mut call = Message::new_method_call("org.test.Demo", "/", "org.test.Demo", "Frob")?;
    /// call.seal(Serial::new(7).unwrap())?;
    ///
    /// let error = Message::new_error(&call, "org.test.Error.NoFrob", "cannot frob")?;
    /// assert_eq!(error.reply_serial(), Serial::new(7));
    /// assert_eq!(error.error_message(), Some("cannot frob"));
    /// # Ok::<_, tokio_dbus_engine::Error>(())
    /// ```
    pub fn new_error(original: &Message, error_name: &str, error_message: &str) -> Result<Self> {
        let reply_serial = original.reply_target()?;
        names::validate_error_name(error_name)?;

        let mut this = Self::with_kind(MessageKind::Error {
            error_name: error_name.into(),
            reply_serial,
        });

        this.destination = original.sender.clone();
        this.append_argument(error_message)?;
        Ok(this)
    }

    fn reply_target(&self) -> Result<Serial> {
        match (&self.kind, self.serial) {
            (MessageKind::MethodCall { .. }, Some(serial)) => Ok(serial),
            _ => Err(ErrorKind::InvalidReplyTarget.into()),
        }
    }

    fn check_unsealed(&self) -> Result<()> {
        if self.sealed {
            return Err(ErrorKind::MessageSealed.into());
        }

        Ok(())
    }

    /// Append an argument, extending the signature of the message.
    ///
    /// # Errors
    ///
    /// Errors if the message is sealed, or if the resulting signature would be
    /// invalid. In both cases the message is left unchanged.
    pub fn append_argument<T>(&mut self, argument: T) -> Result<()>
    where
        T: Into<Argument>,
    {
        self.check_unsealed()?;

        let argument = argument.into();
        let mut bytes = self.signature.as_bytes().to_vec();
        argument.write_signature(&mut bytes);
        let signature = OwnedSignature::new(&bytes).map_err(MarshalError::InvalidSignature)?;

        self.signature = signature;
        self.arguments.push(argument);
        Ok(())
    }

    /// Set or clear the destination of the message.
    pub fn set_destination(&mut self, destination: Option<&str>) -> Result<()> {
        self.check_unsealed()?;

        if let Some(destination) = destination {
            names::validate_bus_name(destination)?;
        }

        self.destination = destination.map(Box::from);
        Ok(())
    }

    /// Set or clear the sender of the message.
    ///
    /// The bus daemon controls this header on routed messages.
    pub fn set_sender(&mut self, sender: Option<&str>) -> Result<()> {
        self.check_unsealed()?;

        if let Some(sender) = sender {
            names::validate_bus_name(sender)?;
        }

        self.sender = sender.map(Box::from);
        Ok(())
    }

    /// Set the flags of the message.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::Message;
    /// use tokio_dbus_engine::proto::Flags;
    ///
    /// let mut m = Message::new_signal("/", "org.test.Demo", "Ping")?;
    /// m.set_flags(Flags::NO_REPLY_EXPECTED | Flags::NO_AUTO_START)?;
    /// assert!(m.flags() & Flags::NO_AUTO_START);
    /// # Ok::<_, tokio_dbus_engine::Error>(())
    /// ```
    pub fn set_flags(&mut self, flags: Flags) -> Result<()> {
        self.check_unsealed()?;
        self.flags = flags;
        Ok(())
    }

    /// Assign a serial and seal the message against further modification.
    pub fn seal(&mut self, serial: Serial) -> Result<()> {
        self.check_unsealed()?;
        self.serial = Some(serial);
        self.sealed = true;
        Ok(())
    }

    /// Test if the message is sealed.
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// The kind of the message.
    #[inline]
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The wire type of the message.
    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.kind.message_type()
    }

    /// The serial of the message, assigned when it is sent.
    #[inline]
    pub fn serial(&self) -> Option<Serial> {
        self.serial
    }

    /// The serial this message replies to, for method returns and errors.
    pub fn reply_serial(&self) -> Option<Serial> {
        match self.kind {
            MessageKind::MethodReturn { reply_serial } => Some(reply_serial),
            MessageKind::Error { reply_serial, .. } => Some(reply_serial),
            _ => None,
        }
    }

    /// The object path of a method call or signal.
    pub fn path(&self) -> Option<&ObjectPath> {
        match &self.kind {
            MessageKind::MethodCall { path, .. } => Some(&**path),
            MessageKind::Signal { path, .. } => Some(&**path),
            _ => None,
        }
    }

    /// The member of a method call or signal.
    pub fn member(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::MethodCall { member, .. } => Some(&**member),
            MessageKind::Signal { member, .. } => Some(&**member),
            _ => None,
        }
    }

    /// The error name of an error.
    pub fn error_name(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Error { error_name, .. } => Some(&**error_name),
            _ => None,
        }
    }

    /// The error text of an error, which is its first argument if that is a
    /// string.
    pub fn error_message(&self) -> Option<&str> {
        match self.kind {
            MessageKind::Error { .. } => self.arguments.first()?.as_str(),
            _ => None,
        }
    }

    #[inline]
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    #[inline]
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    #[inline]
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The number of Unix file descriptors declared by the message.
    #[inline]
    pub fn unix_fds(&self) -> Option<u32> {
        self.unix_fds
    }

    /// The signature of the message body.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The arguments of the message body.
    #[inline]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Take the arguments out of the message.
    #[inline]
    pub fn into_arguments(self) -> Vec<Argument> {
        self.arguments
    }
}

fn object_path(path: &str) -> Result<OwnedObjectPath, InvalidName> {
    OwnedObjectPath::new(path).map_err(|_| InvalidName::new(NameKind::ObjectPath, path))
}
