//! Low level details for the D-Bus protocol implementation.
//!
//! These values are fixed by the protocol and must not be renumbered.

raw_enum! {
    /// The endianness of a message.
    #[repr(u8)]
    pub enum Endianness {
        /// Little endian.
        LITTLE = b'l',
        /// Big endian.
        BIG = b'B',
    }
}

impl Endianness {
    /// Native endian.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::LITTLE;
    /// Native endian.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::BIG;
}

raw_enum! {
    /// The type of a message.
    #[repr(u8)]
    pub enum MessageType {
        /// This is an invalid type.
        INVALID = 0,
        /// Method call. This message type may prompt a reply.
        METHOD_CALL = 1,
        /// Method reply with returned data.
        METHOD_RETURN = 2,
        /// Error reply. If the first argument exists and is a string, it is an
        /// error message.
        ERROR = 3,
        /// Signal emission.
        SIGNAL = 4,
    }
}

raw_set! {
    /// Flags inside of a D-Bus message.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::proto::Flags;
    ///
    /// let flags = Flags::EMPTY;
    /// assert!(!(flags & Flags::NO_REPLY_EXPECTED));
    ///
    /// let flags = Flags::EMPTY | Flags::NO_REPLY_EXPECTED;
    /// assert!(flags & Flags::NO_REPLY_EXPECTED);
    /// assert!(!(flags & Flags::NO_AUTO_START));
    /// ```
    #[repr(u8)]
    pub enum Flags {
        /// An empty set of flags.
        EMPTY = 0,
        /// This message does not expect method return replies or error replies,
        /// even if it is of a type that can have a reply; the reply should be
        /// omitted.
        NO_REPLY_EXPECTED = 1,
        /// The bus must not launch an owner for the destination name in
        /// response to this message.
        NO_AUTO_START = 2,
        /// The caller is prepared to wait for interactive authorization, which
        /// might take a considerable time to complete. Only valid for method
        /// calls.
        ALLOW_INTERACTIVE_AUTHORIZATION = 4,
    }
}

raw_enum! {
    /// Codes of the header fields stored in the `a(yv)` header array.
    #[repr(u8)]
    pub(crate) enum HeaderField {
        /// The object to send a call to, or the object a signal is emitted
        /// from.
        PATH = 1,
        /// The interface to invoke a method call on, or that a signal is
        /// emitted from.
        INTERFACE = 2,
        /// The member, either the method name or signal name.
        MEMBER = 3,
        /// The name of the error that occurred, for errors.
        ERROR_NAME = 4,
        /// The serial number of the message this message is a reply to.
        REPLY_SERIAL = 5,
        /// The name of the connection this message is intended for.
        DESTINATION = 6,
        /// Unique name of the sending connection. Controlled by the bus.
        SENDER = 7,
        /// The signature of the message body.
        SIGNATURE = 8,
        /// The number of Unix file descriptors that accompany the message.
        UNIX_FDS = 9,
    }
}

raw_enum! {
    /// A type code inside of a signature.
    #[repr(u8)]
    pub enum Type {
        /// 8-bit unsigned integer.
        BYTE = b'y',
        /// Boolean value, 0 is FALSE and 1 is TRUE. Everything else is invalid.
        BOOLEAN = b'b',
        /// 16-bit signed integer.
        INT16 = b'n',
        /// 16-bit unsigned integer.
        UINT16 = b'q',
        /// 32-bit signed integer.
        INT32 = b'i',
        /// 32-bit unsigned integer.
        UINT32 = b'u',
        /// 64-bit signed integer.
        INT64 = b'x',
        /// 64-bit unsigned integer.
        UINT64 = b't',
        /// IEEE 754 double.
        DOUBLE = b'd',
        /// UTF-8 string (must be valid UTF-8). Must be nul terminated and
        /// contain no other nul bytes.
        STRING = b's',
        /// Name of an object instance.
        OBJECT_PATH = b'o',
        /// A type signature.
        SIGNATURE = b'g',
        /// Array.
        ARRAY = b'a',
        /// Variant type (the type of the value is part of the value itself).
        VARIANT = b'v',
        /// Unix file descriptor, transmitted as an index.
        UNIX_FD = b'h',
        /// Struct start.
        OPEN_PAREN = b'(',
        /// Struct end.
        CLOSE_PAREN = b')',
        /// Dict entry start.
        OPEN_BRACE = b'{',
        /// Dict entry end.
        CLOSE_BRACE = b'}',
    }
}

impl Type {
    /// Test if the type code is a basic (non-container) type.
    pub const fn is_basic(self) -> bool {
        matches!(
            self,
            Type::BYTE
                | Type::BOOLEAN
                | Type::INT16
                | Type::UINT16
                | Type::INT32
                | Type::UINT32
                | Type::INT64
                | Type::UINT64
                | Type::DOUBLE
                | Type::STRING
                | Type::OBJECT_PATH
                | Type::SIGNATURE
                | Type::UNIX_FD
        )
    }

    /// The wire alignment of values starting with this type code.
    ///
    /// Returns `None` for codes which cannot begin a complete type.
    pub const fn alignment(self) -> Option<usize> {
        let align = match self {
            Type::BYTE | Type::SIGNATURE | Type::VARIANT => 1,
            Type::INT16 | Type::UINT16 => 2,
            Type::BOOLEAN
            | Type::INT32
            | Type::UINT32
            | Type::UNIX_FD
            | Type::STRING
            | Type::OBJECT_PATH
            | Type::ARRAY => 4,
            Type::INT64 | Type::UINT64 | Type::DOUBLE | Type::OPEN_PAREN | Type::OPEN_BRACE => 8,
            _ => return None,
        };

        Some(align)
    }
}

/// The protocol version spoken by this implementation.
pub(crate) const VERSION: u8 = 1;

/// Size of the fixed part of a message header: `yyyyuu` followed by the
/// length of the header field array.
pub(crate) const FIXED_HEADER_LENGTH: usize = 16;
