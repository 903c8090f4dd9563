use crate::proto::Type;
use crate::{ObjectPath, OwnedObjectPath, OwnedSignature, Signature, SignatureError};

use super::Array;

/// A single typed D-Bus value.
///
/// Every variant maps to exactly one wire type, so the signature of a value is
/// always known from the value itself.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::{Argument, Array, Signature};
///
/// let mut dict = Array::dict(Signature::STRING, Signature::VARIANT)?;
/// dict.push_entry("answer", Argument::Variant(Box::new(Argument::Uint32(42))))?;
///
/// let value = Argument::Struct(vec![Argument::from("name"), Argument::Array(dict)]);
/// assert_eq!(value.signature()?, "(sa{sv})");
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// 8-bit unsigned integer (`y`).
    Byte(u8),
    /// Boolean (`b`).
    Boolean(bool),
    /// 16-bit signed integer (`n`).
    Int16(i16),
    /// 16-bit unsigned integer (`q`).
    Uint16(u16),
    /// 32-bit signed integer (`i`).
    Int32(i32),
    /// 32-bit unsigned integer (`u`).
    Uint32(u32),
    /// 64-bit signed integer (`x`).
    Int64(i64),
    /// 64-bit unsigned integer (`t`).
    Uint64(u64),
    /// IEEE 754 double (`d`).
    Double(f64),
    /// Index into the out-of-band file descriptor array (`h`).
    UnixFd(u32),
    /// UTF-8 string without NUL bytes (`s`).
    String(String),
    /// Object path (`o`).
    ObjectPath(OwnedObjectPath),
    /// Type signature (`g`).
    Signature(OwnedSignature),
    /// Homogeneous array (`a`).
    Array(Array),
    /// Struct with at least one field (`(...)`).
    Struct(Vec<Argument>),
    /// Value tagged with its own signature (`v`).
    Variant(Box<Argument>),
    /// Key and value pair, only valid as an array element (`{..}`).
    DictEntry(Box<Argument>, Box<Argument>),
}

impl Argument {
    /// The single complete type of the value.
    ///
    /// This fails for values which have no valid standalone signature, such as
    /// an empty struct or a dict entry outside of an array.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::Argument;
    ///
    /// assert_eq!(Argument::from("hello").signature()?, "s");
    /// assert!(Argument::Struct(Vec::new()).signature().is_err());
    /// # Ok::<_, tokio_dbus_engine::SignatureError>(())
    /// ```
    pub fn signature(&self) -> Result<OwnedSignature, SignatureError> {
        let mut bytes = Vec::new();
        self.write_signature(&mut bytes);
        OwnedSignature::new(&bytes)
    }

    /// Append the unvalidated signature of the value to `out`.
    pub(crate) fn write_signature(&self, out: &mut Vec<u8>) {
        let code = match self {
            Argument::Byte(..) => Type::BYTE,
            Argument::Boolean(..) => Type::BOOLEAN,
            Argument::Int16(..) => Type::INT16,
            Argument::Uint16(..) => Type::UINT16,
            Argument::Int32(..) => Type::INT32,
            Argument::Uint32(..) => Type::UINT32,
            Argument::Int64(..) => Type::INT64,
            Argument::Uint64(..) => Type::UINT64,
            Argument::Double(..) => Type::DOUBLE,
            Argument::UnixFd(..) => Type::UNIX_FD,
            Argument::String(..) => Type::STRING,
            Argument::ObjectPath(..) => Type::OBJECT_PATH,
            Argument::Signature(..) => Type::SIGNATURE,
            Argument::Variant(..) => Type::VARIANT,
            Argument::Array(array) => {
                out.extend_from_slice(array.signature().as_bytes());
                return;
            }
            Argument::Struct(fields) => {
                out.push(Type::OPEN_PAREN.get());

                for field in fields {
                    field.write_signature(out);
                }

                out.push(Type::CLOSE_PAREN.get());
                return;
            }
            Argument::DictEntry(key, value) => {
                out.push(Type::OPEN_BRACE.get());
                key.write_signature(out);
                value.write_signature(out);
                out.push(Type::CLOSE_BRACE.get());
                return;
            }
        };

        out.push(code.get());
    }

    /// Get the value as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(string) => Some(string),
            _ => None,
        }
    }

    /// Get the value if it is an unsigned 32-bit integer.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Argument::Uint32(value) => Some(value),
            _ => None,
        }
    }

    /// Get the value if it is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Argument::Boolean(value) => Some(value),
            _ => None,
        }
    }

    /// Get the value if it is an object path.
    pub fn as_object_path(&self) -> Option<&ObjectPath> {
        match self {
            Argument::ObjectPath(path) => Some(path),
            _ => None,
        }
    }

    /// Get the value if it is an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Argument::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Get the inner value of a variant.
    pub fn as_variant(&self) -> Option<&Argument> {
        match self {
            Argument::Variant(inner) => Some(inner),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Argument {
                #[inline]
                fn from(value: $ty) -> Self {
                    Argument::$variant(value)
                }
            }
        )*
    }
}

impl_from! {
    u8 => Byte,
    bool => Boolean,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f64 => Double,
    String => String,
    OwnedObjectPath => ObjectPath,
    OwnedSignature => Signature,
    Array => Array,
}

impl From<&str> for Argument {
    #[inline]
    fn from(value: &str) -> Self {
        Argument::String(value.to_owned())
    }
}

impl From<&ObjectPath> for Argument {
    #[inline]
    fn from(value: &ObjectPath) -> Self {
        Argument::ObjectPath(value.to_owned())
    }
}

impl From<&Signature> for Argument {
    #[inline]
    fn from(value: &Signature) -> Self {
        Argument::Signature(value.to_owned())
    }
}
