use crate::buf::MarshalError;
use crate::proto::Type;
use crate::{OwnedSignature, Signature, SignatureError};

use super::Argument;

/// A homogeneous D-Bus array.
///
/// The array carries its element type, so an empty array is still fully
/// typed on the wire.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::{Argument, Array, Signature};
///
/// let mut array = Array::new(Signature::STRING)?;
/// array.push("a")?;
/// array.push("b")?;
/// assert!(array.push(10u32).is_err());
///
/// assert_eq!(array.signature(), "as");
/// assert_eq!(array.len(), 2);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    // The signature of the array itself, including the leading `a`.
    signature: OwnedSignature,
    items: Vec<Argument>,
}

impl Array {
    /// Construct an empty array of the given element type.
    ///
    /// The element must be a single complete type.
    pub fn new(element: &Signature) -> Result<Self, SignatureError> {
        element.require_single()?;

        let mut bytes = Vec::with_capacity(element.len() + 1);
        bytes.push(Type::ARRAY.get());
        bytes.extend_from_slice(element.as_bytes());

        Ok(Self {
            signature: OwnedSignature::new(&bytes)?,
            items: Vec::new(),
        })
    }

    /// Construct an empty dictionary, which is an array of dict entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::{Array, Signature};
    ///
    /// let dict = Array::dict(Signature::STRING, Signature::VARIANT)?;
    /// assert_eq!(dict.signature(), "a{sv}");
    ///
    /// assert!(Array::dict(Signature::VARIANT, Signature::STRING).is_err());
    /// # Ok::<_, tokio_dbus_engine::SignatureError>(())
    /// ```
    pub fn dict(key: &Signature, value: &Signature) -> Result<Self, SignatureError> {
        key.require_single()?;
        value.require_single()?;

        let mut bytes = Vec::with_capacity(key.len() + value.len() + 3);
        bytes.push(Type::ARRAY.get());
        bytes.push(Type::OPEN_BRACE.get());
        bytes.extend_from_slice(key.as_bytes());
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(Type::CLOSE_BRACE.get());

        Ok(Self {
            signature: OwnedSignature::new(&bytes)?,
            items: Vec::new(),
        })
    }

    /// Construct an array from a decoded element signature and items.
    pub(super) fn from_parts(element: &Signature, items: Vec<Argument>) -> Self {
        let mut bytes = Vec::with_capacity(element.len() + 1);
        bytes.push(Type::ARRAY.get());
        bytes.extend_from_slice(element.as_bytes());

        Self {
            // SAFETY: The element comes from a validated array signature.
            signature: unsafe { OwnedSignature::from_vec_unchecked(bytes) },
            items,
        }
    }

    /// The signature of the array, such as `as` or `a{sv}`.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The element signature of the array.
    ///
    /// For dictionaries this is the dict entry type, such as `{sv}`, which
    /// is not a valid signature on its own and must not escape the crate.
    #[inline]
    pub(crate) fn element(&self) -> &Signature {
        // SAFETY: The element of a valid array signature is only invalid on
        // its own for dict entries, which are only used for comparisons and
        // alignment.
        unsafe { Signature::new_unchecked(&self.signature.as_bytes()[1..]) }
    }

    /// Append an item, which must have the element type of the array.
    pub fn push<T>(&mut self, item: T) -> Result<(), MarshalError>
    where
        T: Into<Argument>,
    {
        let item = item.into();
        let mut actual = Vec::new();
        item.write_signature(&mut actual);

        if actual != self.element().as_bytes() {
            return Err(MarshalError::HeterogeneousArray {
                expected: self.element().as_str().to_owned(),
                actual: String::from_utf8_lossy(&actual).into_owned(),
            });
        }

        self.items.push(item);
        Ok(())
    }

    /// Append a key and value pair to a dictionary.
    pub fn push_entry<K, V>(&mut self, key: K, value: V) -> Result<(), MarshalError>
    where
        K: Into<Argument>,
        V: Into<Argument>,
    {
        self.push(Argument::DictEntry(
            Box::new(key.into()),
            Box::new(value.into()),
        ))
    }

    /// The items in the array.
    #[inline]
    pub fn items(&self) -> &[Argument] {
        &self.items
    }

    /// Take the items out of the array.
    #[inline]
    pub fn into_items(self) -> Vec<Argument> {
        self.items
    }

    /// The number of items in the array.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Test if the array is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
