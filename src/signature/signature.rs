use std::fmt;
use std::str::from_utf8_unchecked;

use crate::proto::Type;

use super::{validate, Iter, OwnedSignature, SignatureError, SignatureErrorKind};

/// A D-Bus signature.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::Signature;
///
/// const SIG: &Signature = Signature::new_const(b"aaaai");
///
/// assert!(Signature::new(b"aai").is_ok());
/// assert!(Signature::new(b"a{vs}").is_err());
/// ```
#[derive(Hash, PartialEq, Eq)]
#[repr(transparent)]
pub struct Signature([u8]);

impl Signature {
    /// The empty signature.
    pub const EMPTY: &'static Signature = Signature::new_const(b"");
    /// A single byte.
    pub const BYTE: &'static Signature = Signature::new_const(b"y");
    /// A boolean.
    pub const BOOLEAN: &'static Signature = Signature::new_const(b"b");
    /// Signed (two's complement) 16-bit integer.
    pub const INT16: &'static Signature = Signature::new_const(b"n");
    /// Unsigned 16-bit integer.
    pub const UINT16: &'static Signature = Signature::new_const(b"q");
    /// Signed (two's complement) 32-bit integer.
    pub const INT32: &'static Signature = Signature::new_const(b"i");
    /// Unsigned 32-bit integer.
    pub const UINT32: &'static Signature = Signature::new_const(b"u");
    /// Signed (two's complement) 64-bit integer (mnemonic: x and t are the
    /// first characters in "sixty" not already used for something more common)
    pub const INT64: &'static Signature = Signature::new_const(b"x");
    /// Unsigned 64-bit integer.
    pub const UINT64: &'static Signature = Signature::new_const(b"t");
    /// IEEE 754 double-precision floating point.
    pub const DOUBLE: &'static Signature = Signature::new_const(b"d");
    /// Unsigned 32-bit integer representing an index into an out-of-band array
    /// of file descriptors (mnemonic: h for handle).
    pub const UNIX_FD: &'static Signature = Signature::new_const(b"h");
    /// A string.
    pub const STRING: &'static Signature = Signature::new_const(b"s");
    /// An object path.
    pub const OBJECT_PATH: &'static Signature = Signature::new_const(b"o");
    /// A signature.
    pub const SIGNATURE: &'static Signature = Signature::new_const(b"g");
    /// A variant.
    pub const VARIANT: &'static Signature = Signature::new_const(b"v");

    /// Construct a new signature with validation inside of a constant context.
    ///
    /// This will panic in case the signature is invalid.
    ///
    /// ```compile_fail
    /// use tokio_dbus_engine::Signature;
    ///
    /// const BAD: &Signature = Signature::new_const(b"(a)");
    /// ```
    #[inline]
    #[track_caller]
    pub const fn new_const(signature: &[u8]) -> &Signature {
        if validate(signature).is_err() {
            panic!("Invalid D-Bus signature")
        };

        // SAFETY: The byte slice is repr transparent over this type.
        unsafe { Self::new_unchecked(signature) }
    }

    /// Try to construct a new signature with validation.
    #[inline]
    pub fn new<S>(signature: &S) -> Result<&Signature, SignatureError>
    where
        S: ?Sized + AsRef<[u8]>,
    {
        let signature = signature.as_ref();
        validate(signature)?;
        // SAFETY: The byte slice is repr transparent over this type.
        unsafe { Ok(Self::new_unchecked(signature)) }
    }

    /// Construct a new signature without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the signature is a valid signature.
    #[inline]
    pub(crate) const unsafe fn new_unchecked(signature: &[u8]) -> &Self {
        &*(signature as *const _ as *const Signature)
    }

    /// Test if the signature is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The length of the signature in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the signature as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: Validation ensures that the signature is ASCII.
        unsafe { from_utf8_unchecked(&self.0) }
    }

    /// Get the signature as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Iterate over the complete types in the signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::signature::Element;
    /// use tokio_dbus_engine::proto::Type;
    /// use tokio_dbus_engine::Signature;
    ///
    /// let sig = Signature::new("ua{sv}")?;
    /// let mut it = sig.iter();
    ///
    /// assert_eq!(it.next(), Some(Element::Code(Type::UINT32)));
    /// assert!(matches!(it.next(), Some(Element::Array(..))));
    /// assert_eq!(it.next(), None);
    /// # Ok::<_, tokio_dbus_engine::SignatureError>(())
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// Test if the signature consists of exactly one complete type.
    pub fn is_single_complete_type(&self) -> bool {
        matches!(self.split_first(), Some((_, rest)) if rest.is_empty())
    }

    /// Require that the signature is a single complete type.
    pub(crate) fn require_single(&self) -> Result<(), SignatureError> {
        if !self.is_single_complete_type() {
            return Err(SignatureError::new(
                SignatureErrorKind::NotSingleCompleteType,
            ));
        }

        Ok(())
    }

    /// Split off the first complete type of the signature.
    pub(crate) fn split_first(&self) -> Option<(&Signature, &Signature)> {
        let n = complete_len(&self.0)?;
        let (head, tail) = self.0.split_at(n);
        // SAFETY: A complete type and its remainder of a valid signature are
        // both valid signatures.
        unsafe { Some((Self::new_unchecked(head), Self::new_unchecked(tail))) }
    }

    /// The wire alignment of the first type in the signature.
    pub(crate) fn alignment(&self) -> usize {
        match self.0.first() {
            Some(&b) => Type::new(b).alignment().unwrap_or(1),
            None => 1,
        }
    }
}

/// Find the length of the first complete type in `bytes`.
fn complete_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;

    for (n, &b) in bytes.iter().enumerate() {
        match b {
            b'a' => continue,
            b'(' | b'{' => depth += 1,
            b')' | b'}' => depth = depth.checked_sub(1)?,
            _ => {}
        }

        if depth == 0 {
            return Some(n + 1);
        }
    }

    None
}

impl fmt::Debug for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<Signature> for Signature {
    #[inline]
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl ToOwned for Signature {
    type Owned = OwnedSignature;

    #[inline]
    fn to_owned(&self) -> Self::Owned {
        // SAFETY: This type ensures that the signature is valid.
        unsafe { OwnedSignature::from_vec_unchecked(self.0.to_vec()) }
    }
}

impl PartialEq<OwnedSignature> for Signature {
    #[inline]
    fn eq(&self, other: &OwnedSignature) -> bool {
        self.0 == *other.as_bytes()
    }
}

impl PartialEq<str> for Signature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0 == *other.as_bytes()
    }
}

impl PartialEq<&str> for Signature {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other.as_bytes()
    }
}

impl PartialEq<str> for &Signature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0 == *other.as_bytes()
    }
}
