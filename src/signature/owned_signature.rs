use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use super::{validate, Signature, SignatureError, MAX_SIGNATURE};

/// A D-Bus signature.
///
/// This is the owned variant which dereferences to [`Signature`].
#[derive(Default, Clone, Hash, PartialEq, Eq)]
pub struct OwnedSignature(Vec<u8>);

impl OwnedSignature {
    /// Construct a new empty signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::OwnedSignature;
    ///
    /// let sig = OwnedSignature::empty();
    /// assert!(sig.is_empty());
    /// ```
    #[inline]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Try to construct a new signature with validation.
    #[inline]
    pub fn new(signature: &[u8]) -> Result<Self, SignatureError> {
        validate(signature)?;
        Ok(Self(signature.to_vec()))
    }

    /// Construct an owned signature from a vector.
    ///
    /// # Safety
    ///
    /// Caller must ensure that `bytes` is a valid signature.
    #[inline]
    pub(crate) unsafe fn from_vec_unchecked(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Append a signature.
    ///
    /// Concatenating two valid signatures can only fail by exceeding the
    /// maximum signature length, in which case `self` is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::{OwnedSignature, Signature};
    ///
    /// let mut sig = OwnedSignature::empty();
    /// sig.extend_from_signature(Signature::STRING)?;
    /// sig.extend_from_signature(Signature::new("a{sv}")?)?;
    /// assert_eq!(sig, "sa{sv}");
    ///
    /// let long = OwnedSignature::new(&[b'i'; 255])?;
    /// assert!(sig.extend_from_signature(&long).is_err());
    /// assert_eq!(sig, "sa{sv}");
    /// # Ok::<_, tokio_dbus_engine::SignatureError>(())
    /// ```
    pub fn extend_from_signature(&mut self, other: &Signature) -> Result<(), SignatureError> {
        if self.0.len() + other.len() > MAX_SIGNATURE {
            return Err(SignatureError::too_long());
        }

        self.0.extend_from_slice(other.as_bytes());
        Ok(())
    }

    /// Clear the signature.
    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Debug for OwnedSignature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedSignature")
            .field(&self.as_str())
            .finish()
    }
}

impl fmt::Display for OwnedSignature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Deref for OwnedSignature {
    type Target = Signature;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: Construction of OwnedSignature ensures that the signature is
        // valid.
        unsafe { Signature::new_unchecked(&self.0) }
    }
}

impl Borrow<Signature> for OwnedSignature {
    #[inline]
    fn borrow(&self) -> &Signature {
        self
    }
}

impl AsRef<Signature> for OwnedSignature {
    #[inline]
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl From<&Signature> for OwnedSignature {
    #[inline]
    fn from(signature: &Signature) -> Self {
        signature.to_owned()
    }
}

impl PartialEq<Signature> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &Signature) -> bool {
        *self.0 == *other.as_bytes()
    }
}

impl PartialEq<&Signature> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &&Signature) -> bool {
        *self.0 == *other.as_bytes()
    }
}

impl PartialEq<str> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other.as_bytes()
    }
}

impl PartialEq<&str> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        *self.0 == *other.as_bytes()
    }
}
