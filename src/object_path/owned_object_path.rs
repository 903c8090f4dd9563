use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use super::{validate, ObjectPath, ObjectPathError};

/// An owned object path.
///
/// This dereferences to [`ObjectPath`].
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct OwnedObjectPath(Vec<u8>);

impl OwnedObjectPath {
    /// Construct a new validated owned object path.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::OwnedObjectPath;
    ///
    /// assert!(OwnedObjectPath::new("/org/test/Demo").is_ok());
    /// assert!(OwnedObjectPath::new("/org/test/").is_err());
    /// ```
    pub fn new<P>(path: &P) -> Result<Self, ObjectPathError>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        let path = path.as_ref();

        if !validate(path) {
            return Err(ObjectPathError);
        }

        Ok(Self(path.to_vec()))
    }

    /// Construct from a raw vector.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the vector is a valid object path.
    #[inline]
    pub(super) unsafe fn from_raw_vec(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl Deref for OwnedObjectPath {
    type Target = ObjectPath;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: Construction ensures that the path is valid.
        unsafe { ObjectPath::new_unchecked(&self.0) }
    }
}

impl Borrow<ObjectPath> for OwnedObjectPath {
    #[inline]
    fn borrow(&self) -> &ObjectPath {
        self
    }
}

impl AsRef<ObjectPath> for OwnedObjectPath {
    #[inline]
    fn as_ref(&self) -> &ObjectPath {
        self
    }
}

impl From<&ObjectPath> for OwnedObjectPath {
    #[inline]
    fn from(path: &ObjectPath) -> Self {
        path.to_owned()
    }
}

impl fmt::Display for OwnedObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}

impl fmt::Debug for OwnedObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}

impl PartialEq<ObjectPath> for OwnedObjectPath {
    #[inline]
    fn eq(&self, other: &ObjectPath) -> bool {
        *self.0 == *other.as_bytes()
    }
}

impl PartialEq<str> for OwnedObjectPath {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other.as_bytes()
    }
}

impl PartialEq<&str> for OwnedObjectPath {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        *self.0 == *other.as_bytes()
    }
}
