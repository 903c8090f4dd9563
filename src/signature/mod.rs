//! Validated D-Bus type signatures.

#[cfg(test)]
mod tests;

pub use self::iter::{Element, Iter};
mod iter;

use self::validation::validate;
mod validation;

pub use self::signature::Signature;
mod signature;

pub use self::owned_signature::OwnedSignature;
mod owned_signature;

pub use self::signature_error::SignatureError;
pub(crate) use self::signature_error::SignatureErrorKind;
mod signature_error;

/// The maximum length of a signature in bytes.
pub(crate) const MAX_SIGNATURE: usize = 255;

/// The maximum depth of one kind of container.
pub(crate) const MAX_CONTAINER_DEPTH: usize = 32;

/// The maximum total depth of any containers.
pub(crate) const MAX_DEPTH: usize = MAX_CONTAINER_DEPTH * 2;
