use crate::proto::Type;

use super::Signature;

/// A complete type yielded by the [`Iter`] iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element<'a> {
    /// A single-character type code. This covers every basic type as well as
    /// variants.
    Code(Type),
    /// An array with the given element signature.
    Array(&'a Signature),
    /// A struct with the given field signatures.
    Struct(&'a Signature),
    /// A dict entry with the given key and value signatures.
    Dict(&'a Signature, &'a Signature),
}

/// An iterator over a signature which yields one complete type at a time.
pub struct Iter<'a> {
    rest: &'a Signature,
}

impl<'a> Iter<'a> {
    #[inline]
    pub(super) fn new(signature: &'a Signature) -> Self {
        Self { rest: signature }
    }

    /// The part of the signature which has not been iterated over yet.
    #[inline]
    pub fn as_signature(&self) -> &'a Signature {
        self.rest
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (head, rest) = self.rest.split_first()?;
        self.rest = rest;

        let bytes = head.as_bytes();

        // SAFETY: Sub-slices of a validated complete type taken at container
        // boundaries are themselves valid signatures.
        unsafe {
            Some(match Type::new(bytes[0]) {
                Type::ARRAY => Element::Array(Signature::new_unchecked(&bytes[1..])),
                Type::OPEN_PAREN => {
                    Element::Struct(Signature::new_unchecked(&bytes[1..bytes.len() - 1]))
                }
                Type::OPEN_BRACE => {
                    let inner = Signature::new_unchecked(&bytes[1..bytes.len() - 1]);
                    let (key, value) = inner.split_first()?;
                    Element::Dict(key, value)
                }
                t => Element::Code(t),
            })
        }
    }
}
