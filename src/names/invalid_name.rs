use std::error;
use std::fmt;

/// The kind of name which failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NameKind {
    /// A unique or well-known bus name.
    BusName,
    /// A well-known bus name.
    WellKnownName,
    /// An object path.
    ObjectPath,
    /// An interface name.
    Interface,
    /// A member name.
    Member,
    /// An error name.
    ErrorName,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::BusName => write!(f, "bus name"),
            NameKind::WellKnownName => write!(f, "well-known bus name"),
            NameKind::ObjectPath => write!(f, "object path"),
            NameKind::Interface => write!(f, "interface name"),
            NameKind::Member => write!(f, "member name"),
            NameKind::ErrorName => write!(f, "error name"),
        }
    }
}

/// A name was rejected by the D-Bus name grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidName {
    kind: NameKind,
    name: Box<str>,
}

impl InvalidName {
    pub(crate) fn new(kind: NameKind, name: &str) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// The kind of name which failed validation.
    #[inline]
    pub fn kind(&self) -> NameKind {
        self.kind
    }

    /// The rejected name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for InvalidName {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} `{}`", self.kind, self.name)
    }
}

impl error::Error for InvalidName {}
