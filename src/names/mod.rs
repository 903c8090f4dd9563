//! Grammar checks for bus names, interfaces, members and error names.


pub use self::invalid_name::{InvalidName, NameKind};
mod invalid_name;

/// The maximum length of any name.
const MAX_NAME: usize = 255;

/// Validate a bus name, either unique (`:1.42`) or well-known
/// (`org.freedesktop.DBus`).
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::names;
///
/// assert!(names::validate_bus_name(":1.42").is_ok());
/// assert!(names::validate_bus_name("org.test.Demo").is_ok());
/// assert!(names::validate_bus_name("").is_err());
/// ```
pub fn validate_bus_name(name: &str) -> Result<(), InvalidName> {
    let ok = match name.as_bytes() {
        [b':', rest @ ..] => is_unique(rest),
        bytes => is_well_known(bytes),
    };

    check(ok && name.len() <= MAX_NAME, NameKind::BusName, name)
}

/// Validate a well-known bus name, which is the only kind of name that can be
/// requested from the bus.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::names;
///
/// assert!(names::validate_well_known_name("org.test.Demo").is_ok());
/// assert!(names::validate_well_known_name("1bad.name").is_err());
/// assert!(names::validate_well_known_name(":1.42").is_err());
/// ```
pub fn validate_well_known_name(name: &str) -> Result<(), InvalidName> {
    check(
        is_well_known(name.as_bytes()) && name.len() <= MAX_NAME,
        NameKind::WellKnownName,
        name,
    )
}

/// Validate an interface name such as `org.freedesktop.DBus`.
pub fn validate_interface(name: &str) -> Result<(), InvalidName> {
    check(is_interface(name.as_bytes()), NameKind::Interface, name)
}

/// Validate a member name such as `RequestName`.
pub fn validate_member(name: &str) -> Result<(), InvalidName> {
    let bytes = name.as_bytes();
    let ok = bytes.len() <= MAX_NAME && is_element(bytes, is_ident_start, is_ident);
    check(ok, NameKind::Member, name)
}

/// Validate an error name, which follows the interface grammar.
pub fn validate_error_name(name: &str) -> Result<(), InvalidName> {
    check(is_interface(name.as_bytes()), NameKind::ErrorName, name)
}

fn check(ok: bool, kind: NameKind, name: &str) -> Result<(), InvalidName> {
    if ok {
        Ok(())
    } else {
        Err(InvalidName::new(kind, name))
    }
}

fn is_interface(bytes: &[u8]) -> bool {
    bytes.len() <= MAX_NAME && is_dotted(bytes, is_ident_start, is_ident)
}

fn is_unique(bytes: &[u8]) -> bool {
    is_dotted(bytes, is_bus_char, is_bus_char)
}

fn is_well_known(bytes: &[u8]) -> bool {
    is_dotted(bytes, is_bus_start, is_bus_char)
}

/// Test for at least two non-empty dot-separated elements.
fn is_dotted(bytes: &[u8], start: fn(u8) -> bool, rest: fn(u8) -> bool) -> bool {
    let mut elements = 0;

    for element in bytes.split(|&b| b == b'.') {
        if !is_element(element, start, rest) {
            return false;
        }

        elements += 1;
    }

    elements >= 2
}

fn is_element(bytes: &[u8], start: fn(u8) -> bool, rest: fn(u8) -> bool) -> bool {
    match bytes {
        [first, tail @ ..] => start(*first) && tail.iter().all(|&b| rest(b)),
        [] => false,
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_bus_start(b: u8) -> bool {
    is_ident_start(b) || b == b'-'
}

fn is_bus_char(b: u8) -> bool {
    is_ident(b) || b == b'-'
}
