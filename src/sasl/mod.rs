//! Types related to SASL authentication which D-Bus performs.

#[cfg(test)]
mod tests;

use std::fmt;

/// The SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Auth {
    /// EXTERNAL authentication with the uid of the current process.
    ///
    /// This requires the `libc` feature.
    External,
    /// EXTERNAL authentication claiming the given uid.
    ExternalUid(u32),
    /// ANONYMOUS authentication.
    Anonymous,
}

impl Default for Auth {
    #[inline]
    fn default() -> Self {
        if cfg!(all(unix, feature = "libc")) {
            Auth::External
        } else {
            Auth::Anonymous
        }
    }
}

impl fmt::Display for Auth {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::External | Auth::ExternalUid(..) => write!(f, "EXTERNAL"),
            Auth::Anonymous => write!(f, "ANONYMOUS"),
        }
    }
}

/// The trace sent with ANONYMOUS authentication.
const ANONYMOUS_TRACE: &str = "tokio-dbus-engine";

/// Build the `AUTH` command for the given mechanism, including the line
/// terminator.
///
/// Returns `None` if the mechanism needs the uid of the current process and it
/// is not available.
pub(crate) fn auth_command(auth: Auth) -> Option<String> {
    let initial = match auth {
        Auth::External => hex(current_uid()?.to_string().as_bytes()),
        Auth::ExternalUid(uid) => hex(uid.to_string().as_bytes()),
        Auth::Anonymous => hex(ANONYMOUS_TRACE.as_bytes()),
    };

    Some(format!("AUTH {auth} {initial}\r\n"))
}

#[cfg(all(unix, feature = "libc"))]
fn current_uid() -> Option<u32> {
    // SAFETY: getuid has no preconditions and cannot fail.
    Some(unsafe { libc::getuid() })
}

#[cfg(not(all(unix, feature = "libc")))]
fn current_uid() -> Option<u32> {
    None
}

/// Encode bytes as lowercase ascii hex.
pub(crate) fn hex(bytes: &[u8]) -> String {
    const HEX: [u8; 16] = *b"0123456789abcdef";

    let mut out = String::with_capacity(bytes.len() * 2);

    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0xf) as usize] as char);
    }

    out
}

/// A SASL response from the server, parsed from a single line without its
/// line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SaslResponse<'a> {
    /// The OK message with the GUID of the server.
    Ok(&'a str),
    /// The mechanism was rejected; the server lists the ones it supports.
    Rejected(&'a str),
    /// The server failed to process the previous command.
    Error(&'a str),
    /// Data for the current mechanism.
    Data(&'a str),
    /// The server agreed to pass Unix file descriptors.
    AgreeUnixFd,
}

impl<'a> SaslResponse<'a> {
    /// Parse a response line.
    pub(crate) fn parse(line: &'a [u8]) -> Option<Self> {
        let line = std::str::from_utf8(line).ok()?;

        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        Some(match command {
            "OK" => {
                if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }

                SaslResponse::Ok(rest)
            }
            "REJECTED" => SaslResponse::Rejected(rest),
            "ERROR" => SaslResponse::Error(rest),
            "DATA" => SaslResponse::Data(rest),
            "AGREE_UNIX_FD" => SaslResponse::AgreeUnixFd,
            _ => return None,
        })
    }
}
