use std::path::PathBuf;

use super::ConnectError;

/// A single connectable server address.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Address {
    /// A Unix domain socket at a filesystem path.
    Unix(PathBuf),
    /// A Unix domain socket in the Linux abstract namespace.
    UnixAbstract(Vec<u8>),
    /// A TCP socket.
    Tcp {
        /// Host name or address to connect to.
        host: String,
        /// Port to connect to.
        port: u16,
    },
}

impl Address {
    /// Parse a single address of the form `transport:key=value,...`.
    ///
    /// Values are unescaped from `%XX` sequences.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::connection::Address;
    ///
    /// let address = Address::parse("unix:path=/run/user/1000/bus")?;
    /// assert_eq!(address, Address::Unix("/run/user/1000/bus".into()));
    ///
    /// let address = Address::parse("tcp:host=localhost,port=4000,family=ipv4")?;
    /// assert_eq!(address, Address::Tcp { host: "localhost".into(), port: 4000 });
    /// # Ok::<_, tokio_dbus_engine::connection::ConnectError>(())
    /// ```
    pub fn parse(address: &str) -> Result<Self, ConnectError> {
        let malformed = || ConnectError::MalformedAddress(address.into());

        let Some((transport, rest)) = address.split_once(':') else {
            return Err(malformed());
        };

        let mut path = None;
        let mut abstract_name = None;
        let mut host = None;
        let mut port = None;

        for pair in rest.split(',').filter(|pair| !pair.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(malformed());
            };

            let value = unescape(value).ok_or_else(malformed)?;

            match key {
                "path" => path = Some(value),
                "abstract" => abstract_name = Some(value),
                "host" => host = Some(value),
                "port" => port = Some(value),
                _ => {}
            }
        }

        match transport {
            "unix" => match (path, abstract_name) {
                (Some(path), None) => Ok(Address::Unix(bytes_to_path(path))),
                (None, Some(name)) => Ok(Address::UnixAbstract(name)),
                _ => Err(malformed()),
            },
            "tcp" => {
                let host = match host {
                    Some(host) => String::from_utf8(host).map_err(|_| malformed())?,
                    None => String::from("localhost"),
                };

                let port = port.ok_or_else(malformed)?;

                let port = std::str::from_utf8(&port)
                    .ok()
                    .and_then(|port| port.parse::<u16>().ok())
                    .ok_or_else(malformed)?;

                Ok(Address::Tcp { host, port })
            }
            _ => Err(ConnectError::UnsupportedTransport(transport.into())),
        }
    }

    /// Iterate over the `;`-separated alternatives in `addresses`.
    ///
    /// Each alternative is parsed on its own, so a bad alternative does not
    /// prevent later ones from being tried.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::connection::Address;
    ///
    /// let mut it = Address::parse_all("foo:bar=1;unix:abstract=test");
    /// assert!(it.next().unwrap().is_err());
    /// assert_eq!(it.next().unwrap()?, Address::UnixAbstract(b"test".to_vec()));
    /// assert!(it.next().is_none());
    /// # Ok::<_, tokio_dbus_engine::connection::ConnectError>(())
    /// ```
    pub fn parse_all(
        addresses: &str,
    ) -> impl Iterator<Item = Result<Address, ConnectError>> + '_ {
        addresses
            .split(';')
            .filter(|address| !address.is_empty())
            .map(Address::parse)
    }
}

fn unescape(value: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(value.len());
    let mut it = value.bytes();

    while let Some(b) = it.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }

        let hi = hex_digit(it.next()?)?;
        let lo = hex_digit(it.next()?)?;
        out.push((hi << 4) | lo);
    }

    Some(out)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(unix)]
fn bytes_to_path(bytes: Vec<u8>) -> PathBuf {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}
