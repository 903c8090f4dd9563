use std::env;
use std::fmt;

use super::ConnectError;

const ENV_STARTER_BUS: &str = "DBUS_STARTER_ADDRESS";
const ENV_SESSION_BUS: &str = "DBUS_SESSION_BUS_ADDRESS";
const ENV_SYSTEM_BUS: &str = "DBUS_SYSTEM_BUS_ADDRESS";
const ENV_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";
const DEFAULT_SYSTEM_BUS: &str = "unix:path=/var/run/dbus/system_bus_socket";

/// One of the well-known message buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BusKind {
    /// The per-login session bus.
    Session,
    /// The system-wide bus.
    System,
    /// The bus that started this process through activation.
    Starter,
}

impl BusKind {
    /// Resolve the address of the bus from the environment.
    ///
    /// * [`BusKind::Session`] uses `DBUS_SESSION_BUS_ADDRESS`, falling back
    ///   to `unix:path=$XDG_RUNTIME_DIR/bus`.
    /// * [`BusKind::System`] uses `DBUS_SYSTEM_BUS_ADDRESS`, falling back to
    ///   `unix:path=/var/run/dbus/system_bus_socket`.
    /// * [`BusKind::Starter`] uses `DBUS_STARTER_ADDRESS`.
    pub fn address(self) -> Result<String, ConnectError> {
        self.address_with(|key| env::var(key).ok().filter(|value| !value.is_empty()))
    }

    pub(crate) fn address_with<F>(self, mut var: F) -> Result<String, ConnectError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let address = match self {
            BusKind::Session => var(ENV_SESSION_BUS).or_else(|| {
                let dir = var(ENV_RUNTIME_DIR)?;
                Some(format!("unix:path={}/bus", dir.trim_end_matches('/')))
            }),
            BusKind::System => {
                Some(var(ENV_SYSTEM_BUS).unwrap_or_else(|| DEFAULT_SYSTEM_BUS.to_owned()))
            }
            BusKind::Starter => var(ENV_STARTER_BUS),
        };

        address.ok_or(ConnectError::MissingBus(self))
    }
}

impl fmt::Display for BusKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::Session => write!(f, "session"),
            BusKind::System => write!(f, "system"),
            BusKind::Starter => write!(f, "starter"),
        }
    }
}
