use std::time::Duration;

use crate::error::Result;
use crate::sasl::Auth;

use super::connection::DEFAULT_CALL_TIMEOUT;
use super::{BusKind, Connection};

#[derive(Debug, Clone)]
enum Target {
    Bus(BusKind),
    Address(Box<str>),
}

/// Builder of a [`Connection`].
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    target: Target,
    auth: Auth,
    hello: bool,
    call_timeout: Duration,
}

impl ConnectionBuilder {
    /// Construct a new [`ConnectionBuilder`] with the default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::ConnectionBuilder;
    ///
    /// let c = ConnectionBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            target: Target::Bus(BusKind::Session),
            auth: Auth::default(),
            hello: true,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Connect to the session bus (default).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tokio_dbus_engine::ConnectionBuilder;
    ///
    /// # #[tokio::main] async fn main() -> tokio_dbus_engine::Result<()> {
    /// let c = ConnectionBuilder::new().session_bus().build().await?;
    /// # Ok(()) }
    /// ```
    pub fn session_bus(&mut self) -> &mut Self {
        self.bus(BusKind::Session)
    }

    /// Connect to the system bus.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tokio_dbus_engine::ConnectionBuilder;
    ///
    /// # #[tokio::main] async fn main() -> tokio_dbus_engine::Result<()> {
    /// let c = ConnectionBuilder::new().system_bus().build().await?;
    /// # Ok(()) }
    /// ```
    pub fn system_bus(&mut self) -> &mut Self {
        self.bus(BusKind::System)
    }

    /// Connect to the bus which activated this process.
    pub fn starter_bus(&mut self) -> &mut Self {
        self.bus(BusKind::Starter)
    }

    /// Connect to one of the well-known buses, resolving its address from the
    /// environment when the connection is built.
    pub fn bus(&mut self, bus: BusKind) -> &mut Self {
        self.target = Target::Bus(bus);
        self
    }

    /// Connect to an explicit address such as `unix:path=/tmp/bus`.
    pub fn address(&mut self, address: &str) -> &mut Self {
        self.target = Target::Address(address.into());
        self
    }

    /// Set the authentication mechanism.
    ///
    /// Defaults to `EXTERNAL` if the `libc` feature is enabled, and
    /// `ANONYMOUS` otherwise.
    pub fn auth(&mut self, auth: Auth) -> &mut Self {
        self.auth = auth;
        self
    }

    /// Skip registering with the bus through `Hello`.
    ///
    /// This is only useful when talking to a peer directly rather than
    /// through a bus daemon.
    pub fn no_hello(&mut self) -> &mut Self {
        self.hello = false;
        self
    }

    /// Set how long [`Connection::call`] waits for a reply.
    pub fn call_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.call_timeout = timeout;
        self
    }

    /// Construct and connect a [`Connection`] with the current configuration.
    pub async fn build(&self) -> Result<Connection> {
        let address = match &self.target {
            Target::Bus(bus) => bus.address()?,
            Target::Address(address) => address.to_string(),
        };

        let connection =
            Connection::connect(&address, self.auth, self.hello, self.call_timeout).await?;
        Ok(connection)
    }
}

impl Default for ConnectionBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
