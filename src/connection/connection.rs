use std::io;
use std::time::Duration;

use tokio::io::unix::AsyncFd;
use tokio::io::{Interest, Ready};

use crate::error::{Error, ErrorKind, Result};
use crate::names;
use crate::org_freedesktop_dbus::{self, NameFlag, NameReply, ReleaseNameReply};
use crate::proto::{Endianness, MessageType};
use crate::sasl::{self, Auth, SaslResponse};
use crate::{Argument, DaemonError, MatchRule, Message, SendError};
use crate::{OwnedSignature, Serial, SerialAllocator};

use super::{Address, BusKind, ConnectError, ConnectionBuilder, RecvBuf, SendBuf, Transport};

/// The default time [`Connection::call`] waits for a reply.
pub(super) const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(25);

/// The state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectionState {
    /// The socket is connected but authentication has not completed.
    Open,
    /// Authentication has completed and messages can be exchanged.
    Authenticated,
    /// The connection has been closed.
    Closed,
}

/// An asynchronous D-Bus connection.
///
/// A connection is driven through `&mut self`. Messages are queued with
/// [`send`], written by [`flush`], and read into an inbound queue by
/// [`dispatch`] where they can be taken with [`pop_message`].
///
/// [`send`]: Connection::send
/// [`flush`]: Connection::flush
/// [`dispatch`]: Connection::dispatch
/// [`pop_message`]: Connection::pop_message
pub struct Connection {
    transport: Option<AsyncFd<Transport>>,
    state: ConnectionState,
    serials: SerialAllocator,
    send: SendBuf,
    recv: RecvBuf,
    unique_name: Option<Box<str>>,
    guid: Option<Box<str>>,
    call_timeout: Duration,
}

impl Connection {
    /// Open a connection to the bus at `address` using the default
    /// configuration.
    ///
    /// The address may hold several `;`-separated alternatives, which are
    /// tried in order.
    pub async fn open(address: &str) -> Result<Self> {
        ConnectionBuilder::new().address(address).build().await
    }

    /// Open a dedicated connection to the bus at `address`.
    ///
    /// Connections are never shared, so this is the same as
    /// [`Connection::open`].
    pub async fn open_private(address: &str) -> Result<Self> {
        Self::open(address).await
    }

    /// Open a connection to one of the well-known buses.
    pub async fn get(bus: BusKind) -> Result<Self> {
        ConnectionBuilder::new().bus(bus).build().await
    }

    /// Open a connection to the session bus.
    pub async fn session_bus() -> Result<Self> {
        Self::get(BusKind::Session).await
    }

    /// Open a connection to the system bus.
    pub async fn system_bus() -> Result<Self> {
        Self::get(BusKind::System).await
    }

    /// Connect and authenticate against the first reachable alternative in
    /// `addresses`.
    pub(super) async fn connect(
        addresses: &str,
        auth: Auth,
        hello: bool,
        call_timeout: Duration,
    ) -> Result<Self, ConnectError> {
        let transport = connect_any(addresses)?;
        transport.set_nonblocking(true).map_err(ConnectError::Unreachable)?;
        let transport = AsyncFd::new(transport).map_err(ConnectError::Unreachable)?;

        let mut this = Self {
            transport: Some(transport),
            state: ConnectionState::Open,
            serials: SerialAllocator::new(),
            send: SendBuf::new(),
            recv: RecvBuf::new(),
            unique_name: None,
            guid: None,
            call_timeout,
        };

        if let Err(error) = this.handshake(auth, hello).await {
            this.close();
            return Err(error.into_connect_error());
        }

        Ok(this)
    }

    async fn handshake(&mut self, auth: Auth, hello: bool) -> Result<()> {
        let command = sasl::auth_command(auth).ok_or(ConnectError::UnsupportedAuthUid)?;

        tracing::debug!(mechanism = %auth, "Authenticating");

        self.send.extend_from_slice(b"\0")?;
        self.send.extend_from_slice(command.as_bytes())?;

        let line = loop {
            if let Some(line) = self.recv.take_line() {
                break line;
            }

            self.io().await?;
        };

        match SaslResponse::parse(&line) {
            Some(SaslResponse::Ok(guid)) => {
                tracing::debug!(guid, "Authenticated");
                self.guid = Some(guid.into());
            }
            Some(SaslResponse::Rejected(mechanisms)) | Some(SaslResponse::Error(mechanisms)) => {
                return Err(ConnectError::AuthRejected(mechanisms.into()).into());
            }
            _ => {
                return Err(ConnectError::InvalidSaslResponse.into());
            }
        }

        self.send.extend_from_slice(b"BEGIN\r\n")?;
        self.state = ConnectionState::Authenticated;

        if hello {
            let mut m = org_freedesktop_dbus::hello()?;

            let reply = match self.call(&mut m).await {
                Ok(reply) => reply,
                Err(error) => match error.into_kind() {
                    ErrorKind::Daemon(error) => {
                        return Err(ConnectError::Registration(error).into())
                    }
                    kind => return Err(Error::new(kind)),
                },
            };

            let name = match reply.arguments() {
                [Argument::String(name)] => name.as_str(),
                _ => return Err(unexpected_reply("s", &reply)),
            };

            tracing::debug!(unique_name = name, "Registered with bus");
            self.unique_name = Some(name.into());
        } else {
            self.flush().await?;
        }

        Ok(())
    }

    /// The state of the connection.
    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The unique name assigned by the bus in response to `Hello`.
    #[inline]
    pub fn unique_name(&self) -> Option<&str> {
        self.unique_name.as_deref()
    }

    /// The GUID the server sent during authentication.
    #[inline]
    pub fn server_guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// The default time [`Connection::call`] waits for a reply.
    #[inline]
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Seal `message` with a fresh serial and queue it for sending.
    ///
    /// The message is fully encoded before anything is queued, so a failure
    /// leaves the outbound queue untouched. The bytes are written by
    /// [`Connection::flush`] or any other operation which performs I/O.
    ///
    /// # Errors
    ///
    /// Errors with [`SendError::NotConnected`] if the connection is closed,
    /// with a sealed error if the message has already been sent, and with
    /// [`SendError::OutOfMemory`] if the outbound queue cannot grow.
    pub fn send(&mut self, message: &mut Message) -> Result<Serial> {
        if self.transport.is_none() {
            return Err(SendError::NotConnected.into());
        }

        if message.is_sealed() {
            return Err(ErrorKind::MessageSealed.into());
        }

        let serial = self.serials.next();
        let bytes = message.encode_as(serial, Endianness::NATIVE)?;
        self.send.extend_from_slice(&bytes)?;
        message.seal(serial)?;

        tracing::trace!(
            %serial,
            message_type = ?message.message_type(),
            member = message.member(),
            destination = message.destination(),
            "Queued message"
        );

        Ok(serial)
    }

    /// Wait until every queued byte has been written.
    pub async fn flush(&mut self) -> Result<()> {
        if self.transport.is_none() {
            return Err(SendError::NotConnected.into());
        }

        while !self.send.is_empty() {
            self.io().await?;
        }

        Ok(())
    }

    /// Take the oldest message out of the inbound queue without waiting.
    ///
    /// Messages which were already received can still be taken after the
    /// remote side has hung up.
    pub fn pop_message(&mut self) -> Result<Option<Message>> {
        if let Some(message) = self.recv.pop() {
            return Ok(Some(message));
        }

        if self.transport.is_none() {
            return Err(SendError::NotConnected.into());
        }

        Ok(None)
    }

    /// Wait until at least one new message has been received onto the
    /// inbound queue, writing pending output meanwhile.
    ///
    /// This is cancellation safe. Partially received messages are retained
    /// until the next call.
    pub async fn dispatch(&mut self) -> Result<()> {
        loop {
            if self.process_incoming()? > 0 {
                return Ok(());
            }

            self.io().await?;
        }
    }

    /// Wait for the next message, dispatching as needed.
    pub async fn recv_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = self.recv.pop() {
                return Ok(message);
            }

            self.dispatch().await?;
        }
    }

    /// Send `message` and wait for its reply using the default call timeout.
    pub async fn call(&mut self, message: &mut Message) -> Result<Message> {
        let timeout = self.call_timeout;
        self.call_and_wait(message, timeout).await
    }

    /// Send `message` and wait up to `timeout` for its reply.
    ///
    /// Messages which arrive in the meantime stay queued in order. An error
    /// reply is returned as a [`DaemonError`].
    pub async fn call_and_wait(
        &mut self,
        message: &mut Message,
        timeout: Duration,
    ) -> Result<Message> {
        let serial = self.send(message)?;

        let reply = match tokio::time::timeout(timeout, self.wait_for_reply(serial)).await {
            Ok(reply) => reply?,
            Err(..) => {
                tracing::debug!(%serial, ?timeout, "Timed out waiting for reply");
                return Err(ErrorKind::Timeout(serial).into());
            }
        };

        if reply.message_type() == MessageType::ERROR {
            return match DaemonError::from_message(&reply) {
                Some(error) => Err(error.into()),
                None => Err(unexpected_reply("", &reply)),
            };
        }

        Ok(reply)
    }

    async fn wait_for_reply(&mut self, serial: Serial) -> Result<Message> {
        loop {
            self.process_incoming()?;

            if let Some(reply) = self.recv.take_reply(serial) {
                return Ok(reply);
            }

            self.io().await?;
        }
    }

    /// Request ownership of a well-known name.
    ///
    /// The name is validated before anything is sent.
    pub async fn request_name(&mut self, name: &str, flags: NameFlag) -> Result<NameReply> {
        names::validate_well_known_name(name)?;
        let mut m = org_freedesktop_dbus::request_name(name, flags)?;
        let reply = self.call(&mut m).await?;
        let value = single_u32(&reply)?;
        let reply = NameReply::new(value);

        if !reply.is_known() {
            return Err(unknown_reply_value("RequestName", value));
        }

        Ok(reply)
    }

    /// Release ownership of a well-known name.
    pub async fn release_name(&mut self, name: &str) -> Result<ReleaseNameReply> {
        names::validate_well_known_name(name)?;
        let mut m = org_freedesktop_dbus::release_name(name)?;
        let reply = self.call(&mut m).await?;
        let value = single_u32(&reply)?;
        let reply = ReleaseNameReply::new(value);

        if !reply.is_known() {
            return Err(unknown_reply_value("ReleaseName", value));
        }

        Ok(reply)
    }

    /// Test if `name` currently has an owner on the bus.
    pub async fn name_has_owner(&mut self, name: &str) -> Result<bool> {
        names::validate_bus_name(name)?;
        let mut m = org_freedesktop_dbus::name_has_owner(name)?;
        let reply = self.call(&mut m).await?;

        match reply.arguments() {
            [Argument::Boolean(value)] => Ok(*value),
            _ => Err(unexpected_reply("b", &reply)),
        }
    }

    /// Ask the bus to route messages matching `rule` to this connection.
    pub async fn add_match(&mut self, rule: &MatchRule) -> Result<()> {
        let mut m = org_freedesktop_dbus::add_match(rule)?;
        self.call(&mut m).await?;
        Ok(())
    }

    /// Remove a rule previously installed with [`Connection::add_match`].
    pub async fn remove_match(&mut self, rule: &MatchRule) -> Result<()> {
        let mut m = org_freedesktop_dbus::remove_match(rule)?;
        self.call(&mut m).await?;
        Ok(())
    }

    /// Close the connection.
    ///
    /// This is idempotent. Every later operation fails with
    /// [`SendError::NotConnected`].
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            let transport = transport.into_inner();

            if let Err(error) = transport.shutdown() {
                tracing::trace!(%error, "Shutting down transport failed");
            }

            tracing::debug!("Connection closed");
        }

        self.state = ConnectionState::Closed;
        self.send.clear();
        self.recv.clear();
    }

    /// Drop the transport after the remote side hung up or misbehaved, keeping
    /// messages which were already received.
    fn disconnect(&mut self) {
        self.transport = None;
        self.state = ConnectionState::Closed;
        self.send.clear();
    }

    /// Decode complete messages sitting in the receive buffer.
    fn process_incoming(&mut self) -> Result<usize> {
        if self.state != ConnectionState::Authenticated {
            return Err(SendError::NotConnected.into());
        }

        match self.recv.decode_frames() {
            Ok(n) => Ok(n),
            Err(error) => {
                tracing::warn!(%error, "Dropping connection after malformed message");
                self.disconnect();
                Err(error.into())
            }
        }
    }

    /// Perform one round of I/O, writing queued bytes and reading whatever is
    /// available.
    async fn io(&mut self) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(SendError::NotConnected.into());
        };

        let mut interest = Interest::READABLE;

        if !self.send.is_empty() {
            interest |= Interest::WRITABLE;
        }

        let mut guard = transport.ready_mut(interest).await?;

        let result = loop {
            if guard.ready().is_writable() && !self.send.is_empty() {
                let remaining = self.send.remaining();

                match self.send.send_to(guard.get_inner_mut()) {
                    Ok(()) => {
                        tracing::trace!(bytes = remaining, "Sent");
                    }
                    Err(error) => {
                        let error = Error::from(error);

                        if error.would_block() {
                            guard.clear_ready_matching(Ready::WRITABLE);
                            continue;
                        }

                        break Err(error);
                    }
                }

                continue;
            }

            if guard.ready().is_readable() {
                match self.recv.recv_from(guard.get_inner_mut()) {
                    Ok(0) => break Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
                    Ok(n) => {
                        tracing::trace!(bytes = n, "Received");
                        break Ok(());
                    }
                    Err(error) => {
                        let error = Error::from(error);

                        if error.would_block() {
                            guard.clear_ready_matching(Ready::READABLE);
                            continue;
                        }

                        break Err(error);
                    }
                }
            }

            break Ok(());
        };

        drop(guard);

        match result {
            Ok(()) => Ok(()),
            Err(error) if error.is_hang_up() => {
                tracing::debug!(%error, "Remote side hung up");
                self.disconnect();
                Err(SendError::NotConnected.into())
            }
            Err(error) => Err(error),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn connect_any(addresses: &str) -> Result<Transport, ConnectError> {
    let mut last = None;

    for address in Address::parse_all(addresses) {
        let address = match address {
            Ok(address) => address,
            Err(error) => {
                tracing::debug!(%error, "Skipping address");
                last = Some(error);
                continue;
            }
        };

        tracing::debug!(?address, "Connecting");

        match Transport::connect(&address) {
            Ok(transport) => return Ok(transport),
            Err(error) => {
                tracing::debug!(?address, %error, "Connection failed");
                last = Some(ConnectError::Unreachable(error));
            }
        }
    }

    Err(last.unwrap_or_else(|| ConnectError::MalformedAddress(addresses.into())))
}

fn single_u32(reply: &Message) -> Result<u32> {
    match reply.arguments() {
        [Argument::Uint32(value)] => Ok(*value),
        _ => Err(unexpected_reply("u", reply)),
    }
}

fn unexpected_reply(expected: &'static str, reply: &Message) -> Error {
    Error::new(ErrorKind::UnexpectedReply {
        expected,
        actual: OwnedSignature::from(reply.signature()),
    })
}

fn unknown_reply_value(member: &'static str, value: u32) -> Error {
    Error::new(ErrorKind::UnknownReplyValue { member, value })
}
