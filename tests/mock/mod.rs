//! An in-process bus daemon speaking just enough of the protocol to exercise
//! a connection end to end.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, watch};
use tokio_dbus_engine::message::frame_length;
use tokio_dbus_engine::org_freedesktop_dbus::{
    NameFlag, NameReply, ReleaseNameReply, DESTINATION, ERROR_SERVICE_UNKNOWN,
    ERROR_UNKNOWN_METHOD, INTERFACE, PATH,
};
use tokio_dbus_engine::{Argument, DaemonError, MatchRule, Message, MessageKind, SerialAllocator};

pub const GUID: &str = "0123456789abcdef0123456789abcdef";
pub const ERROR_ACCESS_DENIED: &str = "org.freedesktop.DBus.Error.AccessDenied";

/// Behavior switches of the mock bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Reject every authentication attempt.
    pub reject_auth: bool,
    /// Answer `Hello` with an error.
    pub fail_hello: bool,
    /// Answer `RequestName` and `ReleaseName` with an undefined reply code.
    pub unknown_name_replies: bool,
}

pub struct MockBus {
    path: PathBuf,
    shutdown: watch::Sender<bool>,
}

impl MockBus {
    pub async fn start() -> Result<Self> {
        Self::with_options(Options::default()).await
    }

    pub async fn with_options(options: Options) -> Result<Self> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let path = std::env::temp_dir().join(format!(
            "tokio-dbus-engine-{}-{}.sock",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).context("binding mock bus")?;
        let (shutdown, rx) = watch::channel(false);

        let bus = Arc::new(Bus {
            options,
            state: Mutex::new(State::default()),
            serials: SerialAllocator::new(),
        });

        tokio::spawn(accept(listener, bus, rx));
        Ok(Self { path, shutdown })
    }

    /// The address to connect to.
    pub fn address(&self) -> String {
        format!("unix:path={}", self.path.display())
    }

    /// Disconnect every client and stop accepting new ones.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for MockBus {
    fn drop(&mut self) {
        self.shutdown();
        let _ = std::fs::remove_file(&self.path);
    }
}

struct Owner {
    unique: String,
    allow_replacement: bool,
    do_not_queue: bool,
}

#[derive(Default)]
struct State {
    next_id: u32,
    clients: HashMap<String, mpsc::UnboundedSender<Message>>,
    /// Each name maps to its queue of owners, with the primary owner first.
    names: HashMap<String, VecDeque<Owner>>,
    matches: Vec<(String, MatchRule)>,
}

impl State {
    fn resolve(&self, name: &str) -> Option<(&str, &mpsc::UnboundedSender<Message>)> {
        let unique = if name.starts_with(':') {
            name
        } else {
            self.names.get(name)?.front()?.unique.as_str()
        };

        let (unique, tx) = self.clients.get_key_value(unique)?;
        Some((unique.as_str(), tx))
    }
}

struct Bus {
    options: Options,
    state: Mutex<State>,
    serials: SerialAllocator,
}

async fn accept(listener: UnixListener, bus: Arc<Bus>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                let Ok((stream, _)) = result else {
                    return;
                };

                let bus = bus.clone();
                let shutdown = shutdown.clone();

                tokio::spawn(async move {
                    let _ = client(stream, bus, shutdown).await;
                });
            }
            _ = shutdown.changed() => return,
        }
    }
}

async fn read_line(stream: &mut BufReader<UnixStream>) -> Result<String> {
    let mut line = Vec::new();
    stream.read_until(b'\n', &mut line).await?;

    let Some(line) = line.strip_suffix(b"\r\n") else {
        bail!("unterminated SASL line");
    };

    Ok(String::from_utf8(line.to_vec())?)
}

async fn client(stream: UnixStream, bus: Arc<Bus>, shutdown: watch::Receiver<bool>) -> Result<()> {
    let mut stream = BufReader::new(stream);

    let mut nul = [0u8; 1];
    stream.read_exact(&mut nul).await?;

    if nul[0] != 0 {
        bail!("expected leading nul byte");
    }

    let auth = read_line(&mut stream).await?;

    if !auth.starts_with("AUTH ") {
        bail!("expected AUTH, got {auth:?}");
    }

    if bus.options.reject_auth {
        stream
            .get_mut()
            .write_all(b"REJECTED EXTERNAL ANONYMOUS\r\n")
            .await?;
        return Ok(());
    }

    stream
        .get_mut()
        .write_all(format!("OK {GUID}\r\n").as_bytes())
        .await?;

    let begin = read_line(&mut stream).await?;

    if begin != "BEGIN" {
        bail!("expected BEGIN, got {begin:?}");
    }

    let (tx, rx) = mpsc::unbounded_channel();

    let mut conn = Client {
        bus,
        unique: None,
        tx,
    };

    let result = conn.run(&mut stream, rx, shutdown).await;
    conn.disconnect();
    result
}

struct Client {
    bus: Arc<Bus>,
    unique: Option<String>,
    tx: mpsc::UnboundedSender<Message>,
}

impl Client {
    async fn run(
        &mut self,
        stream: &mut BufReader<UnixStream>,
        mut rx: mpsc::UnboundedReceiver<Message>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut buf = Vec::new();

        loop {
            while let Some(total) = frame_length(&buf)? {
                if buf.len() < total {
                    break;
                }

                let message = Message::decode(&buf[..total])?;
                buf.drain(..total);

                for reply in self.handle(&message)? {
                    stream.get_mut().write_all(&reply.encode()?).await?;
                }
            }

            tokio::select! {
                n = stream.read_buf(&mut buf) => {
                    if n? == 0 {
                        return Ok(());
                    }
                }
                Some(message) = rx.recv() => {
                    stream.get_mut().write_all(&message.encode()?).await?;
                }
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }

    fn disconnect(&mut self) {
        let Some(unique) = self.unique.take() else {
            return;
        };

        let mut state = self.bus.state.lock().unwrap();
        state.clients.remove(&unique);
        state.matches.retain(|(owner, _)| *owner != unique);

        let mut acquired = Vec::new();

        state.names.retain(|name, queue| {
            let was_primary = queue.front().map_or(false, |o| o.unique == unique);
            queue.retain(|o| o.unique != unique);

            if let (true, Some(next)) = (was_primary, queue.front()) {
                acquired.push((next.unique.clone(), name.clone()));
            }

            !queue.is_empty()
        });

        for (next, name) in acquired {
            let _ = self.notify(&state, &next, "NameAcquired", &name);
        }
    }

    fn handle(&mut self, m: &Message) -> Result<Vec<Message>> {
        match m.kind() {
            MessageKind::MethodCall { .. } if m.destination() == Some(DESTINATION) => {
                Ok(vec![self.bus_call(m)?])
            }
            MessageKind::MethodCall { .. } => self.route_call(m),
            MessageKind::Signal { .. } => {
                self.broadcast(m)?;
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }

    fn bus_call(&mut self, m: &Message) -> Result<Message> {
        let member = m.member().unwrap_or_default();

        if member != "Hello" && self.unique.is_none() {
            return self.error(m, ERROR_ACCESS_DENIED, "Client is not registered");
        }

        match (member, m.arguments()) {
            ("Hello", []) => {
                if self.bus.options.fail_hello {
                    return self.error(m, ERROR_ACCESS_DENIED, "Hello is not allowed");
                }

                if self.unique.is_some() {
                    let name = "org.freedesktop.DBus.Error.Failed";
                    return self.error(m, name, "Already handled an Hello message");
                }

                let unique = {
                    let mut state = self.bus.state.lock().unwrap();
                    state.next_id += 1;
                    let unique = format!(":1.{}", state.next_id);
                    state.clients.insert(unique.clone(), self.tx.clone());
                    // Queued behind the reply, which is written first.
                    self.notify(&state, &unique, "NameAcquired", &unique)?;
                    unique
                };

                self.unique = Some(unique.clone());
                self.reply(m, [Argument::from(unique)])
            }
            ("RequestName" | "ReleaseName", _) if self.bus.options.unknown_name_replies => {
                self.reply(m, [Argument::from(7u32)])
            }
            ("RequestName", [Argument::String(name), Argument::Uint32(flags)]) => {
                let flags = NameFlag::from_bits(*flags);
                let reply = self.request_name(name, flags)?;
                self.reply(m, [Argument::from(reply.get())])
            }
            ("ReleaseName", [Argument::String(name)]) => {
                let reply = self.release_name(name)?;
                self.reply(m, [Argument::from(reply.get())])
            }
            ("NameHasOwner", [Argument::String(name)]) => {
                let has_owner = self.bus.state.lock().unwrap().resolve(name).is_some();
                self.reply(m, [Argument::from(has_owner)])
            }
            ("AddMatch", [Argument::String(rule)]) => match rule.parse::<MatchRule>() {
                Ok(rule) => {
                    let unique = self.unique.clone().unwrap_or_default();
                    self.bus.state.lock().unwrap().matches.push((unique, rule));
                    self.reply(m, [])
                }
                Err(error) => self.error(
                    m,
                    "org.freedesktop.DBus.Error.MatchRuleInvalid",
                    &error.to_string(),
                ),
            },
            ("RemoveMatch", [Argument::String(rule)]) => {
                let removed = match rule.parse::<MatchRule>() {
                    Ok(rule) => {
                        let unique = self.unique.as_deref().unwrap_or_default();
                        let mut state = self.bus.state.lock().unwrap();
                        let index = state
                            .matches
                            .iter()
                            .position(|(owner, r)| owner == unique && *r == rule);
                        index.map(|index| state.matches.remove(index)).is_some()
                    }
                    Err(..) => false,
                };

                if removed {
                    self.reply(m, [])
                } else {
                    let name = "org.freedesktop.DBus.Error.MatchRuleNotFound";
                    self.error(m, name, "The given match rule wasn't found")
                }
            }
            ("ExhaustMemory", []) => self.error(m, DaemonError::NO_MEMORY, "Out of memory"),
            _ => self.error(
                m,
                ERROR_UNKNOWN_METHOD,
                &format!("Unknown method {member} with signature \"{}\"", m.signature()),
            ),
        }
    }

    fn request_name(&self, name: &str, flags: NameFlag) -> Result<NameReply> {
        let unique = self.unique.clone().unwrap_or_default();
        let mut state = self.bus.state.lock().unwrap();

        let owner = Owner {
            unique: unique.clone(),
            allow_replacement: flags & NameFlag::ALLOW_REPLACEMENT,
            do_not_queue: flags & NameFlag::DO_NOT_QUEUE,
        };

        let queue = state.names.entry(name.to_owned()).or_default();
        let mut lost = None;

        let current = queue
            .front()
            .map(|primary| (primary.unique == unique, primary.allow_replacement));

        let reply = match current {
            None => {
                queue.push_back(owner);
                NameReply::PRIMARY_OWNER
            }
            Some((true, _)) => {
                queue[0] = owner;
                NameReply::ALREADY_OWNER
            }
            Some((false, true)) if flags & NameFlag::REPLACE_EXISTING => {
                queue.retain(|o| o.unique != unique);

                if let Some(previous) = queue.pop_front() {
                    lost = Some(previous.unique.clone());

                    if !previous.do_not_queue {
                        queue.push_front(previous);
                    }
                }

                queue.push_front(owner);
                NameReply::PRIMARY_OWNER
            }
            Some(..) if flags & NameFlag::DO_NOT_QUEUE => {
                queue.retain(|o| o.unique != unique);
                NameReply::EXISTS
            }
            Some(..) => {
                match queue.iter_mut().find(|o| o.unique == unique) {
                    Some(queued) => *queued = owner,
                    None => queue.push_back(owner),
                }

                NameReply::IN_QUEUE
            }
        };

        if let Some(lost) = lost {
            self.notify(&state, &lost, "NameLost", name)?;
        }

        if reply == NameReply::PRIMARY_OWNER {
            self.notify(&state, &unique, "NameAcquired", name)?;
        }

        Ok(reply)
    }

    fn release_name(&self, name: &str) -> Result<ReleaseNameReply> {
        let unique = self.unique.clone().unwrap_or_default();
        let mut state = self.bus.state.lock().unwrap();

        let Some(queue) = state.names.get_mut(name) else {
            return Ok(ReleaseNameReply::NON_EXISTENT);
        };

        let Some(index) = queue.iter().position(|o| o.unique == unique) else {
            return Ok(ReleaseNameReply::NOT_OWNER);
        };

        queue.remove(index);

        let next = match index {
            0 => queue.front().map(|o| o.unique.clone()),
            _ => None,
        };

        if queue.is_empty() {
            state.names.remove(name);
        }

        if index == 0 {
            self.notify(&state, &unique, "NameLost", name)?;
        }

        if let Some(next) = next {
            self.notify(&state, &next, "NameAcquired", name)?;
        }

        Ok(ReleaseNameReply::RELEASED)
    }

    /// Send one of the bus signals carrying a single name to `unique`.
    fn notify(&self, state: &State, unique: &str, member: &str, name: &str) -> Result<()> {
        let Some(tx) = state.clients.get(unique) else {
            return Ok(());
        };

        let mut signal = Message::new_signal(PATH, INTERFACE, member)?;
        signal.append_argument(name)?;
        signal.set_destination(Some(unique))?;
        signal.set_sender(Some(DESTINATION))?;
        signal.seal(self.bus.serials.next())?;

        let _ = tx.send(signal);
        Ok(())
    }

    fn route_call(&mut self, m: &Message) -> Result<Vec<Message>> {
        let Some(destination) = m.destination() else {
            return Ok(Vec::new());
        };

        let forwarded = self.restamp(m)?;

        {
            let state = self.bus.state.lock().unwrap();

            if let Some((_, tx)) = state.resolve(destination) {
                let _ = tx.send(forwarded);
                return Ok(Vec::new());
            }
        }

        let text = format!("The name {destination} was not provided by any .service files");
        Ok(vec![self.error(m, ERROR_SERVICE_UNKNOWN, &text)?])
    }

    fn broadcast(&mut self, m: &Message) -> Result<()> {
        let signal = self.restamp(m)?;
        let state = self.bus.state.lock().unwrap();
        let mut sent = HashSet::new();

        for (unique, rule) in &state.matches {
            if rule.matches(&signal) && sent.insert(unique.as_str()) {
                if let Some(tx) = state.clients.get(unique) {
                    let _ = tx.send(signal.clone());
                }
            }
        }

        if let Some((unique, tx)) = signal.destination().and_then(|d| state.resolve(d)) {
            if sent.insert(unique) {
                let _ = tx.send(signal.clone());
            }
        }

        Ok(())
    }

    /// Rebuild a message with the sender set to this client, keeping its
    /// serial.
    fn restamp(&self, m: &Message) -> Result<Message> {
        let path = m.path().context("missing path")?.as_str();
        let interface = m.interface().context("missing interface")?;
        let member = m.member().context("missing member")?;

        let mut out = match m.kind() {
            MessageKind::Signal { .. } => Message::new_signal(path, interface, member)?,
            _ => Message::new_method_call(
                m.destination().context("missing destination")?,
                path,
                interface,
                member,
            )?,
        };

        for argument in m.arguments() {
            out.append_argument(argument.clone())?;
        }

        out.set_destination(m.destination())?;
        out.set_sender(self.unique.as_deref())?;
        out.set_flags(m.flags())?;
        out.seal(m.serial().context("missing serial")?)?;
        Ok(out)
    }

    fn reply<const N: usize>(&self, m: &Message, arguments: [Argument; N]) -> Result<Message> {
        let mut reply = Message::new_method_return(m)?;

        for argument in arguments {
            reply.append_argument(argument)?;
        }

        self.stamp(reply)
    }

    fn error(&self, m: &Message, name: &str, text: &str) -> Result<Message> {
        self.stamp(Message::new_error(m, name, text)?)
    }

    fn stamp(&self, mut reply: Message) -> Result<Message> {
        reply.set_destination(self.unique.as_deref())?;
        reply.set_sender(Some(DESTINATION))?;
        reply.seal(self.bus.serials.next())?;
        Ok(reply)
    }
}
