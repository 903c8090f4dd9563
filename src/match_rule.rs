#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use crate::proto::MessageType;
use crate::Message;

/// A rule selecting which messages the bus routes to a connection.
///
/// Rules are installed with [`Connection::add_match`] and rendered in the
/// `key='value',...` form the bus expects.
///
/// [`Connection::add_match`]: crate::Connection::add_match
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::MatchRule;
/// use tokio_dbus_engine::proto::MessageType;
///
/// let rule = MatchRule::new()
///     .with_message_type(MessageType::SIGNAL)?
///     .with_interface("org.test.Demo")
///     .with_member("Ping");
///
/// assert_eq!(
///     rule.to_string(),
///     "type='signal',interface='org.test.Demo',member='Ping'"
/// );
/// # Ok::<_, tokio_dbus_engine::MatchRuleError>(())
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MatchRule {
    // Always one of the types with a name in the rule syntax.
    message_type: Option<MessageType>,
    sender: Option<Box<str>>,
    interface: Option<Box<str>>,
    member: Option<Box<str>>,
    path: Option<Box<str>>,
    destination: Option<Box<str>>,
}

impl MatchRule {
    /// Construct a rule which matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a rule matching the given signal.
    pub fn signal(interface: &str, member: &str) -> Self {
        let mut rule = Self::new().with_interface(interface).with_member(member);
        rule.message_type = Some(MessageType::SIGNAL);
        rule
    }

    /// Only match messages of the given type.
    ///
    /// Fails for [`MessageType::INVALID`] and unknown type codes, which the
    /// rule syntax cannot express.
    pub fn with_message_type(
        mut self,
        message_type: MessageType,
    ) -> Result<Self, MatchRuleError> {
        if type_name(message_type).is_none() {
            return Err(MatchRuleError {
                rule: format!("type={message_type:?}").into(),
            });
        }

        self.message_type = Some(message_type);
        Ok(self)
    }

    /// Only match messages sent by `sender`.
    pub fn with_sender(mut self, sender: &str) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Only match messages with the given interface.
    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Only match messages with the given member.
    pub fn with_member(mut self, member: &str) -> Self {
        self.member = Some(member.into());
        self
    }

    /// Only match messages with the given object path.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Only match messages addressed to `destination`.
    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Test if a received message matches the rule.
    ///
    /// Only the type, interface, member and path are compared. Sender and
    /// destination are enforced by the bus, which knows every name a
    /// connection owns.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::{MatchRule, Message};
    ///
    /// let rule = MatchRule::signal("org.test.Demo", "Ping");
    ///
    /// let ping = Message::new_signal("/", "org.test.Demo", "Ping")?;
    /// let pong = Message::new_signal("/", "org.test.Demo", "Pong")?;
    ///
    /// assert!(rule.matches(&ping));
    /// assert!(!rule.matches(&pong));
    /// # Ok::<_, tokio_dbus_engine::Error>(())
    /// ```
    pub fn matches(&self, message: &Message) -> bool {
        if let Some(message_type) = self.message_type {
            if message.message_type() != message_type {
                return false;
            }
        }

        if self.interface.is_some() && self.interface.as_deref() != message.interface() {
            return false;
        }

        if self.member.is_some() && self.member.as_deref() != message.member() {
            return false;
        }

        if let Some(path) = &self.path {
            if message.path().map(|p| p.as_str()) != Some(&**path) {
                return false;
            }
        }

        true
    }
}

fn type_name(message_type: MessageType) -> Option<&'static str> {
    match message_type {
        MessageType::SIGNAL => Some("signal"),
        MessageType::METHOD_CALL => Some("method_call"),
        MessageType::METHOD_RETURN => Some("method_return"),
        MessageType::ERROR => Some("error"),
        _ => None,
    }
}

fn type_from_name(name: &str) -> Option<MessageType> {
    match name {
        "signal" => Some(MessageType::SIGNAL),
        "method_call" => Some(MessageType::METHOD_CALL),
        "method_return" => Some(MessageType::METHOD_RETURN),
        "error" => Some(MessageType::ERROR),
        _ => None,
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        let mut entry = |f: &mut fmt::Formatter<'_>, key: &str, value: &str| {
            if !first {
                f.write_str(",")?;
            }

            first = false;
            write!(f, "{key}='")?;

            for (n, part) in value.split('\'').enumerate() {
                if n > 0 {
                    f.write_str("'\\''")?;
                }

                f.write_str(part)?;
            }

            f.write_str("'")
        };

        if let Some(name) = self.message_type.and_then(type_name) {
            entry(&mut *f, "type", name)?;
        }

        let fields = [
            ("sender", &self.sender),
            ("interface", &self.interface),
            ("member", &self.member),
            ("path", &self.path),
            ("destination", &self.destination),
        ];

        for (key, value) in fields {
            if let Some(value) = value {
                entry(&mut *f, key, value)?;
            }
        }

        Ok(())
    }
}

/// Error raised when parsing a [`MatchRule`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRuleError {
    rule: Box<str>,
}

impl fmt::Display for MatchRuleError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid match rule `{}`", self.rule)
    }
}

impl std::error::Error for MatchRuleError {}

impl FromStr for MatchRule {
    type Err = MatchRuleError;

    /// Parse a rule in the `key='value',...` form.
    ///
    /// Quoted text is taken literally, and outside of quotes `\'` stands for
    /// an apostrophe. Values may also be left unquoted.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::MatchRule;
    ///
    /// let rule: MatchRule = "type='signal',member='Ping'".parse()?;
    /// assert_eq!(rule, MatchRule::new()
    ///     .with_message_type(tokio_dbus_engine::proto::MessageType::SIGNAL)?
    ///     .with_member("Ping"));
    ///
    /// assert!("bogus='x'".parse::<MatchRule>().is_err());
    /// # Ok::<_, tokio_dbus_engine::MatchRuleError>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || MatchRuleError { rule: s.into() };

        let mut rule = MatchRule::new();
        let mut rest = s;

        while !rest.is_empty() {
            let (key, tail) = rest.split_once('=').ok_or_else(error)?;
            let (value, tail) = unquote(tail).ok_or_else(error)?;

            match key.trim() {
                "type" => rule.message_type = Some(type_from_name(&value).ok_or_else(error)?),
                "sender" => rule.sender = Some(value.into()),
                "interface" => rule.interface = Some(value.into()),
                "member" => rule.member = Some(value.into()),
                "path" => rule.path = Some(value.into()),
                "destination" => rule.destination = Some(value.into()),
                _ => return Err(error()),
            }

            rest = tail.strip_prefix(',').unwrap_or(tail);
        }

        Ok(rule)
    }
}

/// Read a value up to the next unquoted `,`, returning it with quoting
/// removed along with the unread input.
fn unquote(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut quoted = false;
    let mut chars = input.char_indices();

    while let Some((n, c)) = chars.next() {
        match c {
            '\'' => quoted = !quoted,
            ',' if !quoted => return Some((value, &input[n..])),
            '\\' if !quoted && input[n + 1..].starts_with('\'') => {
                value.push('\'');
                chars.next();
            }
            c => value.push(c),
        }
    }

    if quoted {
        return None;
    }

    Some((value, ""))
}
