use anyhow::{bail, Context, Result};
use tokio_dbus_engine::org_freedesktop_dbus::{NameFlag, NameReply};
use tokio_dbus_engine::{Connection, Message, MessageKind};
use tracing_subscriber::EnvFilter;

const NAME: &str = "org.test.Demo";
const INTERFACE: &str = "org.test.Demo";
const PATH: &str = "/org/test/Demo";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut c = Connection::session_bus().await?;

    let reply = c.request_name(NAME, NameFlag::DO_NOT_QUEUE).await?;

    if reply != NameReply::PRIMARY_OWNER {
        bail!("Could not acquire name: {reply:?}");
    }

    tracing::info!(name = NAME, unique_name = c.unique_name(), "Serving");

    loop {
        let message = c.recv_message().await?;

        let MessageKind::MethodCall { .. } = message.kind() else {
            continue;
        };

        let mut ret = match handle_method_call(&message) {
            Ok(ret) => ret,
            Err(error) => {
                Message::new_error(&message, "org.test.Demo.Error", &error.to_string())?
            }
        };

        c.send(&mut ret)?;

        let mut signal = Message::new_signal(PATH, INTERFACE, "Pinged")?;
        signal.append_argument(message.sender().unwrap_or_default())?;
        c.send(&mut signal)?;
        c.flush().await?;
    }
}

/// Handle a method call.
fn handle_method_call(message: &Message) -> Result<Message> {
    let path = message.path().context("Missing path")?;
    let interface = message.interface().context("Missing interface")?;

    if path != PATH {
        bail!("Bad path: {path}");
    }

    if interface != INTERFACE {
        bail!("Bad interface: {interface}");
    }

    match message.member() {
        Some("Ping") => {
            let text = message
                .arguments()
                .first()
                .and_then(|argument| argument.as_str())
                .context("Expected a string argument")?;

            let mut ret = Message::new_method_return(message)?;
            ret.append_argument(text)?;
            Ok(ret)
        }
        member => bail!("Unknown method: {member:?}"),
    }
}
