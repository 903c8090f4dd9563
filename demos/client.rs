use std::time::Duration;

use anyhow::{Context, Result};
use tokio_dbus_engine::{Connection, MatchRule, Message};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut c = Connection::session_bus().await?;
    c.add_match(&MatchRule::signal("org.test.Demo", "Pinged"))
        .await?;

    let mut m = Message::new_method_call("org.test.Demo", "/org/test/Demo", "org.test.Demo", "Ping")?;
    m.append_argument("hello")?;

    let reply = c.call_and_wait(&mut m, Duration::from_secs(5)).await?;
    let text = reply
        .arguments()
        .first()
        .and_then(|argument| argument.as_str())
        .context("Expected a string reply")?;

    println!("reply: {text}");

    // The bus sends its own signals too, such as `NameAcquired`.
    let signal = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let message = c.recv_message().await?;

            if message.member() == Some("Pinged") {
                return Ok::<_, tokio_dbus_engine::Error>(message);
            }

            tracing::debug!(member = message.member(), "Skipping message");
        }
    })
    .await??;

    println!("signal: {:?} from {:?}", signal.member(), signal.sender());
    Ok(())
}
