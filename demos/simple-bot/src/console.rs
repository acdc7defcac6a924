//! A [`Client`] that reads lines from stdin and prints replies to stdout.
//!
//! Every line becomes one message in the `console` channel, authored by the
//! configured user. Prefixing a line with `@herald` addresses the bot by
//! mention, so `@herald hello` works like `?hello`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use async_trait::async_trait;
use herald::core::{BoxedMessage, Client, Message, MessageStream, TransportError, TransportResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const CONSOLE_CHANNEL: &str = "console";
pub const BOT_USER_ID: &str = "herald";
const MENTION: &str = "@herald";

pub struct ConsoleClient {
    user_id: String,
    owner_id: Option<String>,
    opened: AtomicBool,
    closed: CancellationToken,
}

impl ConsoleClient {
    pub fn new(user_id: impl Into<String>, owner_id: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            owner_id,
            opened: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    /// Cancelled once stdin reaches end of file.
    pub fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }
}

#[async_trait]
impl Client for ConsoleClient {
    async fn open(&self) -> TransportResult<MessageStream> {
        if self.opened.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyOpen);
        }

        let (tx, rx) = mpsc::channel(32);
        let user_id = self.user_id.clone();
        let closed = self.closed.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut next_id = 0u64;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        next_id += 1;
                        let message: BoxedMessage = Arc::new(ConsoleMessage {
                            user_id: user_id.clone(),
                            message_id: next_id.to_string(),
                            raw: line,
                            received: SystemTime::now(),
                        });
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read from stdin");
                        break;
                    }
                }
            }
            debug!("Console input closed");
            closed.cancel();
        });

        Ok(rx)
    }

    async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()> {
        let mut stdout = tokio::io::stdout();
        let line = format!("[{channel}] {text}\n");
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::send_failed(channel, e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| TransportError::send_failed(channel, e.to_string()))
    }

    /// The console is a one-to-one conversation.
    fn is_private(&self, _message: &dyn Message) -> bool {
        true
    }

    fn is_moderator(&self, _message: &dyn Message) -> bool {
        false
    }

    fn is_channel_owner(&self, _message: &dyn Message) -> bool {
        false
    }

    fn is_bot_owner(&self, message: &dyn Message) -> bool {
        self.owner_id.as_deref() == Some(message.user_id())
    }

    fn is_me(&self, message: &dyn Message) -> bool {
        message.user_id() == BOT_USER_ID
    }
}

#[derive(Debug)]
struct ConsoleMessage {
    user_id: String,
    message_id: String,
    raw: String,
    received: SystemTime,
}

impl Message for ConsoleMessage {
    fn channel(&self) -> &str {
        CONSOLE_CHANNEL
    }

    fn user_name(&self) -> &str {
        &self.user_id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn message_id(&self) -> &str {
        &self.message_id
    }

    fn raw_message(&self) -> &str {
        &self.raw
    }

    fn mention_trigger(&self, word: &str) -> Option<String> {
        let rest = self.raw.trim_start().strip_prefix(MENTION)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();
        if rest.split_whitespace().next()? != word {
            return None;
        }
        let consumed = self.raw.len() - rest.len() + word.len();
        Some(self.raw[..consumed].to_string())
    }

    fn timestamp(&self) -> Option<SystemTime> {
        Some(self.received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(raw: &str) -> ConsoleMessage {
        ConsoleMessage {
            user_id: "alice".into(),
            message_id: "1".into(),
            raw: raw.into(),
            received: SystemTime::now(),
        }
    }

    #[test]
    fn test_mention_trigger() {
        assert_eq!(
            message("  @herald  greet bob").mention_trigger("greet").as_deref(),
            Some("  @herald  greet")
        );
        assert_eq!(message("@heraldgreet bob").mention_trigger("greet"), None);
        assert_eq!(message("@herald hello").mention_trigger("greet"), None);
        assert_eq!(message("?greet").mention_trigger("greet"), None);
    }

    #[test]
    fn test_roles() {
        let client = ConsoleClient::new("alice", Some("alice".into()));
        let msg = message("hi");
        assert!(client.is_private(&msg));
        assert!(client.is_bot_owner(&msg));
        assert!(!client.is_moderator(&msg));
        assert!(!client.is_me(&msg));
    }
}
