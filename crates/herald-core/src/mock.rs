//! In-memory transport for tests and demos.
//!
//! [`MockClient`] answers role questions from fixed sets of user ids,
//! records every outbound message, and hands out a [`MockInjector`] that
//! pushes messages into the stream returned by [`Client::open`].
//!
//! ```rust,ignore
//! let client = Arc::new(MockClient::new("bot").owner("alice").moderator("bob"));
//! let injector = client.injector();
//! injector.push(client.message("general", "bob", "?hello")).await;
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::client::{Client, MessageStream};
use crate::error::{TransportError, TransportResult};
use crate::message::{BoxedMessage, Message};

const STREAM_BUFFER: usize = 64;

/// A message recorded by [`MockClient::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: String,
    pub text: String,
}

/// An in-memory [`Client`].
pub struct MockClient {
    self_id: String,
    owner_id: Option<String>,
    moderators: HashSet<String>,
    channel_owners: HashSet<String>,
    private_channels: HashSet<String>,
    injector: mpsc::Sender<BoxedMessage>,
    stream: Mutex<Option<MessageStream>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MockClient {
    /// Creates a client whose own user id is `self_id`.
    pub fn new(self_id: impl Into<String>) -> Self {
        let (injector, stream) = mpsc::channel(STREAM_BUFFER);
        Self {
            self_id: self_id.into(),
            owner_id: None,
            moderators: HashSet::new(),
            channel_owners: HashSet::new(),
            private_channels: HashSet::new(),
            injector,
            stream: Mutex::new(Some(stream)),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Sets the bot owner.
    pub fn owner(mut self, user_id: impl Into<String>) -> Self {
        self.owner_id = Some(user_id.into());
        self
    }

    /// Marks `user_id` as a moderator in every channel.
    pub fn moderator(mut self, user_id: impl Into<String>) -> Self {
        self.moderators.insert(user_id.into());
        self
    }

    /// Marks `user_id` as a channel owner in every channel.
    pub fn channel_owner(mut self, user_id: impl Into<String>) -> Self {
        self.channel_owners.insert(user_id.into());
        self
    }

    /// Marks `channel` as a private (direct) conversation.
    pub fn private_channel(mut self, channel: impl Into<String>) -> Self {
        self.private_channels.insert(channel.into());
        self
    }

    /// The mention tag that addresses this bot, e.g. `<@bot>`.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.self_id)
    }

    /// Builds a message addressed with this client's mention tag.
    pub fn message(
        &self,
        channel: impl Into<String>,
        user_id: impl Into<String>,
        raw: impl Into<String>,
    ) -> MockMessage {
        MockMessage::new(channel, user_id, raw).mentioning(self.mention())
    }

    /// Builds a message authored by the bot itself.
    pub fn own_message(&self, channel: impl Into<String>, raw: impl Into<String>) -> MockMessage {
        self.message(channel, self.self_id.clone(), raw)
    }

    /// Returns a handle that feeds the inbound stream.
    pub fn injector(&self) -> MockInjector {
        MockInjector {
            sender: self.injector.clone(),
        }
    }

    /// Everything sent through [`Client::send_message`] so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Client for MockClient {
    async fn open(&self) -> TransportResult<MessageStream> {
        self.stream.lock().take().ok_or(TransportError::AlreadyOpen)
    }

    async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()> {
        self.sent.lock().push(SentMessage {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn is_private(&self, message: &dyn Message) -> bool {
        self.private_channels.contains(message.channel())
    }

    fn is_moderator(&self, message: &dyn Message) -> bool {
        self.moderators.contains(message.user_id())
    }

    fn is_channel_owner(&self, message: &dyn Message) -> bool {
        self.channel_owners.contains(message.user_id())
    }

    fn is_bot_owner(&self, message: &dyn Message) -> bool {
        self.owner_id.as_deref() == Some(message.user_id())
    }

    fn is_me(&self, message: &dyn Message) -> bool {
        message.user_id() == self.self_id
    }
}

/// Feeds messages into a [`MockClient`]'s stream.
#[derive(Clone)]
pub struct MockInjector {
    sender: mpsc::Sender<BoxedMessage>,
}

impl MockInjector {
    /// Pushes a message. Returns `false` once the stream has been dropped.
    pub async fn push(&self, message: MockMessage) -> bool {
        self.sender.send(message.boxed()).await.is_ok()
    }
}

/// A plain in-memory [`Message`].
#[derive(Debug, Clone)]
pub struct MockMessage {
    channel: String,
    user_id: String,
    user_name: String,
    message_id: String,
    raw: String,
    processed: Option<String>,
    mention: Option<String>,
    timestamp: SystemTime,
}

impl MockMessage {
    /// Creates a message; the user name defaults to the user id.
    pub fn new(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            channel: channel.into(),
            user_name: user_id.clone(),
            user_id,
            message_id: String::new(),
            raw: raw.into(),
            processed: None,
            mention: None,
            timestamp: SystemTime::now(),
        }
    }

    /// Sets the author's display name.
    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    /// Sets the message id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.message_id = id.into();
        self
    }

    /// Overrides the processed text; by default it equals the raw text.
    pub fn processed(mut self, text: impl Into<String>) -> Self {
        self.processed = Some(text.into());
        self
    }

    /// Sets the tag that counts as an @-mention of the bot.
    pub fn mentioning(mut self, tag: impl Into<String>) -> Self {
        self.mention = Some(tag.into());
        self
    }

    /// Wraps the message for dispatch.
    pub fn boxed(self) -> BoxedMessage {
        Arc::new(self)
    }
}

impl Message for MockMessage {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn user_name(&self) -> &str {
        &self.user_name
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

    fn message(&self) -> &str {
        self.processed.as_deref().unwrap_or(&self.raw)
    }

    fn mention_trigger(&self, word: &str) -> Option<String> {
        let tag = self.mention.as_deref()?;
        let rest = self.raw.trim_start().strip_prefix(tag)?.trim_start();
        if rest.split_whitespace().next()? != word {
            return None;
        }
        let consumed = self.raw.len() - rest.len() + word.len();
        Some(self.raw[..consumed].to_string())
    }

    fn timestamp(&self) -> Option<SystemTime> {
        Some(self.timestamp)
    }
}
