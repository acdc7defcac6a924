//! The transport capability consumed by the bot.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportResult;
use crate::message::{BoxedMessage, Message};

/// The stream of inbound messages produced by [`Client::open`].
///
/// The channel buffer is the only throttle on inbound admission: the bot
/// pulls from it as fast as it can spawn dispatch tasks.
pub type MessageStream = mpsc::Receiver<BoxedMessage>;

/// A connection to a chat platform.
///
/// # Role questions
///
/// The `is_*` methods answer questions about the author of a message. They
/// are called from many dispatch tasks at once and should answer from cached
/// state rather than performing network round-trips.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// Connects to the platform and returns the inbound message stream.
    async fn open(&self) -> TransportResult<MessageStream>;

    /// Sends `text` to `channel`.
    ///
    /// Delivery is best effort; there is no retry.
    async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()>;

    /// Whether the message arrived in a private (direct) context.
    fn is_private(&self, message: &dyn Message) -> bool;

    /// Whether the author moderates the channel.
    fn is_moderator(&self, message: &dyn Message) -> bool;

    /// Whether the author owns the channel (or the guild it belongs to).
    fn is_channel_owner(&self, message: &dyn Message) -> bool;

    /// Whether the author is the configured bot owner.
    fn is_bot_owner(&self, message: &dyn Message) -> bool;

    /// Whether the message was sent by the bot itself.
    fn is_me(&self, message: &dyn Message) -> bool;
}

/// A shared, type-erased client.
pub type BoxedClient = Arc<dyn Client>;
