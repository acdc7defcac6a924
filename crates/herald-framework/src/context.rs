//! The value handed to a command callback.

use std::sync::Arc;

use herald_core::{BoxedClient, BoxedMessage, Message, TransportResult};

use crate::arguments::Arguments;
use crate::bot::Bot;

/// Everything a command callback receives for one invocation.
#[derive(Clone)]
pub struct CommandContext {
    bot: Arc<Bot>,
    message: BoxedMessage,
    args: Arguments,
    trigger: String,
}

impl CommandContext {
    pub(crate) fn new(bot: Arc<Bot>, message: BoxedMessage, args: Arguments, trigger: String) -> Self {
        Self {
            bot,
            message,
            args,
            trigger,
        }
    }

    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    pub fn client(&self) -> &BoxedClient {
        self.bot.client()
    }

    pub fn message(&self) -> &BoxedMessage {
        &self.message
    }

    /// All extracted arguments, keyed by alias.
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// A single argument. Omitted optional arguments are `Some("")`.
    pub fn arg(&self, alias: &str) -> Option<&str> {
        self.args.get(alias).map(String::as_str)
    }

    /// The trigger word (without prefix) that matched.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Sends `text` to the channel the command came from.
    pub async fn reply(&self, text: &str) -> TransportResult<()> {
        self.client().send_message(self.message.channel(), text).await
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("message", &self.message)
            .field("args", &self.args)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}
