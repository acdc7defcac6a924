//! The plugin contract.
//!
//! A plugin bundles zero or more commands with a catch-all message hook and
//! optional persistence hooks. Only [`Plugin::name`] is required.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Echo;
//!
//! #[async_trait]
//! impl Plugin for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     fn commands(&self) -> Vec<CommandDefinition> {
//!         vec![CommandDefinition::new("echo")
//!             .trigger("echo")
//!             .argument(CommandArgument::new(".+", "text"))
//!             .callback(|ctx| async move {
//!                 let _ = ctx.reply(ctx.arg("text").unwrap_or_default()).await;
//!             })]
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{BoxedClient, BoxedMessage, Message};

use crate::bot::Bot;
use crate::command::CommandDefinition;
use crate::error::PluginResult;

// ─── Plugin ───────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Unique, non-empty name.
    fn name(&self) -> &str;

    /// The plugin's commands. Read once, when the bot is built.
    fn commands(&self) -> Vec<CommandDefinition> {
        Vec::new()
    }

    /// Called for every inbound message, including the bot's own and
    /// messages that trigger a command.
    async fn message(&self, _bot: &Arc<Bot>, _message: &BoxedMessage) -> PluginResult {
        Ok(())
    }

    /// Custom help lines. When this returns a non-empty list it replaces the
    /// lines generated from [`Plugin::commands`].
    fn help(&self, _bot: &Bot, _message: &dyn Message, _detailed: bool) -> Option<Vec<String>> {
        None
    }

    /// Called once after the transport opens, before any message is dispatched.
    async fn load(&self, _client: &BoxedClient) -> PluginResult {
        Ok(())
    }

    /// Persists plugin state; called by [`Bot::save`].
    async fn save(&self) -> PluginResult {
        Ok(())
    }
}
