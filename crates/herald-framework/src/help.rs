//! The built-in `commands` listing.

use std::sync::Arc;

use herald_core::Message;
use tracing::warn;

use crate::bot::{Bot, CompiledCommand};

/// Sent when no visible command exists.
pub const NO_COMMANDS_FOUND: &str = "No commands found";

/// Renders the sorted, newline-separated listing of every visible command.
///
/// A plugin whose [`help`](crate::Plugin::help) returns a non-empty list
/// contributes that list instead of its generated lines.
pub fn render_help(bot: &Bot, message: &dyn Message, bot_prefix: &str) -> String {
    let mut lines = Vec::new();

    for entry in bot.plugins() {
        match entry.plugin().help(bot, message, false) {
            Some(custom) if !custom.is_empty() => lines.extend(custom),
            _ => lines.extend(listed(entry.commands(), bot, message, bot_prefix)),
        }
    }
    lines.extend(listed(bot.commands(), bot, message, bot_prefix));

    if lines.is_empty() {
        return NO_COMMANDS_FOUND.to_string();
    }

    lines.sort();
    lines.join("\n")
}

/// Renders the listing and sends it to the channel `message` came from.
pub async fn send_help(bot: &Bot, message: &dyn Message, bot_prefix: &str) {
    let text = render_help(bot, message, bot_prefix);
    if let Err(e) = bot.client().send_message(message.channel(), &text).await {
        warn!(channel = %message.channel(), error = %e, "Failed to send command listing");
    }
}

fn listed<'a>(
    commands: &'a [Arc<CompiledCommand>],
    bot: &'a Bot,
    message: &'a dyn Message,
    bot_prefix: &'a str,
) -> impl Iterator<Item = String> + 'a {
    commands
        .iter()
        .map(|command| command.definition())
        .filter(|definition| !definition.unlisted)
        .map(move |definition| {
            definition.help_line(&bot.definition_prefix(definition, message, bot_prefix))
        })
}
