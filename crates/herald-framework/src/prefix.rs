//! Command prefix resolution.
//!
//! A prefix is the string prepended to a trigger to form the literal
//! invocation token (`?` + `hello` = `?hello`). For each command the first
//! non-empty value wins, in this order:
//!
//! 1. the command's own dynamic resolver
//! 2. the command's own static prefix
//! 3. the bot's dynamic resolver
//! 4. the bot's static prefix
//! 5. [`DEFAULT_COMMAND_PREFIX`]

use std::sync::Arc;

use herald_core::{Client, Message};

use crate::bot::Bot;

/// The prefix used when nothing else is configured.
pub const DEFAULT_COMMAND_PREFIX: &str = "?";

/// Chooses a prefix for a message at dispatch time.
///
/// Implemented for any `Fn(&Bot, &dyn Client, &dyn Message) -> String`.
/// Returning an empty string defers to the next source in the resolution
/// order.
pub trait PrefixResolver: Send + Sync + 'static {
    fn resolve(&self, bot: &Bot, client: &dyn Client, message: &dyn Message) -> String;
}

impl<F> PrefixResolver for F
where
    F: Fn(&Bot, &dyn Client, &dyn Message) -> String + Send + Sync + 'static,
{
    fn resolve(&self, bot: &Bot, client: &dyn Client, message: &dyn Message) -> String {
        self(bot, client, message)
    }
}

/// One level of the resolution order: the resolver, then the static prefix.
///
/// Returns `None` when both come out empty.
pub(crate) fn resolve_level(
    resolver: Option<&Arc<dyn PrefixResolver>>,
    fixed: Option<&str>,
    bot: &Bot,
    message: &dyn Message,
) -> Option<String> {
    resolver
        .map(|resolver| resolver.resolve(bot, bot.client().as_ref(), message))
        .filter(|prefix| !prefix.is_empty())
        .or_else(|| fixed.filter(|prefix| !prefix.is_empty()).map(str::to_string))
}
