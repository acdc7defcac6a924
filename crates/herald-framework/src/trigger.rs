//! Trigger matching.

use herald_core::Message;

use crate::command::CommandDefinition;

/// The trigger word of the built-in command listing.
pub const COMMANDS_TRIGGER: &str = "commands";

/// Splits message text into whitespace-separated tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Matches one trigger of `definition` against a tokenized message.
///
/// Returns the matched leading text: the literal `prefix + trigger` token,
/// or the mention text reported by the transport.
pub fn find_trigger_match(
    definition: &CommandDefinition,
    trigger: &str,
    prefix: &str,
    parts: &[String],
    message: &dyn Message,
) -> Option<String> {
    let first = parts.first()?;
    if first.strip_prefix(prefix) == Some(trigger) {
        return Some(first.clone());
    }

    if !definition.disable_trigger_on_mention && parts.len() > 1 {
        return message.mention_trigger(trigger);
    }

    None
}

/// Whether the message asks for the command listing.
pub fn is_commands_request(prefix: &str, parts: &[String], message: &dyn Message) -> bool {
    let literal = parts
        .first()
        .is_some_and(|first| first.strip_prefix(prefix) == Some(COMMANDS_TRIGGER));
    literal || message.mention_trigger(COMMANDS_TRIGGER).is_some()
}
