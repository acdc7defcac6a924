//! Argument extraction.
//!
//! A command's arguments are compiled once into a single anchored regex. The
//! first argument becomes `(?P<alias>pattern)`, every later one
//! `(?:\s+(?P<alias>pattern))`, and optional arguments get a trailing `?`.
//! The whole remainder of the message after the trigger must match.

use std::collections::HashMap;

use regex::Regex;

use crate::command::CommandArgument;
use crate::error::ValidationError;

/// Values extracted from a message, keyed by argument alias.
pub type Arguments = HashMap<String, String>;

/// The precompiled argument matcher of one command.
#[derive(Debug, Clone)]
pub struct ArgumentMatcher {
    regex: Option<Regex>,
    aliases: Vec<String>,
}

impl ArgumentMatcher {
    /// Compiles the composite pattern for `arguments`.
    pub fn compile(command_id: &str, arguments: &[CommandArgument]) -> Result<Self, ValidationError> {
        let aliases: Vec<String> = arguments.iter().map(|a| a.alias.clone()).collect();
        if arguments.is_empty() {
            return Ok(Self {
                regex: None,
                aliases,
            });
        }

        let regex = Regex::new(&composite_pattern(arguments)).map_err(|e| {
            ValidationError::InvalidArgumentPattern {
                command: command_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            regex: Some(regex),
            aliases,
        })
    }

    /// Number of declared arguments.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Extracts argument values from `content`, the message text that follows
    /// the trigger.
    ///
    /// Returns `None` when the content does not match. An optional argument
    /// that was omitted maps to an empty string.
    pub fn extract(&self, content: &str) -> Option<Arguments> {
        let Some(regex) = &self.regex else {
            return Some(Arguments::new());
        };

        let captures = regex.captures(content.trim())?;
        let values: Arguments = self
            .aliases
            .iter()
            .map(|alias| {
                let value = captures.name(alias).map(|m| m.as_str()).unwrap_or_default();
                (alias.clone(), value.to_string())
            })
            .collect();

        (values.len() == self.aliases.len()).then_some(values)
    }
}

/// Builds the anchored pattern, e.g. `^(?P<name>\w+)(?:\s+(?P<times>\d+))?$`.
fn composite_pattern(arguments: &[CommandArgument]) -> String {
    let mut pattern = String::from("^");
    for (index, argument) in arguments.iter().enumerate() {
        if index == 0 {
            pattern.push_str(&format!("(?P<{}>{})", argument.alias, argument.pattern));
        } else {
            pattern.push_str(&format!(r"(?:\s+(?P<{}>{}))", argument.alias, argument.pattern));
        }
        if argument.optional {
            pattern.push('?');
        }
    }
    pattern.push('$');
    pattern
}

/// Returns the part of `raw` after the matched trigger text, trimmed.
///
/// `matched` is either the literal `prefix + trigger` token or the leading
/// mention text reported by the transport.
pub fn content_after_trigger<'a>(raw: &'a str, matched: &str) -> &'a str {
    let raw = raw.trim_start();
    raw.strip_prefix(matched.trim_start()).unwrap_or(raw).trim()
}
