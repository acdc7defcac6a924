//! Command definitions.
//!
//! A [`CommandDefinition`] is the immutable description of one invocable
//! command: its triggers, its argument layout, who may call it and where, and
//! the async callback to run.
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_framework::{CommandArgument, CommandDefinition, PermissionLevel};
//!
//! let greet = CommandDefinition::new("greet-command")
//!     .description("Greets someone")
//!     .triggers(["greet", "hi"])
//!     .argument(CommandArgument::new(r"\w+", "name"))
//!     .permission(PermissionLevel::Moderator)
//!     .callback(|ctx| async move {
//!         let text = format!("Hello, {}!", ctx.arg("name").unwrap_or_default());
//!         let _ = ctx.reply(&text).await;
//!     });
//! ```

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::access::{ExposureLevel, PermissionLevel};
use crate::context::CommandContext;
use crate::error::ValidationError;
use crate::prefix::PrefixResolver;

/// The type-erased async handler of a command.
pub type CommandCallback = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// One positional argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgument {
    /// Regular expression matching the argument's text.
    pub pattern: String,
    /// Key of the extracted value, also shown in help text as `<alias>`.
    pub alias: String,
    /// Whether the argument may be omitted. Only trailing arguments may be
    /// optional.
    pub optional: bool,
}

impl CommandArgument {
    /// Creates a required argument.
    pub fn new(pattern: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            alias: alias.into(),
            optional: false,
        }
    }

    /// Creates an optional argument.
    pub fn optional(pattern: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::new(pattern, alias)
        }
    }
}

/// Description of one invocable command.
///
/// Definitions are built once while configuring the bot and never change
/// afterwards; the bot validates and compiles them when it is built.
#[derive(Clone, Default)]
pub struct CommandDefinition {
    /// Unique id; a later definition with the same id replaces an earlier one.
    pub command_id: String,
    /// Summary shown in the help listing.
    pub description: String,
    /// Literal trigger words, without prefix. The first one is shown in help.
    pub triggers: Vec<String>,
    /// Positional arguments, matched in order.
    pub arguments: Vec<CommandArgument>,
    pub permission_level: PermissionLevel,
    pub exposure_level: ExposureLevel,
    /// Hides the command from the help listing.
    pub unlisted: bool,
    /// Disables the `@bot <trigger>` invocation style.
    pub disable_trigger_on_mention: bool,
    /// Overrides the bot-level prefix for this command.
    pub command_prefix: Option<String>,
    /// Per-message override, consulted before `command_prefix`.
    pub prefix_resolver: Option<Arc<dyn PrefixResolver>>,
    pub callback: Option<CommandCallback>,
}

impl CommandDefinition {
    /// Creates an empty definition with the given id.
    pub fn new(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a trigger word.
    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.triggers.push(trigger.into());
        self
    }

    /// Adds several trigger words.
    pub fn triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers.extend(triggers.into_iter().map(Into::into));
        self
    }

    /// Appends a positional argument.
    pub fn argument(mut self, argument: CommandArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn permission(mut self, level: PermissionLevel) -> Self {
        self.permission_level = level;
        self
    }

    pub fn exposure(mut self, level: ExposureLevel) -> Self {
        self.exposure_level = level;
        self
    }

    pub fn unlisted(mut self, unlisted: bool) -> Self {
        self.unlisted = unlisted;
        self
    }

    pub fn disable_trigger_on_mention(mut self, disabled: bool) -> Self {
        self.disable_trigger_on_mention = disabled;
        self
    }

    /// Sets a static prefix override.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = Some(prefix.into());
        self
    }

    /// Sets a per-message prefix resolver.
    pub fn prefix_resolver<R: PrefixResolver>(mut self, resolver: R) -> Self {
        self.prefix_resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the async callback.
    pub fn callback<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.callback = Some(Arc::new(move |ctx| Box::pin(f(ctx))));
        self
    }

    /// Renders the help line for this command under `prefix`, e.g.
    /// `` `?greet <name>` - Greets someone ``.
    pub fn help_line(&self, prefix: &str) -> String {
        let mut invocation = format!(
            "{prefix}{}",
            self.triggers.first().map(String::as_str).unwrap_or_default()
        );
        for argument in &self.arguments {
            invocation.push_str(&format!(" <{}>", argument.alias));
        }
        format!("`{invocation}` - {}", self.description)
    }

    /// Checks the structural invariants, returning every violation found.
    ///
    /// Pattern syntax is checked separately, when the arguments are compiled.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let command = self.command_id.clone();

        if command.is_empty() {
            errors.push(ValidationError::MissingCommandId {
                triggers: self.triggers.clone(),
            });
        }

        if self.triggers.is_empty() || self.triggers.iter().any(String::is_empty) {
            errors.push(ValidationError::MissingTriggers {
                command: command.clone(),
            });
        }

        if self.callback.is_none() {
            errors.push(ValidationError::MissingCallback {
                command: command.clone(),
            });
        }

        let mut seen = HashSet::new();
        for (index, argument) in self.arguments.iter().enumerate() {
            if argument.pattern.is_empty() {
                errors.push(ValidationError::MissingArgumentPattern {
                    command: command.clone(),
                    index,
                });
            }

            if argument.alias.is_empty() {
                errors.push(ValidationError::MissingArgumentAlias {
                    command: command.clone(),
                    index,
                });
                continue;
            }

            if !is_valid_alias(&argument.alias) {
                errors.push(ValidationError::InvalidArgumentAlias {
                    command: command.clone(),
                    alias: argument.alias.clone(),
                });
            } else if !seen.insert(argument.alias.as_str()) {
                errors.push(ValidationError::DuplicateArgumentAlias {
                    command: command.clone(),
                    alias: argument.alias.clone(),
                });
            }
        }

        if let Some(interior) = self
            .arguments
            .windows(2)
            .find(|pair| pair[0].optional && !pair[1].optional)
        {
            errors.push(ValidationError::InteriorOptionalArgument {
                command,
                alias: interior[0].alias.clone(),
            });
        }

        errors
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("command_id", &self.command_id)
            .field("triggers", &self.triggers)
            .field("arguments", &self.arguments)
            .field("permission_level", &self.permission_level)
            .field("exposure_level", &self.exposure_level)
            .field("unlisted", &self.unlisted)
            .field("command_prefix", &self.command_prefix)
            .field("has_prefix_resolver", &self.prefix_resolver.is_some())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Alias names double as regex capture group names.
fn is_valid_alias(alias: &str) -> bool {
    let mut chars = alias.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CommandDefinition {
        CommandDefinition::new("hello-command")
            .description("Displays hello world")
            .trigger("hello")
            .callback(|_| async {})
    }

    #[test]
    fn test_valid_definition() {
        assert!(valid().validate().is_empty());
    }

    #[test]
    fn test_help_line() {
        let definition = valid()
            .argument(CommandArgument::new(r"\w+", "name"))
            .argument(CommandArgument::optional(r"\d+", "times"));
        assert_eq!(
            definition.help_line("?"),
            "`?hello <name> <times>` - Displays hello world"
        );
    }

    #[test]
    fn test_help_line_uses_first_trigger() {
        let definition = valid().trigger("hi");
        assert_eq!(definition.help_line("!"), "`!hello` - Displays hello world");
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let errors = CommandDefinition::new("").validate();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::MissingCommandId { .. }));
        assert!(matches!(errors[1], ValidationError::MissingTriggers { .. }));
        assert!(matches!(errors[2], ValidationError::MissingCallback { .. }));
    }

    #[test]
    fn test_empty_trigger_is_rejected() {
        let errors = valid().trigger("").validate();
        assert!(matches!(errors[..], [ValidationError::MissingTriggers { .. }]));
    }

    #[test]
    fn test_argument_fields_required() {
        let errors = valid()
            .argument(CommandArgument::new("", "name"))
            .argument(CommandArgument::new(r"\w+", ""))
            .validate();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingArgumentPattern {
                    command: "hello-command".into(),
                    index: 0
                },
                ValidationError::MissingArgumentAlias {
                    command: "hello-command".into(),
                    index: 1
                },
            ]
        );
    }

    #[test]
    fn test_alias_must_be_group_name() {
        let errors = valid()
            .argument(CommandArgument::new(r"\w+", "first name"))
            .validate();
        assert!(matches!(errors[..], [ValidationError::InvalidArgumentAlias { .. }]));
    }

    #[test]
    fn test_duplicate_alias() {
        let errors = valid()
            .argument(CommandArgument::new(r"\w+", "name"))
            .argument(CommandArgument::new(r"\w+", "name"))
            .validate();
        assert!(matches!(errors[..], [ValidationError::DuplicateArgumentAlias { .. }]));
    }

    #[test]
    fn test_interior_optional_rejected() {
        let errors = valid()
            .argument(CommandArgument::optional(r"\w+", "first"))
            .argument(CommandArgument::new(r"\w+", "second"))
            .validate();
        assert_eq!(
            errors,
            vec![ValidationError::InteriorOptionalArgument {
                command: "hello-command".into(),
                alias: "first".into()
            }]
        );
    }

    #[test]
    fn test_trailing_optionals_accepted() {
        let definition = valid()
            .argument(CommandArgument::new(r"\w+", "first"))
            .argument(CommandArgument::optional(r"\w+", "second"))
            .argument(CommandArgument::optional(r"\w+", "third"));
        assert!(definition.validate().is_empty());
    }
}
