//! Error types for the Herald framework.

use herald_core::TransportError;
use thiserror::Error;

/// Boxed error returned by plugin hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for plugin hooks.
pub type PluginResult = Result<(), BoxError>;

/// A misconfigured plugin or command, detected before the bot starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A plugin returned an empty name.
    #[error("plugin is missing required name")]
    MissingPluginName,

    /// A command definition has an empty id.
    #[error("command is missing required id (triggers: {triggers:?})")]
    MissingCommandId {
        /// Triggers of the offending definition, to help locate it.
        triggers: Vec<String>,
    },

    /// A command definition has no triggers, or only empty ones.
    #[error("command '{command}' is missing required triggers")]
    MissingTriggers { command: String },

    /// A command definition has no callback.
    #[error("command '{command}' is missing required callback")]
    MissingCallback { command: String },

    /// An argument has an empty pattern.
    #[error("command '{command}' argument #{index} is missing required pattern")]
    MissingArgumentPattern { command: String, index: usize },

    /// An argument has an empty alias.
    #[error("command '{command}' argument #{index} is missing required alias")]
    MissingArgumentAlias { command: String, index: usize },

    /// An alias cannot be used as a capture group name.
    #[error(
        "command '{command}' argument alias '{alias}' must start with a letter or '_' \
         and contain only letters, digits and '_'"
    )]
    InvalidArgumentAlias { command: String, alias: String },

    /// Two arguments share an alias.
    #[error("command '{command}' declares argument alias '{alias}' more than once")]
    DuplicateArgumentAlias { command: String, alias: String },

    /// An optional argument is followed by a required one.
    #[error(
        "command '{command}' optional argument '{alias}' is followed by a required argument; \
         only trailing arguments may be optional"
    )]
    InteriorOptionalArgument { command: String, alias: String },

    /// The composite argument pattern failed to compile.
    #[error("command '{command}' argument pattern is invalid: {reason}")]
    InvalidArgumentPattern { command: String, reason: String },

    /// Wraps an error with the name of the plugin that declared the command.
    #[error("plugin '{plugin}': {source}")]
    InPlugin {
        plugin: String,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attributes this error to `plugin`.
    pub fn in_plugin(self, plugin: impl Into<String>) -> Self {
        Self::InPlugin {
            plugin: plugin.into(),
            source: Box::new(self),
        }
    }
}

/// Errors that keep the bot from starting.
#[derive(Debug, Error)]
pub enum OpenError {
    /// One or more plugins or commands failed validation.
    #[error("{} misconfigured plugin(s) or command(s) found", .0.len())]
    Invalid(Vec<ValidationError>),

    /// The transport could not be opened.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
