//! # Herald Framework
//!
//! Command routing and dispatch for chat bots.
//!
//! This layer provides:
//! - [`CommandDefinition`]: triggers, arguments, access levels and a callback
//! - [`Plugin`]: a bundle of commands plus a catch-all message hook
//! - [`Registry`]: collects plugins and commands, then validates them into a [`Bot`]
//! - [`Bot::dispatch`]: per-message fan-out with panic isolation
//! - the built-in `commands` listing ([`help`])
//!
//! ```rust,ignore
//! let mut registry = Registry::new();
//! registry.register_command("hello", "Displays hello world", |ctx| async move {
//!     let _ = ctx.reply("Hello, world!").await;
//! });
//!
//! let bot = registry.into_bot(client, BotSettings::new())?;
//! let listener = bot.open(CancellationToken::new()).await?;
//! ```

pub mod access;
pub mod arguments;
pub mod bot;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod help;
pub mod plugin;
pub mod prefix;
pub mod registry;
pub mod trigger;

pub use access::{ExposureLevel, PermissionLevel, allow};
pub use arguments::{ArgumentMatcher, Arguments};
pub use bot::{Bot, BotSettings, CompiledCommand, PluginEntry};
pub use command::{CommandArgument, CommandCallback, CommandDefinition};
pub use context::CommandContext;
pub use error::{BoxError, OpenError, PluginResult, ValidationError};
pub use help::{NO_COMMANDS_FOUND, render_help};
pub use plugin::Plugin;
pub use prefix::{DEFAULT_COMMAND_PREFIX, PrefixResolver};
pub use registry::Registry;
pub use trigger::COMMANDS_TRIGGER;
