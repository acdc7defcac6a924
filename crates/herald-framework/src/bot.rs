//! The frozen, dispatch-ready bot.
//!
//! A [`Bot`] is produced by [`Registry::into_bot`](crate::Registry::into_bot)
//! once every plugin and command has been validated and compiled. It is
//! immutable from then on and shared as `Arc<Bot>` by every dispatch task.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use herald_core::{BoxedClient, Message};
use tokio::sync::Semaphore;

use crate::arguments::ArgumentMatcher;
use crate::command::{CommandCallback, CommandDefinition};
use crate::plugin::Plugin;
use crate::prefix::{DEFAULT_COMMAND_PREFIX, PrefixResolver, resolve_level};

// =============================================================================
// BotSettings
// =============================================================================

/// Bot-wide behaviour that does not come from plugins or commands.
#[derive(Clone, Default)]
pub struct BotSettings {
    /// Static bot-level prefix. Empty means [`DEFAULT_COMMAND_PREFIX`].
    pub command_prefix: String,
    /// Per-message bot-level prefix, consulted before `command_prefix`.
    pub prefix_resolver: Option<Arc<dyn PrefixResolver>>,
    pub owner_user_id: Option<String>,
    pub client_id: Option<String>,
    /// Disables the built-in `commands` listing.
    pub command_lookup_disabled: bool,
    /// Upper bound on concurrently running dispatch tasks; `0` is unbounded.
    pub max_in_flight: usize,
    /// Shared application state, readable through [`Bot::state`].
    pub state: Option<Arc<dyn Any + Send + Sync>>,
}

impl BotSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    pub fn prefix_resolver<R: PrefixResolver>(mut self, resolver: R) -> Self {
        self.prefix_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn owner_user_id(mut self, id: impl Into<String>) -> Self {
        self.owner_user_id = Some(id.into());
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn command_lookup_disabled(mut self, disabled: bool) -> Self {
        self.command_lookup_disabled = disabled;
        self
    }

    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = limit;
        self
    }

    pub fn state<T: Any + Send + Sync>(mut self, state: T) -> Self {
        self.state = Some(Arc::new(state));
        self
    }
}

impl fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSettings")
            .field("command_prefix", &self.command_prefix)
            .field("has_prefix_resolver", &self.prefix_resolver.is_some())
            .field("owner_user_id", &self.owner_user_id)
            .field("client_id", &self.client_id)
            .field("command_lookup_disabled", &self.command_lookup_disabled)
            .field("max_in_flight", &self.max_in_flight)
            .field("has_state", &self.state.is_some())
            .finish()
    }
}

// =============================================================================
// Compiled entries
// =============================================================================

/// A validated command with its argument matcher precompiled.
pub struct CompiledCommand {
    pub(crate) definition: CommandDefinition,
    pub(crate) arguments: ArgumentMatcher,
    pub(crate) callback: CommandCallback,
}

impl CompiledCommand {
    pub fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.command_id
    }
}

impl fmt::Debug for CompiledCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCommand")
            .field("definition", &self.definition)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// A plugin together with its compiled commands.
pub struct PluginEntry {
    pub(crate) plugin: Arc<dyn Plugin>,
    pub(crate) commands: Vec<Arc<CompiledCommand>>,
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    pub fn commands(&self) -> &[Arc<CompiledCommand>] {
        &self.commands
    }
}

// =============================================================================
// Bot
// =============================================================================

pub struct Bot {
    client: BoxedClient,
    plugins: Vec<PluginEntry>,
    commands: Vec<Arc<CompiledCommand>>,
    settings: BotSettings,
    pub(crate) limiter: Option<Arc<Semaphore>>,
}

impl Bot {
    pub(crate) fn new(
        client: BoxedClient,
        plugins: Vec<PluginEntry>,
        commands: Vec<Arc<CompiledCommand>>,
        settings: BotSettings,
    ) -> Self {
        let limiter = (settings.max_in_flight > 0)
            .then(|| Arc::new(Semaphore::new(settings.max_in_flight)));
        Self {
            client,
            plugins,
            commands,
            settings,
            limiter,
        }
    }

    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Registered plugins, in registration order.
    pub fn plugins(&self) -> &[PluginEntry] {
        &self.plugins
    }

    /// Standalone commands, in registration order.
    pub fn commands(&self) -> &[Arc<CompiledCommand>] {
        &self.commands
    }

    /// The shared state, if it was set and is of type `T`.
    pub fn state<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.settings.state.clone()?.downcast::<T>().ok()
    }

    /// The bot-level prefix for `message`: the dynamic resolver, then the
    /// static prefix, then [`DEFAULT_COMMAND_PREFIX`], skipping empty values.
    pub fn command_prefix(&self, message: &dyn Message) -> String {
        resolve_level(
            self.settings.prefix_resolver.as_ref(),
            Some(self.settings.command_prefix.as_str()),
            self,
            message,
        )
        .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string())
    }

    /// The prefix `definition` answers to for `message`, given the already
    /// resolved bot-level prefix.
    pub fn definition_prefix(
        &self,
        definition: &CommandDefinition,
        message: &dyn Message,
        bot_prefix: &str,
    ) -> String {
        resolve_level(
            definition.prefix_resolver.as_ref(),
            definition.command_prefix.as_deref(),
            self,
            message,
        )
        .unwrap_or_else(|| bot_prefix.to_string())
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field(
                "plugins",
                &self.plugins.iter().map(PluginEntry::name).collect::<Vec<_>>(),
            )
            .field("commands", &self.commands.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
