//! Plugin and command registration.
//!
//! [`Registry`] collects plugins and standalone commands while the bot is
//! being configured. Registering a second plugin with the same name, or a
//! second command with the same id, logs a warning and replaces the earlier
//! entry in place.
//!
//! Nothing can be registered once the registry has been turned into a
//! [`Bot`] with [`Registry::into_bot`], which validates every entry and
//! precompiles each command's argument matcher.

use std::future::Future;
use std::sync::Arc;

use herald_core::BoxedClient;
use tracing::{debug, error, info, warn};

use crate::arguments::ArgumentMatcher;
use crate::bot::{Bot, BotSettings, CompiledCommand, PluginEntry};
use crate::command::CommandDefinition;
use crate::context::CommandContext;
use crate::error::{OpenError, ValidationError};
use crate::plugin::Plugin;

/// Prefix of the ids synthesised by [`Registry::register_command`].
pub const GENERATED_COMMAND_ID_PREFIX: &str = "herald-cmd-";

#[derive(Default)]
pub struct Registry {
    plugins: Vec<Arc<dyn Plugin>>,
    commands: Vec<CommandDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Plugins ─────────────────────────────────────────────────────────────

    /// Registers a plugin.
    pub fn register_plugin<P: Plugin>(&mut self, plugin: P) {
        self.register_plugin_arc(Arc::new(plugin));
    }

    /// Registers a plugin that is shared with other owners.
    pub fn register_plugin_arc(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        match self.plugins.iter().position(|p| p.name() == name) {
            Some(pos) => {
                warn!(plugin = %name, "Duplicate plugin name, replacing earlier registration");
                self.plugins[pos] = plugin;
            }
            None => {
                debug!(plugin = %name, "Plugin registered");
                self.plugins.push(plugin);
            }
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    /// Registers a standalone command with the id `herald-cmd-<trigger>`.
    pub fn register_command<F, Fut>(&mut self, trigger: &str, description: &str, callback: F)
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register_command_definition(
            CommandDefinition::new(format!("{GENERATED_COMMAND_ID_PREFIX}{trigger}"))
                .trigger(trigger)
                .description(description)
                .callback(callback),
        );
    }

    /// Like [`register_command`](Self::register_command), with a static
    /// prefix override.
    pub fn register_prefix_command<F, Fut>(
        &mut self,
        prefix: &str,
        trigger: &str,
        description: &str,
        callback: F,
    ) where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register_command_definition(
            CommandDefinition::new(format!("{GENERATED_COMMAND_ID_PREFIX}{trigger}"))
                .trigger(trigger)
                .description(description)
                .prefix(prefix)
                .callback(callback),
        );
    }

    /// Registers a fully specified standalone command.
    pub fn register_command_definition(&mut self, definition: CommandDefinition) {
        let id = definition.command_id.clone();
        match self.commands.iter().position(|c| c.command_id == id) {
            Some(pos) => {
                warn!(command = %id, "Duplicate command id, replacing earlier registration");
                self.commands[pos] = definition;
            }
            None => {
                debug!(command = %id, "Command registered");
                self.commands.push(definition);
            }
        }
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    // ─── Freezing ────────────────────────────────────────────────────────────

    /// Validates every plugin and command and builds the immutable [`Bot`].
    ///
    /// Every failure is logged; if there is at least one, the bot is not
    /// built and all failures are returned in [`OpenError::Invalid`].
    pub fn into_bot(self, client: BoxedClient, settings: BotSettings) -> Result<Arc<Bot>, OpenError> {
        let mut errors = Vec::new();

        let mut plugins = Vec::with_capacity(self.plugins.len());
        for plugin in self.plugins {
            let name = plugin.name().to_string();
            if name.is_empty() {
                errors.push(ValidationError::MissingPluginName);
                continue;
            }

            let mut commands = Vec::new();
            for definition in dedup_by_id(plugin.commands(), &name) {
                match compile(definition) {
                    Ok(command) => commands.push(Arc::new(command)),
                    Err(failures) => {
                        errors.extend(failures.into_iter().map(|e| e.in_plugin(name.as_str())))
                    }
                }
            }
            plugins.push(PluginEntry { plugin, commands });
        }

        let mut commands = Vec::with_capacity(self.commands.len());
        for definition in self.commands {
            match compile(definition) {
                Ok(command) => commands.push(Arc::new(command)),
                Err(failures) => errors.extend(failures),
            }
        }

        if !errors.is_empty() {
            for e in &errors {
                error!(error = %e, "Invalid configuration");
            }
            error!(
                count = errors.len(),
                "Refusing to start: fix the misconfigured plugins and commands above"
            );
            return Err(OpenError::Invalid(errors));
        }

        info!(
            plugins = plugins.len(),
            plugin_commands = plugins.iter().map(|p| p.commands.len()).sum::<usize>(),
            commands = commands.len(),
            "Bot configuration validated"
        );

        Ok(Arc::new(Bot::new(client, plugins, commands, settings)))
    }
}

/// Keeps the last definition for each id, at the position of the first.
fn dedup_by_id(definitions: Vec<CommandDefinition>, plugin: &str) -> Vec<CommandDefinition> {
    let mut unique: Vec<CommandDefinition> = Vec::with_capacity(definitions.len());
    for definition in definitions {
        match unique
            .iter()
            .position(|d| !d.command_id.is_empty() && d.command_id == definition.command_id)
        {
            Some(pos) => {
                warn!(
                    plugin = %plugin,
                    command = %definition.command_id,
                    "Duplicate command id, replacing earlier definition"
                );
                unique[pos] = definition;
            }
            None => unique.push(definition),
        }
    }
    unique
}

fn compile(definition: CommandDefinition) -> Result<CompiledCommand, Vec<ValidationError>> {
    let errors = definition.validate();
    if !errors.is_empty() {
        return Err(errors);
    }

    let arguments = ArgumentMatcher::compile(&definition.command_id, &definition.arguments)
        .map_err(|e| vec![e])?;
    let callback = match &definition.callback {
        Some(callback) => Arc::clone(callback),
        None => {
            return Err(vec![ValidationError::MissingCallback {
                command: definition.command_id.clone(),
            }]);
        }
    };

    Ok(CompiledCommand {
        definition,
        arguments,
        callback,
    })
}
