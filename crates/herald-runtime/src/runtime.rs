//! Runtime orchestration: configuration, logging, registration and the
//! bot's lifecycle.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! // Auto-loads herald.toml from the current directory
//! let mut runtime = HeraldRuntime::new();
//! runtime.register_plugin(MyPlugin::default());
//! runtime.register_command("hello", "Displays hello world", |ctx| async move {
//!     let _ = ctx.reply("Hello, world!").await;
//! });
//!
//! // Runs until Ctrl+C or SIGTERM
//! runtime.run(Arc::new(MyClient::connect()?)).await?;
//! ```

use std::any::Any;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use herald_core::BoxedClient;
use herald_framework::{Bot, CommandContext, CommandDefinition, Plugin, PrefixResolver, Registry};
use serde::Serialize;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{ConfigLoader, ConfigResult, HeraldConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Collects plugins and commands, then opens a bot on a client.
///
/// ```rust,ignore
/// let mut runtime = HeraldRuntime::builder()
///     .config_file("config/herald.toml")
///     .profile("production")
///     .build()?;
///
/// runtime.prefix_resolver(|_: &Bot, _: &dyn Client, m: &dyn Message| {
///     if m.channel() == "music" { "~".into() } else { String::new() }
/// });
/// ```
pub struct HeraldRuntime {
    config: HeraldConfig,
    registry: Registry,
    prefix_resolver: Option<Arc<dyn PrefixResolver>>,
    state: Option<Arc<dyn Any + Send + Sync>>,
}

impl HeraldRuntime {
    /// Creates a runtime from the configuration found in the current
    /// directory; defaults are used when loading fails.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                HeraldConfig::default()
            });

        Self::from_config(config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration and
    /// initializes logging from it.
    pub fn from_config(config: HeraldConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            command_prefix = %config.bot.command_prefix,
            "Runtime initialized from configuration"
        );

        Self {
            config,
            registry: Registry::new(),
            prefix_resolver: None,
            state: None,
        }
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ─── Registration ────────────────────────────────────────────────────────

    pub fn register_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        self.registry.register_plugin(plugin);
        self
    }

    pub fn register_plugin_arc(&mut self, plugin: Arc<dyn Plugin>) -> &mut Self {
        self.registry.register_plugin_arc(plugin);
        self
    }

    pub fn register_command<F, Fut>(&mut self, trigger: &str, description: &str, callback: F) -> &mut Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry.register_command(trigger, description, callback);
        self
    }

    pub fn register_prefix_command<F, Fut>(
        &mut self,
        prefix: &str,
        trigger: &str,
        description: &str,
        callback: F,
    ) -> &mut Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry
            .register_prefix_command(prefix, trigger, description, callback);
        self
    }

    pub fn register_command_definition(&mut self, definition: CommandDefinition) -> &mut Self {
        self.registry.register_command_definition(definition);
        self
    }

    /// Sets the bot-level dynamic prefix, consulted before
    /// `bot.command_prefix`.
    pub fn prefix_resolver<R: PrefixResolver>(&mut self, resolver: R) -> &mut Self {
        self.prefix_resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets shared state, readable from callbacks through [`Bot::state`].
    pub fn state<T: Any + Send + Sync>(&mut self, state: T) -> &mut Self {
        self.state = Some(Arc::new(state));
        self
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Validates every registration, opens `client` and starts the receive
    /// loop.
    pub async fn open(self, client: BoxedClient) -> RuntimeResult<RunningBot> {
        let mut settings = self.config.bot.to_settings();
        settings.prefix_resolver = self.prefix_resolver;
        settings.state = self.state;

        let bot = self.registry.into_bot(client, settings)?;
        let cancel = CancellationToken::new();
        let listener = bot.open(cancel.clone()).await?;

        info!(
            plugins = bot.plugins().len(),
            commands = bot.commands().len(),
            "Bot is now listening"
        );

        Ok(RunningBot {
            bot,
            cancel,
            listener,
        })
    }

    /// Runs the bot until Ctrl+C or SIGTERM, then shuts it down.
    pub async fn run(self, client: BoxedClient) -> RuntimeResult<()> {
        let running = self.open(client).await?;
        info!("Press Ctrl+C to stop");

        let signalled = wait_for_shutdown().await;
        running.shutdown().await;
        signalled
    }

    /// Runs the bot until `shutdown` completes, then shuts it down.
    pub async fn run_until<F>(self, client: BoxedClient, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let running = self.open(client).await?;
        shutdown.await;
        running.shutdown().await;
        Ok(())
    }
}

impl Default for HeraldRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(RuntimeError::Signal)?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.map_err(RuntimeError::Signal)?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map_err(RuntimeError::Signal)?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RunningBot
// =============================================================================

/// A bot whose receive loop is running.
pub struct RunningBot {
    bot: Arc<Bot>,
    cancel: CancellationToken,
    listener: JoinHandle<()>,
}

impl RunningBot {
    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// A token that stops the receive loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the receive loop and runs every plugin's save hook.
    ///
    /// Callbacks already in flight keep running on the tokio runtime.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.listener.await {
            error!(error = %e, "Receive loop task failed");
        }
        self.bot.save().await;
        info!("Bot stopped");
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builds a [`HeraldRuntime`] with custom configuration sources.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges values on top of every other configuration source.
    pub fn merge<T: Serialize>(mut self, overrides: T) -> Self {
        self.config_loader = self.config_loader.merge(overrides);
        self
    }

    pub fn build(self) -> ConfigResult<HeraldRuntime> {
        let config = self.config_loader.load()?;
        Ok(HeraldRuntime::from_config(config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use herald_core::mock::MockClient;
    use herald_core::{Client, Message};
    use herald_framework::{OpenError, PluginResult, ValidationError};

    #[derive(Default)]
    struct Counter {
        saves: AtomicUsize,
    }

    #[async_trait]
    impl Plugin for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        async fn save(&self) -> PluginResult {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn runtime() -> HeraldRuntime {
        let dir = tempfile::tempdir().unwrap();
        HeraldRuntime::builder()
            .search_path(dir.path())
            .without_env()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_until_dispatches_and_saves() {
        let client = Arc::new(MockClient::new("bot"));
        let counter = Arc::new(Counter::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut runtime = runtime();
        runtime
            .register_plugin_arc(counter.clone())
            .register_command("ping", "Replies pong", move |ctx| {
                let tx = tx.clone();
                async move {
                    let _ = ctx.reply("pong").await;
                    let _ = tx.send(());
                }
            });

        let injector = client.injector();
        let message = client.message("general", "u", "?ping");
        let shutdown = async move {
            assert!(injector.push(message).await);
            tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
        };

        runtime.run_until(client.clone(), shutdown).await.unwrap();
        assert_eq!(client.sent()[0].text, "pong");
        assert_eq!(counter.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_applies_config_and_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime = HeraldRuntime::builder()
            .search_path(dir.path())
            .without_env()
            .merge(HeraldConfig {
                bot: crate::config::BotConfig {
                    command_prefix: "!".into(),
                    max_in_flight: 2,
                    ..Default::default()
                },
                ..Default::default()
            })
            .build()
            .unwrap();
        runtime
            .prefix_resolver(|_: &Bot, _: &dyn Client, m: &dyn Message| {
                if m.channel() == "music" {
                    "~".to_string()
                } else {
                    String::new()
                }
            })
            .state(7u8);

        let client = Arc::new(MockClient::new("bot"));
        let running = runtime.open(client.clone()).await.unwrap();
        let bot = running.bot().clone();

        let general = client.message("general", "u", "x");
        let music = client.message("music", "u", "x");
        assert_eq!(bot.command_prefix(&general), "!");
        assert_eq!(bot.command_prefix(&music), "~");
        assert_eq!(bot.settings().max_in_flight, 2);
        assert_eq!(bot.state::<u8>().as_deref(), Some(&7));

        running.shutdown().await;
    }

    #[tokio::test]
    async fn test_open_reports_invalid_commands() {
        let mut runtime = runtime();
        runtime.register_command_definition(CommandDefinition::new("broken"));

        let client = Arc::new(MockClient::new("bot"));
        let err = match runtime.open(client).await {
            Err(RuntimeError::Open(OpenError::Invalid(errors))) => errors,
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        };
        let command = "broken".to_string();
        assert!(err.contains(&ValidationError::MissingTriggers {
            command: command.clone()
        }));
        assert!(err.contains(&ValidationError::MissingCallback { command }));
    }
}
