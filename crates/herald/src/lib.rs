//! # Herald
//!
//! Command routing and dispatch for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌────────────┐     ┌─────────────────────────────────────┐
//! │  Client  │────▶│ Dispatcher │────▶│ Plugin "music" message hook (task)  │
//! │(platform)│     │            │────▶│ command "music.play"        (task)  │
//! └──────────┘     └────────────┘────▶│ command "herald-cmd-hello"  (task)  │
//!                                     └─────────────────────────────────────┘
//! ```
//!
//! - **Client**: the chat platform connection, seen through [`core::Client`]
//! - **Plugins**: named bundles of commands with a catch-all message hook
//! - **Commands**: triggers, regex arguments, permission and exposure levels
//! - **Dispatcher**: one isolated task per plugin hook and per command check;
//!   a panicking callback never takes the bot down
//! - **Runtime**: configuration, logging and lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = HeraldRuntime::new();
//!     runtime.register_command("hello", "Displays hello world", |ctx| async move {
//!         let _ = ctx.reply("Hello, world!").await;
//!     });
//!     runtime.run(Arc::new(MyClient::connect().await?)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `mock`: in-memory [`core::mock::MockClient`]

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use herald_runtime::{HeraldRuntime, RunningBot};

    // Commands and plugins
    pub use herald_framework::{
        CommandArgument, CommandContext, CommandDefinition, ExposureLevel, PermissionLevel,
        Plugin, PluginResult,
    };

    // The frozen bot, for callbacks and prefix resolvers
    pub use herald_framework::{Bot, BotSettings, Registry};

    // Transport traits for custom clients
    pub use herald_core::{BoxedClient, BoxedMessage, Client, Message, MessageStream};
}
