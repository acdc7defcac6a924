//! # Herald Runtime
//!
//! Orchestration layer for Herald bots:
//!
//! - layered configuration with figment ([`config`])
//! - `tracing` subscriber setup driven by that configuration ([`logging`])
//! - [`HeraldRuntime`]: registration, opening a bot on a client, and
//!   shutdown on Ctrl+C or SIGTERM
//!
//! ```ignore
//! use herald_runtime::HeraldRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = HeraldRuntime::new();
//!     runtime.register_plugin(MyPlugin::default());
//!     runtime.run(Arc::new(MyClient::connect().await?)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, HeraldConfig, LoggingConfig, Profile,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HeraldRuntime, RunningBot, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros and [`Level`].
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
