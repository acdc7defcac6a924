//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use herald_framework::OpenError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Validation or transport failure while opening the bot.
    #[error(transparent)]
    Open(#[from] OpenError),

    /// Installing a shutdown signal handler failed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
