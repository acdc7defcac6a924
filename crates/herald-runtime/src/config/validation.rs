//! Checks that deserialization alone cannot express.

use super::error::{ConfigError, ConfigResult};
use super::schema::{HeraldConfig, LogOutput};

/// Validates a loaded configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    let prefix = &config.bot.command_prefix;
    if prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "bot.command_prefix must not contain whitespace, got {prefix:?}"
        )));
    }

    if let Some(owner) = &config.bot.owner_user_id {
        if owner.trim().is_empty() {
            return Err(ConfigError::validation(
                "bot.owner_user_id must not be blank when set",
            ));
        }
    }

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output = \"file\"",
        ));
    }

    Ok(())
}
