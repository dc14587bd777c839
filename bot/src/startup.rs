//! Startup configuration gate.
//!
//! Runs before the HTTP client or the notifier exist, so a failure here
//! never reaches the network. `TELEGRAM_CHAT_ID` must be a numeric chat id;
//! `@channelusername` recipients are rejected.

use anyhow::{Context, Result};
use common::config::{BotConfig, ConfigError};
use tracing::error;

/// Validate configuration from an arbitrary variable lookup.
pub fn startup_config<F>(lookup: F) -> Result<BotConfig>
where
    F: Fn(&str) -> Option<String>,
{
    gate(BotConfig::from_lookup(lookup))
}

/// Validate configuration from `.env` and the process environment.
pub fn startup_config_from_env() -> Result<BotConfig> {
    gate(BotConfig::from_env())
}

fn gate(result: Result<BotConfig, ConfigError>) -> Result<BotConfig> {
    result
        .map_err(|e| {
            error!(critical = true, "Program stopped: {}", e);
            e
        })
        .context("Startup configuration check failed")
}
