//! Bot configuration, read once from the environment at startup.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_RETRY_PERIOD_SECS: u64 = 600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "telegram_bot.log";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct BotConfig {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: i64,
    pub endpoint: String,
    pub retry_period_secs: u64,
    pub request_timeout_secs: u64,
    /// `None` disables the file log.
    pub log_file: Option<PathBuf>,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("endpoint", &self.endpoint)
            .field("retry_period_secs", &self.retry_period_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl BotConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// All three required values are checked before returning, so a
    /// `ConfigError::Missing` lists every absent variable at once.
    /// Whitespace-only values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let practicum_token = required(PRACTICUM_TOKEN);
        let telegram_token = required(TELEGRAM_TOKEN);
        let telegram_chat_id = required(TELEGRAM_CHAT_ID);

        let missing: Vec<&'static str> = [
            (PRACTICUM_TOKEN, practicum_token.is_none()),
            (TELEGRAM_TOKEN, telegram_token.is_none()),
            (TELEGRAM_CHAT_ID, telegram_chat_id.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(practicum_token), Some(telegram_token), Some(chat_id)) =
            (practicum_token, telegram_token, telegram_chat_id)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let telegram_chat_id = chat_id.parse::<i64>().map_err(|_| ConfigError::Invalid {
            name: TELEGRAM_CHAT_ID,
            value: chat_id.clone(),
        })?;

        let endpoint = required("PRACTICUM_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let retry_period_secs = parse_secs(&lookup, "RETRY_PERIOD", DEFAULT_RETRY_PERIOD_SECS)?;
        let request_timeout_secs =
            parse_secs(&lookup, "REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let log_file = log_file_from_lookup(&lookup);

        Ok(Self {
            practicum_token,
            telegram_token,
            telegram_chat_id,
            endpoint,
            retry_period_secs,
            request_timeout_secs,
            log_file,
        })
    }

    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Log file location from `LOG_FILE`. Readable even when the rest of the
/// config is invalid, so startup failures still reach the file.
pub fn log_file_from_env() -> Option<PathBuf> {
    dotenv::dotenv().ok();
    log_file_from_lookup(&|name: &str| std::env::var(name).ok())
}

fn log_file_from_lookup<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("LOG_FILE") {
        None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(PathBuf::from(v.trim())),
    }
}

fn parse_secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::Invalid { name, value: v }),
    }
}
