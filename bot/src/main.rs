//! Homework bot: polls the Practicum homework status API and forwards
//! review status changes to a Telegram chat.
//!
//! Exit contract: runs until killed; exits with status 1 if a required
//! variable (`PRACTICUM_TOKEN`, `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`) is
//! missing or invalid, before any network call is made. `TELEGRAM_CHAT_ID`
//! must be a numeric chat id; `@channelusername` values are rejected.

use anyhow::Result;
use chrono::Utc;
use common::config;
use std::sync::Arc;
use telegram::TelegramNotifier;
use tracing::info;

use homework_bot::{logging, startup, PracticumClient, Poller};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(config::log_file_from_env().as_deref())?;

    info!("📚 Homework bot v{}", env!("CARGO_PKG_VERSION"));

    let config = startup::startup_config_from_env()?;

    info!(
        endpoint = %config.endpoint,
        chat_id = config.telegram_chat_id,
        interval_secs = config.retry_period_secs,
        timeout_secs = config.request_timeout_secs,
        "Configuration loaded"
    );

    let source = Arc::new(PracticumClient::from_config(&config)?);
    let notifier = Arc::new(TelegramNotifier::from_config(&config));
    let watermark = u64::try_from(Utc::now().timestamp()).unwrap_or_default();

    Poller::new(source, notifier, config.retry_period(), watermark)
        .run()
        .await;

    Ok(())
}
