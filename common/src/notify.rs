//! Outbound notification boundary.
//!
//! The poller only knows this trait; the chat provider lives in a channel
//! crate.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("message delivery failed: {0}")]
    Delivery(String),
    #[error("recipient {0} rejected the message")]
    Recipient(String),
}

/// Sends text to a single pre-configured recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}
