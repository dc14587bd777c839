//! The polling loop: fetch, validate, format, and notify on change.

use common::notify::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info};

use crate::api::StatusSource;
use crate::error::PollError;
use crate::status::{check_response, failure_message, status_message};

/// What a single iteration ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The computed message matched the last one sent.
    Unchanged,
    /// A new message was sent and remembered.
    Notified,
    /// A new message was computed but could not be sent; state is untouched.
    NotifyFailed,
}

/// Text computed for one cycle, plus the watermark to adopt if it is sent.
struct Report {
    message: String,
    next_watermark: Option<u64>,
}

pub struct Poller {
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    last_message: Option<String>,
    watermark: u64,
}

impl Poller {
    pub fn new(
        source: Arc<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        watermark: u64,
    ) -> Self {
        Self {
            source,
            notifier,
            interval,
            last_message: None,
            watermark,
        }
    }

    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Poll forever, sleeping `interval` after every cycle.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.interval.as_secs(),
            watermark = self.watermark,
            "Homework poller started"
        );
        loop {
            let outcome = self.run_once().await;
            debug!(?outcome, "Cycle finished");
            time::sleep(self.interval).await;
        }
    }

    /// One iteration without the trailing sleep.
    pub async fn run_once(&mut self) -> CycleOutcome {
        let report = match self.poll().await {
            Ok(report) => report,
            Err(e) => {
                error!("Poll cycle failed: {}", e);
                Report {
                    message: failure_message(&e),
                    next_watermark: None,
                }
            }
        };

        if self.last_message.as_deref() == Some(report.message.as_str()) {
            debug!("No changes since last notification");
            return CycleOutcome::Unchanged;
        }

        info!("New status to report");
        if let Err(e) = self.notifier.send(&report.message).await {
            let e = PollError::from(e);
            error!("Notification failed, will retry next cycle: {}", e);
            return CycleOutcome::NotifyFailed;
        }

        if let Some(watermark) = report.next_watermark {
            self.watermark = watermark;
        }
        self.last_message = Some(report.message);
        CycleOutcome::Notified
    }

    async fn poll(&self) -> Result<Report, PollError> {
        let body = self.source.fetch(self.watermark).await?;
        let result = check_response(body)?;
        let message = status_message(&result)?;
        Ok(Report {
            message,
            next_watermark: result.current_date,
        })
    }
}
