//! Homework review status poller.
//!
//! Each cycle fetches updates since the last watermark, validates the
//! response, turns the newest homework into a message, and forwards it
//! through a [`common::notify::Notifier`] only when it differs from the
//! last message delivered. Failures go through the same dedup path.

pub mod api;
pub mod error;
pub mod logging;
pub mod poller;
pub mod startup;
pub mod status;

pub use api::{PracticumClient, RetryPolicy, StatusSource};
pub use error::{Malformed, PollError};
pub use poller::{CycleOutcome, Poller};
