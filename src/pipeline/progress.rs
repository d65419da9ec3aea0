//! Progress reporting for batch runs
//!
//! The scheduler never logs directly; every per-entry event goes through a
//! [`ProgressObserver`] so callers decide what is printed and tests can
//! record outcomes.

use std::time::Duration;

/// What happened to an entry (or the batch)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The entry was dequeued and its fetch is starting
    Fetching { url: String, title: String },

    /// An attempt failed and another one follows after `delay`
    Retrying {
        url: String,
        attempt: u32,
        attempts: u32,
        delay: Duration,
        error: String,
    },

    /// The article was extracted and kept
    Extracted { title: String },

    /// The page was fetched but had no extractable content
    NoContent { url: String },

    /// The fetch failed for good and the entry was skipped
    Skipped { url: String, error: String },

    /// All workers finished
    Finished { succeeded: usize },
}

/// Receives progress for each entry as the batch runs
///
/// `index` is the 1-based dequeue position, for display only. For
/// [`Outcome::Finished`] it equals `total`.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, index: usize, total: usize, outcome: &Outcome);
}

/// Logs progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, index: usize, total: usize, outcome: &Outcome) {
        let label = format!("[{}/{}]", index, total);
        match outcome {
            Outcome::Fetching { url, title } => {
                let shown = if title.is_empty() { url } else { title };
                tracing::info!("{} Fetching: {}", label, shown);
            }
            Outcome::Retrying {
                url,
                attempt,
                attempts,
                delay,
                error,
            } => {
                tracing::warn!(
                    "{} Attempt {}/{} failed for {}: {}. Retrying in {:?}",
                    label,
                    attempt,
                    attempts,
                    url,
                    error,
                    delay
                );
            }
            Outcome::Extracted { title } => {
                tracing::info!("{} Extracted: {}", label, title);
            }
            Outcome::NoContent { url } => {
                tracing::warn!("{} Could not extract content: {}", label, url);
            }
            Outcome::Skipped { url, error } => {
                tracing::error!("{} Skipping {}: {}", label, url, error);
            }
            Outcome::Finished { succeeded } => {
                tracing::info!("Fetched {}/{} articles successfully", succeeded, total);
            }
        }
    }
}

/// Discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_progress(&self, _index: usize, _total: usize, _outcome: &Outcome) {}
}
