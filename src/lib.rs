//! Paperbind: read-it-later exports to offline books
//!
//! This crate turns an exported list of saved articles into a single
//! offline-readable book. It fetches every article concurrently, extracts the
//! readable content, hands the normalized articles to an output sink and can
//! email the finished EPUB.

pub mod config;
pub mod delivery;
pub mod input;
pub mod output;
pub mod pipeline;

use thiserror::Error;

/// Main error type for Paperbind operations
#[derive(Debug, Error)]
pub enum PaperbindError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Delivery error: {0}")]
    Email(#[from] delivery::EmailError),

    #[error("No input CSV found in {0}")]
    NoInput(String),

    #[error("No articles could be extracted ({total} entries attempted)")]
    BatchEmpty { total: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Paperbind operations
pub type Result<T> = std::result::Result<T, PaperbindError>;

// Re-export commonly used types
pub use config::Config;
pub use input::Entry;
pub use pipeline::{BatchReport, NormalizedArticle, Pipeline};
