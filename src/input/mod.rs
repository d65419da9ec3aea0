//! Input module for reading saved-article exports
//!
//! This module handles:
//! - Parsing Instapaper-style CSV exports into [`Entry`] values
//! - Skipping rows that belong to excluded folders
//! - Locating the newest export when no path is given

mod reader;

pub use reader::{find_latest_csv, read_entries, InputBatch};

/// Title used when neither the export nor the page provides one
pub const UNTITLED: &str = "(no title)";

/// One saved article slated for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Article URL
    pub url: String,

    /// Title as recorded in the export (empty when the export has none)
    pub title: String,

    /// Folder the article was saved in
    pub folder: String,

    /// Unix timestamp of when the article was saved (0 if unknown)
    pub timestamp: i64,
}

impl Entry {
    /// Creates an entry with only the fields the pipeline needs
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            folder: String::new(),
            timestamp: 0,
        }
    }
}
