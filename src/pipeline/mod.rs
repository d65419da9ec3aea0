//! Fetch-and-extract pipeline
//!
//! This module contains the core of Paperbind:
//! - HTTP fetching with fixed-delay retry
//! - Charset detection for fetched pages
//! - Readable-content extraction and normalization
//! - A bounded worker pool that drains the entry queue
//! - Progress reporting through an injected observer

mod decode;
mod extractor;
mod fetcher;
mod progress;
mod scheduler;

pub use decode::decode_html;
pub use extractor::{
    extract_article, normalize, sanitize_content, ExtractedContent, Extractor, NormalizedArticle,
    ReadabilityExtractor,
};
pub use fetcher::{
    fetch_with_retry, FetchError, FetchErrorKind, FetchFailure, Fetcher, HttpFetcher, RetryPolicy,
};
pub use progress::{NullObserver, Outcome, ProgressObserver, TracingObserver};
pub use scheduler::{BatchReport, Pipeline, PipelineSettings, SkipReason, SkippedEntry};
