//! Output module for packaging extracted articles
//!
//! This module handles:
//! - The [`ArticleSink`] boundary between the pipeline and packaging
//! - EPUB books with a generated cover and a table of contents
//! - A single-file offline HTML book with a table of contents
//! - One markdown file per article
//! - Filesystem-safe file naming

mod cover;
mod epub;
mod filename;
mod html_book;
mod markdown;

pub use cover::render_cover;
pub use epub::{render_chapter, render_toc_page, to_xhtml, BookMetadata, EpubWriter};
pub use filename::{sanitize_filename, short_hash};
pub use html_book::{render_book, HtmlBookWriter};
pub use markdown::{render_markdown, MarkdownWriter};

use crate::pipeline::NormalizedArticle;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to build EPUB: {0}")]
    Epub(String),

    #[error("Nothing to write: article list is empty")]
    Empty,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Files produced by a sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenOutput {
    pub paths: Vec<PathBuf>,
}

/// Packaging collaborator that consumes the extracted articles
///
/// Articles arrive in completion order; sinks that need a stable order
/// must sort them themselves.
pub trait ArticleSink {
    fn write(&self, articles: &[NormalizedArticle]) -> OutputResult<WrittenOutput>;
}

pub(crate) fn write_file(path: PathBuf, contents: &str) -> OutputResult<PathBuf> {
    std::fs::write(&path, contents).map_err(|source| OutputError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}

pub(crate) fn create_dir(path: &std::path::Path) -> OutputResult<()> {
    std::fs::create_dir_all(path).map_err(|source| OutputError::Write {
        path: path.display().to_string(),
        source,
    })
}
