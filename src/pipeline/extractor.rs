//! Readable-content extraction
//!
//! Raw page bytes are turned into a [`NormalizedArticle`] in two steps:
//! an [`Extractor`] finds the main content, then [`normalize`] applies title
//! precedence, byline defaults and HTML sanitization.

use crate::input::{Entry, UNTITLED};
use crate::pipeline::decode::decode_html;
use scraper::{Html, Selector};
use std::io::Cursor;
use url::Url;

/// Elements dropped from extracted content
const REMOVED_ELEMENTS: &str = "script, style, noscript, iframe, object, embed, link, meta";

/// Raw output of the extraction capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub byline: Option<String>,
    /// Main-content HTML
    pub content: String,
}

/// A successfully fetched and extracted article, ready for packaging
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedArticle {
    pub url: String,
    /// Never empty
    pub title: String,
    /// Empty when unknown
    pub byline: String,
    /// Sanitized HTML
    pub content: String,
}

/// Main-content detection over a fetched page
///
/// Returning `None` means the page has no extractable article (paywalls,
/// index pages, non-HTML bodies). It is an expected outcome, not an error.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &[u8], url: &Url) -> Option<ExtractedContent>;
}

/// [`Extractor`] backed by the `readability` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityExtractor;

impl Extractor for ReadabilityExtractor {
    fn extract(&self, html: &[u8], url: &Url) -> Option<ExtractedContent> {
        let text = decode_html(html);
        let mut reader = Cursor::new(text.as_bytes());
        let product = match readability::extractor::extract(&mut reader, url) {
            Ok(product) => product,
            Err(e) => {
                tracing::debug!("Readability failed for {}: {}", url, e);
                return None;
            }
        };

        if product.content.trim().is_empty() || product.text.trim().is_empty() {
            return None;
        }

        let document = Html::parse_document(&text);

        Some(ExtractedContent {
            title: Some(product.title).filter(|t| !t.trim().is_empty()),
            byline: extract_byline(&document),
            content: product.content,
        })
    }
}

/// Looks up the article author from common metadata locations
///
/// Sources are tried in order: `<meta name="author">`,
/// `<meta property="article:author">` (unless it is a profile URL),
/// `rel="author"` links and `.byline` elements.
fn extract_byline(document: &Html) -> Option<String> {
    let meta_sources = ["meta[name='author']", "meta[property='article:author']"];
    for source in meta_sources {
        let Ok(selector) = Selector::parse(source) else {
            continue;
        };
        let found = document
            .select(&selector)
            .filter_map(|element| element.value().attr("content"))
            .map(collapse_whitespace)
            .find(|value| !value.is_empty() && !value.starts_with("http"));
        if found.is_some() {
            return found;
        }
    }

    for source in ["[rel='author']", ".byline"] {
        let Ok(selector) = Selector::parse(source) else {
            continue;
        };
        let found = document
            .select(&selector)
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .find(|value| !value.is_empty());
        if found.is_some() {
            return found;
        }
    }

    None
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes active and embedded content from extracted HTML
///
/// Drops scripts, styles, frames and embeds, and any `<img>` whose `src`
/// is not an absolute http(s) URL (data URIs and unresolved relative paths
/// cannot be displayed offline).
pub fn sanitize_content(html: &str) -> String {
    let mut fragment = Html::parse_fragment(html);

    let mut removed = Vec::new();
    if let Ok(selector) = Selector::parse(REMOVED_ELEMENTS) {
        removed.extend(fragment.select(&selector).map(|element| element.id()));
    }
    if let Ok(selector) = Selector::parse("img") {
        removed.extend(
            fragment
                .select(&selector)
                .filter(|img| !has_remote_src(img.value().attr("src")))
                .map(|img| img.id()),
        );
    }

    for id in removed {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    fragment.root_element().inner_html()
}

fn has_remote_src(src: Option<&str>) -> bool {
    let Some(src) = src.map(str::trim) else {
        return false;
    };
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Builds the normalized article for an entry
///
/// The export title wins over the extracted one because it is usually
/// cleaner; `"(no title)"` is used when both are empty.
pub fn normalize(entry: &Entry, extracted: ExtractedContent) -> NormalizedArticle {
    let entry_title = entry.title.trim();
    let title = if !entry_title.is_empty() {
        entry_title.to_string()
    } else {
        extracted
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string())
    };

    NormalizedArticle {
        url: entry.url.clone(),
        title,
        byline: extracted.byline.unwrap_or_default(),
        content: sanitize_content(&extracted.content),
    }
}

/// Runs an extractor on fetched bytes and normalizes the result
///
/// Returns `None` when the entry URL does not parse or the extractor finds
/// nothing to keep.
pub fn extract_article(
    extractor: &dyn Extractor,
    html: &[u8],
    entry: &Entry,
) -> Option<NormalizedArticle> {
    let url = match Url::parse(&entry.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Cannot use {} as base URL: {}", entry.url, e);
            return None;
        }
    };

    extractor
        .extract(html, &url)
        .map(|extracted| normalize(entry, extracted))
}
