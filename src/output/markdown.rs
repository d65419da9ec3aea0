//! Per-article markdown export
//!
//! Each article becomes `<output_dir>/md/<sanitized title>.md` with a title
//! heading, a source line and the content converted from HTML.

use crate::output::{create_dir, sanitize_filename, short_hash, write_file, ArticleSink, OutputResult, WrittenOutput};
use crate::pipeline::NormalizedArticle;
use std::collections::HashSet;
use std::path::PathBuf;

/// Writes one markdown file per article
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    output_dir: PathBuf,
}

impl MarkdownWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the markdown files go to
    pub fn markdown_dir(&self) -> PathBuf {
        self.output_dir.join("md")
    }
}

impl ArticleSink for MarkdownWriter {
    fn write(&self, articles: &[NormalizedArticle]) -> OutputResult<WrittenOutput> {
        let dir = self.markdown_dir();
        create_dir(&dir)?;

        let mut used = HashSet::new();
        let mut paths = Vec::with_capacity(articles.len());

        for article in articles {
            let mut stem = sanitize_filename(&article.title);
            if !used.insert(stem.clone()) {
                // Same title twice in one run
                stem = format!("{}-{}", stem, short_hash(&article.url));
                used.insert(stem.clone());
            }

            let path = dir.join(format!("{}.md", stem));
            paths.push(write_file(path, &render_markdown(article))?);
        }

        tracing::info!("{} markdown file(s) saved to {}", paths.len(), dir.display());

        Ok(WrittenOutput { paths })
    }
}

/// Renders one article as a markdown document
pub fn render_markdown(article: &NormalizedArticle) -> String {
    let body = html2md::parse_html(&article.content);

    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", article.title));
    if !article.byline.is_empty() {
        md.push_str(&format!("*{}*\n\n", article.byline));
    }
    md.push_str(&format!("> Source: {}\n\n", article.url));
    md.push_str("---\n\n");
    md.push_str(body.trim());
    md.push('\n');
    md
}
