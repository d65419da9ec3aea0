//! Single-file HTML book generation
//!
//! The book is one self-contained XHTML-compatible document: a title page,
//! a numbered table of contents with in-document links, then one section per
//! article ending with a link to its source.

use crate::output::{create_dir, write_file, ArticleSink, OutputError, OutputResult, WrittenOutput};
use html_escape::{encode_double_quoted_attribute, encode_text};
use crate::pipeline::NormalizedArticle;
use std::path::PathBuf;

const BOOK_STYLE: &str = "body{font-family:Georgia,serif;max-width:40em;margin:auto;padding:1em;line-height:1.5}\
img{max-width:100%;height:auto}\
.byline{font-style:italic}\
.source{font-size:0.8em;color:#666;margin-top:2em}\
section.article{page-break-before:always}";

/// Writes all articles into `<output_dir>/<file_stem>-<date>.html`
#[derive(Debug, Clone)]
pub struct HtmlBookWriter {
    output_dir: PathBuf,
    file_stem: String,
    title: String,
    date: String,
}

impl HtmlBookWriter {
    /// Creates a writer
    ///
    /// # Arguments
    ///
    /// * `output_dir` - Directory the book is written to (created if missing)
    /// * `file_stem` - File name prefix
    /// * `title` - Book title shown on the title page
    /// * `date` - Run date, used in the file name and on the title page
    pub fn new(
        output_dir: impl Into<PathBuf>,
        file_stem: impl Into<String>,
        title: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_stem: file_stem.into(),
            title: title.into(),
            date: date.into(),
        }
    }

    /// Path the book will be written to
    pub fn path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}-{}.html", self.file_stem, self.date))
    }
}

impl ArticleSink for HtmlBookWriter {
    fn write(&self, articles: &[NormalizedArticle]) -> OutputResult<WrittenOutput> {
        if articles.is_empty() {
            return Err(OutputError::Empty);
        }

        create_dir(&self.output_dir)?;

        tracing::info!(
            "Building book \"{}\" with {} articles",
            self.title,
            articles.len()
        );
        let html = render_book(&self.title, &self.date, articles);
        let path = write_file(self.path(), &html)?;

        tracing::info!(
            "Book written to {} ({} KB)",
            path.display(),
            html.len() / 1024
        );

        Ok(WrittenOutput { paths: vec![path] })
    }
}

/// Renders the complete book document
pub fn render_book(title: &str, date: &str, articles: &[NormalizedArticle]) -> String {
    let mut html = String::new();
    let title = encode_text(title);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str(&format!("<style>{}</style>\n", BOOK_STYLE));
    html.push_str("</head>\n<body>\n");

    // Title page
    html.push_str("<header class=\"title-page\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", title));
    html.push_str(&format!(
        "<p>{} &middot; {} article{}</p>\n",
        encode_text(date),
        articles.len(),
        if articles.len() == 1 { "" } else { "s" }
    ));
    html.push_str("</header>\n");

    html.push_str(&render_toc(articles));

    for (i, article) in articles.iter().enumerate() {
        html.push_str(&render_article(article, i + 1));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_toc(articles: &[NormalizedArticle]) -> String {
    let mut toc = String::new();
    toc.push_str("<nav id=\"toc\">\n<h1>Table of Contents</h1>\n");
    toc.push_str(&format!(
        "<p>{} articles in this collection.</p>\n<ol>\n",
        articles.len()
    ));

    for (i, article) in articles.iter().enumerate() {
        let byline = if article.byline.is_empty() {
            String::new()
        } else {
            format!(" <small>&mdash; {}</small>", encode_text(&article.byline))
        };
        toc.push_str(&format!(
            "<li><a href=\"#article-{}\">{}</a>{}</li>\n",
            i + 1,
            encode_text(&article.title),
            byline
        ));
    }

    toc.push_str("</ol>\n</nav>\n");
    toc
}

fn render_article(article: &NormalizedArticle, number: usize) -> String {
    let mut section = String::new();
    section.push_str(&format!(
        "<section class=\"article\" id=\"article-{}\">\n",
        number
    ));
    section.push_str(&format!("<h1>{}</h1>\n", encode_text(&article.title)));
    if !article.byline.is_empty() {
        section.push_str(&format!(
            "<p class=\"byline\">{}</p>\n",
            encode_text(&article.byline)
        ));
    }
    section.push_str("<hr/>\n");
    section.push_str(&article.content);
    section.push('\n');
    section.push_str(&format!(
        "<p class=\"source\">Source: <a href=\"{}\">{}</a></p>\n",
        encode_double_quoted_attribute(&article.url),
        encode_text(&article.url)
    ));
    section.push_str("</section>\n");
    section
}
