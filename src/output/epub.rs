//! EPUB book generation
//!
//! The book opens with a generated cover and a table-of-contents chapter,
//! followed by one numbered chapter per article. Article HTML is
//! re-serialized as XHTML because EPUB readers parse chapters as XML.

use crate::output::cover::render_cover;
use crate::output::{create_dir, ArticleSink, OutputError, OutputResult, WrittenOutput};
use crate::pipeline::NormalizedArticle;
use epub_builder::{EpubBuilder, EpubContent, EpubVersion, ReferenceType, ZipLibrary};
use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html};
use std::path::PathBuf;

const EPUB_STYLE: &str = "body{font-family:Georgia,serif;line-height:1.5}\n\
img{max-width:100%;height:auto}\n\
.byline{font-style:italic}\n\
.source{font-size:0.8em;color:#666;margin-top:2em}\n";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Book-level metadata written into the package document
#[derive(Debug, Clone)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    /// BCP 47 language tag
    pub language: String,
    /// Run date (`YYYY-MM-DD`)
    pub date: String,
}

/// Writes all articles into `<output_dir>/<file_stem>-<date>.epub`
#[derive(Debug, Clone)]
pub struct EpubWriter {
    output_dir: PathBuf,
    file_stem: String,
    metadata: BookMetadata,
}

impl EpubWriter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        file_stem: impl Into<String>,
        metadata: BookMetadata,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_stem: file_stem.into(),
            metadata,
        }
    }

    /// Path the book will be written to
    pub fn path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}-{}.epub", self.file_stem, self.metadata.date))
    }

    /// Builds the complete EPUB archive in memory
    pub fn build(&self, articles: &[NormalizedArticle]) -> OutputResult<Vec<u8>> {
        if articles.is_empty() {
            return Err(OutputError::Empty);
        }

        let meta = &self.metadata;
        let description = format!(
            "Saved articles exported on {}. Contains {} articles.",
            meta.date,
            articles.len()
        );

        let zip = ZipLibrary::new().map_err(epub_error)?;
        let mut builder = EpubBuilder::new(zip).map_err(epub_error)?;
        builder.epub_version(EpubVersion::V30);
        builder
            .metadata("title", meta.title.as_str())
            .map_err(epub_error)?
            .metadata("author", meta.author.as_str())
            .map_err(epub_error)?
            .metadata("lang", meta.language.as_str())
            .map_err(epub_error)?
            .metadata("description", description.as_str())
            .map_err(epub_error)?
            .metadata("generator", "paperbind")
            .map_err(epub_error)?;
        builder
            .stylesheet(EPUB_STYLE.as_bytes())
            .map_err(epub_error)?;

        tracing::info!("Generating cover image...");
        let cover = render_cover(&meta.title, &meta.date, articles.len());
        builder
            .add_cover_image("cover.svg", cover.as_bytes(), "image/svg+xml")
            .map_err(epub_error)?;

        let toc = render_toc_page(articles, &meta.language);
        builder
            .add_content(
                EpubContent::new("toc_page.xhtml", toc.as_bytes())
                    .title("Table of Contents")
                    .reftype(ReferenceType::Toc),
            )
            .map_err(epub_error)?;

        for (i, article) in articles.iter().enumerate() {
            let number = i + 1;
            let chapter = render_chapter(article, &meta.language);
            builder
                .add_content(
                    EpubContent::new(chapter_href(number), chapter.as_bytes())
                        .title(article.title.as_str())
                        .reftype(ReferenceType::Text),
                )
                .map_err(epub_error)?;
        }

        let mut buffer = Vec::new();
        builder.generate(&mut buffer).map_err(epub_error)?;
        Ok(buffer)
    }
}

impl ArticleSink for EpubWriter {
    fn write(&self, articles: &[NormalizedArticle]) -> OutputResult<WrittenOutput> {
        tracing::info!(
            "Building EPUB \"{}\" with {} articles...",
            self.metadata.title,
            articles.len()
        );
        let epub = self.build(articles)?;

        create_dir(&self.output_dir)?;
        let path = self.path();
        std::fs::write(&path, &epub).map_err(|source| OutputError::Write {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(
            "EPUB built successfully: {} ({} KB)",
            path.display(),
            epub.len() / 1024
        );
        Ok(WrittenOutput { paths: vec![path] })
    }
}

fn epub_error(e: impl std::fmt::Display) -> OutputError {
    OutputError::Epub(e.to_string())
}

fn chapter_href(number: usize) -> String {
    format!("article_{}.xhtml", number)
}

fn xhtml_document(title: &str, language: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" lang=\"{lang}\" xml:lang=\"{lang}\">\n\
         <head>\n<meta charset=\"utf-8\"/>\n<title>{title}</title>\n\
         <link rel=\"stylesheet\" type=\"text/css\" href=\"stylesheet.css\"/>\n</head>\n\
         <body>\n{body}</body>\n</html>\n",
        lang = encode_double_quoted_attribute(language),
        title = encode_text(title),
        body = body
    )
}

/// Renders the table-of-contents chapter
pub fn render_toc_page(articles: &[NormalizedArticle], language: &str) -> String {
    let mut body = String::new();
    body.push_str("<h1>Table of Contents</h1>\n");
    body.push_str(&format!(
        "<p>{} articles in this collection.</p>\n<ol>\n",
        articles.len()
    ));
    for (i, article) in articles.iter().enumerate() {
        let byline = if article.byline.is_empty() {
            String::new()
        } else {
            format!(" <small>&#8212; {}</small>", encode_text(&article.byline))
        };
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a>{}</li>\n",
            chapter_href(i + 1),
            encode_text(&article.title),
            byline
        ));
    }
    body.push_str("</ol>\n");

    xhtml_document("Table of Contents", language, &body)
}

/// Renders one article chapter
pub fn render_chapter(article: &NormalizedArticle, language: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", encode_text(&article.title)));
    if !article.byline.is_empty() {
        body.push_str(&format!(
            "<p class=\"byline\">{}</p>\n",
            encode_text(&article.byline)
        ));
    }
    body.push_str("<hr/>\n");
    body.push_str(&to_xhtml(&article.content));
    body.push('\n');
    body.push_str(&format!(
        "<p class=\"source\">Source: <a href=\"{}\">{}</a></p>\n",
        encode_double_quoted_attribute(&article.url),
        encode_text(&article.url)
    ));

    xhtml_document(&article.title, language, &body)
}

/// Re-serializes an HTML fragment as well-formed XHTML
///
/// Void elements are self-closed, text and attribute values are escaped,
/// and comments plus attributes that are not valid XML names are dropped.
pub fn to_xhtml(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        if let Some(element) = ElementRef::wrap(child) {
            write_element(element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(&encode_text(&**text));
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if !is_xml_name(attr) {
            continue;
        }
        out.push_str(&format!(
            " {}=\"{}\"",
            attr,
            encode_double_quoted_attribute(value)
        ));
    }

    if VOID_ELEMENTS.contains(&name) {
        out.push_str("/>");
        return;
    }

    out.push('>');
    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}
