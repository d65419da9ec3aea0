//! Generated cover image
//!
//! The cover is an SVG drawing: a dark page with a thin frame, the book
//! title, a rule, the run date and the article count.

use html_escape::encode_text;

pub const COVER_WIDTH: u32 = 1200;
pub const COVER_HEIGHT: u32 = 1800;

const TITLE_LINE_CHARS: usize = 16;
const TITLE_MAX_LINES: usize = 3;

/// Renders the cover as an SVG document
pub fn render_cover(title: &str, date: &str, article_count: usize) -> String {
    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = COVER_WIDTH,
        h = COVER_HEIGHT
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#1a1a2e\"/>\n");
    svg.push_str(&format!(
        "<rect x=\"60\" y=\"60\" width=\"{}\" height=\"{}\" rx=\"12\" fill=\"none\" stroke=\"#e2e2e2\" stroke-width=\"3\" opacity=\"0.3\"/>\n",
        COVER_WIDTH - 120,
        COVER_HEIGHT - 120
    ));

    let lines = wrap_title(title);
    let first_baseline = 620 - (lines.len().saturating_sub(1) * 140) as u32;
    for (i, line) in lines.iter().enumerate() {
        svg.push_str(&text_element(
            first_baseline + i as u32 * 140,
            130,
            &encode_text(line),
        ));
    }

    svg.push_str(&format!(
        "<line x1=\"200\" y1=\"720\" x2=\"{}\" y2=\"720\" stroke=\"#ffffff\" stroke-width=\"3\" opacity=\"0.4\"/>\n",
        COVER_WIDTH - 200
    ));
    svg.push_str(&text_element(920, 120, &encode_text(date)));
    svg.push_str(&text_element(
        1100,
        120,
        &format!(
            "{} article{}",
            article_count,
            if article_count == 1 { "" } else { "s" }
        ),
    ));
    svg.push_str("</svg>\n");
    svg
}

fn text_element(y: u32, font_size: u32, escaped: &str) -> String {
    format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"Georgia, serif\" font-size=\"{}\" font-weight=\"bold\" fill=\"#ffffff\">{}</text>\n",
        COVER_WIDTH / 2,
        y,
        font_size,
        escaped
    )
}

/// Greedy word wrap; the last line gets an ellipsis when words are dropped
fn wrap_title(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in title.split_whitespace() {
        let fits = current.is_empty()
            || current.chars().count() + 1 + word.chars().count() <= TITLE_LINE_CHARS;
        if !fits {
            lines.push(std::mem::take(&mut current));
            if lines.len() == TITLE_MAX_LINES {
                if let Some(last) = lines.last_mut() {
                    last.push('…');
                }
                return lines;
            }
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
