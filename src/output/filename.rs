use sha2::{Digest, Sha256};

const MAX_FILENAME_CHARS: usize = 200;

/// Turns an article title into a file name stem
///
/// Characters that are illegal or awkward on common filesystems become `-`,
/// whitespace runs collapse to one space, and the result is capped at 200
/// characters. An empty result becomes `untitled`.
pub fn sanitize_filename(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if is_forbidden(c) { '-' } else { c })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_FILENAME_CHARS).collect();
    let trimmed = truncated.trim_end_matches(|c: char| c == '-' || c.is_whitespace());

    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(
        c,
        '/' | '\\' | ':' | '?' | '*' | '"' | '<' | '>' | '|' | '#' | '%' | '&' | '{' | '}' | '$'
            | '!' | '\'' | '@' | '+' | '`' | '='
    ) || (c.is_control() && !c.is_whitespace())
}

/// First 8 hex characters of the SHA-256 of `input`
pub fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_forbidden() {
        assert_eq!(sanitize_filename("What's new: Rust 2.0?"), "What-s new- Rust 2.0");
        assert_eq!(sanitize_filename("a/b\\c"), "a-b-c");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_filename("  many   spaces\there "), "many spaces here");
        assert_eq!(sanitize_filename("line\r\nbreak\nhere"), "line break here");
    }

    #[test]
    fn test_sanitize_replaces_non_whitespace_controls() {
        assert_eq!(sanitize_filename("bell\u{7}here"), "bell-here");
    }

    #[test]
    fn test_sanitize_truncates_and_trims() {
        let long = format!("{}!!!", "x".repeat(MAX_FILENAME_CHARS - 1));
        let name = sanitize_filename(&long);
        assert_eq!(name, "x".repeat(MAX_FILENAME_CHARS - 1));
    }

    #[test]
    fn test_sanitize_empty_is_untitled() {
        assert_eq!(sanitize_filename(""), "untitled");
        assert_eq!(sanitize_filename("???"), "untitled");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("Čitanje – članci"), "Čitanje – članci");
    }

    #[test]
    fn test_short_hash() {
        let hash = short_hash("https://example.com/a");
        assert_eq!(hash.len(), 8);
        assert_eq!(hash, short_hash("https://example.com/a"));
        assert_ne!(hash, short_hash("https://example.com/b"));
    }
}
