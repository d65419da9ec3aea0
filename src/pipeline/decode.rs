use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Bytes of the document head searched for a declared charset
const META_SNIFF_BYTES: usize = 1024;

/// Decodes a fetched page into UTF-8 text
///
/// The encoding is chosen from, in order: a byte order mark, a charset
/// declared in a `<meta>` tag near the start of the document, then
/// statistical detection. Malformed sequences become U+FFFD.
pub fn decode_html(bytes: &[u8]) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Malformed {} sequences replaced", encoding.name());
    }
    text.into_owned()
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let start = head.find("<meta")?;
    let declared = head[start..].find("charset=").map(|i| start + i + "charset=".len())?;
    let label: String = head[declared..]
        .trim_start_matches(['"', '\'', ' '])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();

    // A page cannot really be UTF-16 if its meta tag was readable as ASCII
    Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
}
