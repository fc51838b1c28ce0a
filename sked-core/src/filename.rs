//! Suggested file names for downloaded calendar files.

const MAX_STEM_CHARS: usize = 80;
const FALLBACK_STEM: &str = "event";

/// Deterministic `.ics` file name for an event title.
///
/// Keeps non-ASCII letters (titles are often Korean) but drops anything a
/// filesystem or a header would choke on.
pub fn suggested_file_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                ' '
            } else {
                c
            }
        })
        .collect();

    let stem = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches('.')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect::<String>();
    let stem = stem.trim();

    if stem.is_empty() {
        format!("{FALLBACK_STEM}.ics")
    } else {
        format!("{stem}.ics")
    }
}

/// ASCII-only variant for the plain `filename=` parameter.
pub fn ascii_fallback(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `Content-Disposition` value with an RFC 5987 `filename*` for UTF-8 names.
pub fn content_disposition(file_name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback(file_name),
        urlencoding::encode(file_name)
    )
}
