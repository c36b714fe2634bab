//! Text preparation for model calls.

use regex::Regex;

/// Drop every non-ASCII character. Nothing is escaped or replaced.
pub fn sanitize_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Trim a completion and collapse line-break runs and blank runs.
pub fn normalize_completion(text: &str) -> String {
    let mut text = text.trim().to_string();
    if let Ok(line_breaks) = Regex::new(r"[\r\n]+") {
        text = line_breaks.replace_all(&text, "\n").into_owned();
    }
    if let Ok(blanks) = Regex::new(r"[\t ]+") {
        text = blanks.replace_all(&text, " ").into_owned();
    }
    text
}
