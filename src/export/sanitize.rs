//! Cell sanitization.
//!
//! Database cells may hold arbitrary bytes. Before they reach the CSV encoder
//! they are coerced to UTF-8 (ill-formed sequences are dropped), every
//! non-graphic character is replaced by a single space so that a record always
//! stays on one line, and surrounding spaces are trimmed. [`sanitize`]
//! additionally doubles quotes, producing the exact text that ends up between
//! the quotes of an exported field.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Sanitizes `raw` into CSV-safe text with quotes doubled.
///
/// Never fails: empty or fully non-printable input yields an empty string.
pub fn sanitize(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    sanitize_into(raw, &mut out);
    out
}

/// Sanitizes `raw` into `out`, reusing its allocation.
pub fn sanitize_into(raw: &[u8], out: &mut String) {
    map_into(raw, out, true);
}

/// Normalizes `raw` without escaping quotes.
pub fn normalize(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    normalize_into(raw, &mut out);
    out
}

/// Normalizes `raw` into `out`, reusing its allocation.
pub fn normalize_into(raw: &[u8], out: &mut String) {
    map_into(raw, out, false);
}

fn map_into(raw: &[u8], out: &mut String, double_quotes: bool) {
    out.clear();
    for chunk in raw.utf8_chunks() {
        for ch in chunk.valid().chars() {
            match ch {
                '"' if double_quotes => out.push_str("\"\""),
                ch if is_graphic(ch) => out.push(ch),
                _ => out.push(' '),
            }
        }
    }

    let end = out.trim_end_matches(' ').len();
    out.truncate(end);
    let start = out.len() - out.trim_start_matches(' ').len();
    out.drain(..start);
}

/// Returns true for characters that render visibly on a single line.
///
/// Letters, marks, numbers, punctuation and symbols are graphic. Separators
/// (the ASCII space included), controls, format characters, surrogates,
/// private-use and unassigned code points are not.
pub fn is_graphic(ch: char) -> bool {
    !matches!(
        get_general_category(ch),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}
