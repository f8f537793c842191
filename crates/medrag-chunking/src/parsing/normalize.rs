//! Whitespace normalization applied before section detection

use regex::Regex;
use std::sync::OnceLock;

static HYPHEN_BREAK: OnceLock<Option<Regex>> = OnceLock::new();
static INLINE_BLANKS: OnceLock<Option<Regex>> = OnceLock::new();
static LINE_EDGES: OnceLock<Option<Regex>> = OnceLock::new();
static EXCESS_BREAKS: OnceLock<Option<Regex>> = OnceLock::new();

fn replace_all(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
    text: &str,
    replacement: &str,
) -> String {
    match cell.get_or_init(|| Regex::new(pattern).ok()) {
        Some(re) => re.replace_all(text, replacement).into_owned(),
        None => text.to_string(),
    }
}

/// Normalize abstract text
///
/// Rejoins words hyphenated across a line break (`hyphen-\nated`), collapses
/// runs of spaces and tabs, strips blanks around newlines and caps
/// consecutive blank lines at one. Single newlines survive so headings on
/// their own line stay detectable.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = replace_all(
        &HYPHEN_BREAK,
        r"(\p{L})-[ \t]*\n[ \t]*(\p{Ll})",
        &text,
        "$1$2",
    );
    let text = replace_all(
        &INLINE_BLANKS,
        r"[ \t\u{a0}\u{2009}\u{202f}]+",
        &text,
        " ",
    );
    let text = replace_all(&LINE_EDGES, r" ?\n ?", &text, "\n");
    let text = replace_all(&EXCESS_BREAKS, r"\n{3,}", &text, "\n\n");
    text.trim().to_string()
}
