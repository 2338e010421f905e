use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\w\s.,!?'";:\[\]()&-]"#).expect("valid character filter")
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Clean raw subtitle text into a single transcript line
///
/// Keeps word characters, whitespace and `. , ! ? ' " ; : [ ] ( ) & -`;
/// every whitespace run (line breaks included) becomes one space. Word
/// characters are Unicode-aware and include combining marks, so a decomposed
/// accent stays attached to its letter and counts as a character.
pub fn normalize_text(raw: &str) -> String {
    let filtered = DISALLOWED_CHARS.replace_all(raw, "");
    let collapsed = WHITESPACE_RUN.replace_all(&filtered, " ");
    collapsed.trim().to_string()
}
