//! Normalization of localized text extracted from templates.
//!
//! Templates exported by modeling tools carry HTML `<br>` remnants, CR line
//! endings and decorative whitespace runs inside `name`/`documentation`
//! children. Everything downstream (merge keys, render labels, documentation
//! re-encoding) assumes the cleaned form produced here.

use regex::Regex;
use std::sync::OnceLock;

fn break_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<\s*/?\s*br\s*/?\s*>").unwrap())
}

fn inline_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0b\x0c]+").unwrap())
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

/// Cleans raw text content: `<br>` variants become newlines, CRs become LFs,
/// inline whitespace runs collapse to a single space and more than one blank
/// line in a row collapses to one.
pub fn clean_text(value: &str) -> String {
    let normalized = break_tag_re().replace_all(value, "\n");
    let normalized = normalized.replace('\r', "\n");
    let normalized = inline_ws_re().replace_all(&normalized, " ");
    let normalized = normalized.replace(" \n", "\n").replace("\n ", "\n");
    let normalized = blank_run_re().replace_all(&normalized, "\n\n");
    normalized.trim().to_string()
}

/// Like [`clean_text`] but maps empty results to `None`.
pub fn clean_text_opt(value: &str) -> Option<String> {
    let cleaned = clean_text(value);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Truncates to `limit` characters, appending an ellipsis when shortened.
pub fn truncate(text: &str, limit: usize) -> String {
    let count = text.chars().count();
    if count <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_normalizes_breaks_and_whitespace() {
        assert_eq!(clean_text("a<br/>b<BR >c"), "a\nb\nc");
        assert_eq!(clean_text("  a \t b  "), "a b");
        assert_eq!(clean_text("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(clean_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_text("a \n b"), "a\nb");
    }

    #[test]
    fn clean_text_opt_drops_empty() {
        assert_eq!(clean_text_opt("   "), None);
        assert_eq!(clean_text_opt(" x "), Some("x".to_string()));
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
