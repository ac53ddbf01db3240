//! Strict-format parsers for model output.
//!
//! Both parsers only remove structure; they never add words to what the
//! model returned.

use crate::patterns::INDUSTRY_FILLER;
use regex::Regex;
use std::sync::LazyLock;

/// A `[...]` span on one line with no nested brackets.
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]\n]+)\]").expect("valid regex"));

static THESIS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^investment\s+thesis:\s*").expect("valid regex"));

static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s:;,\-–—]+$").expect("valid regex"));

const WRAPPERS: &[char] = &['[', ']', '<', '>', '"', '\'', '`'];

/// Pulls industry names out of a bracketed list.
///
/// Spans whose lowercase text contains a filler phrase are dropped. Order
/// of appearance is kept and repeats are not removed.
pub fn extract_industries(model_output: &str) -> Vec<String> {
    BRACKETED
        .captures_iter(model_output)
        .filter_map(|caps| caps.get(1))
        .map(|span| span.as_str())
        .filter(|span| {
            let lower = span.to_lowercase();
            !INDUSTRY_FILLER.iter().any(|phrase| lower.contains(*phrase))
        })
        .map(|span| span.trim().to_string())
        .filter(|span| !span.is_empty())
        .collect()
}

/// Cleans a thesis answer down to the quoted excerpt, or `""`.
///
/// The `Investment Thesis:` label is dropped whether it sits outside or
/// inside the wrapper characters.
pub fn extract_thesis(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    let unlabeled = THESIS_LABEL.replace(text, "");
    let peeled = peel_wrappers(unlabeled.trim());
    let peeled = THESIS_LABEL.replace(peeled, "");

    let cleaned: String = peeled.chars().filter(|c| !WRAPPERS.contains(c)).collect();
    let cleaned = TRAILING_PUNCTUATION.replace(cleaned.trim(), "");

    cleaned.trim().to_string()
}

fn peel_wrappers(mut text: &str) -> &str {
    while let Some(rest) = text.strip_prefix(WRAPPERS) {
        text = rest.trim();
    }
    while let Some(rest) = text.strip_suffix(WRAPPERS) {
        text = rest.trim();
    }
    text
}
