use std::sync::LazyLock;

use regex::Regex;

use super::lists::NSFW_KEYWORDS;

/// Token reported when one of the [`CONTEXT_PATTERNS`] matches.
pub const CONTEXT_TOKEN: &str = "contextual_nsfw_pattern";

/// One regex per keyword, in the same order as [`NSFW_KEYWORDS`].
static KEYWORD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NSFW_KEYWORDS
        .iter()
        .map(|keyword| Regex::new(&keyword_pattern(keyword)).expect("Regex will always be valid"))
        .collect()
});

/// Deliberate misspellings people use to dodge filters. No word boundaries here.
static OBFUSCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"p[0o]rn", r"s[3e]x", r"xxx+", r"n[5s]fw", r"[0o]nlyfans?"]
        .into_iter()
        .map(|x| Regex::new(x).expect("Regex will always be valid"))
        .collect()
});

/// Phrases that are only suspicious as a whole.
static CONTEXT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\.(?:jpg|jpeg|png|gif|mp4|avi|mkv|mov).*(?:nude|sex|porn|xxx)",
        r"(?:barely|teen|young).*(?:legal|18)",
        r"(?:hot|sexy|nude).*(?:girls?|women|babes?)",
        r"(?:amateur|homemade).*(?:sex|porn)",
    ]
    .into_iter()
    .map(|x| Regex::new(x).expect("Regex will always be valid"))
    .collect()
});

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Build a case-insensitive whole-word pattern for `keyword`.
///
/// A `\b` only makes sense next to a word character, so keywords like `18+`
/// get a boundary on the left side only.
fn keyword_pattern(keyword: &str) -> String {
    let mut pattern = String::from("(?i)");

    if keyword.chars().next().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(keyword));
    if keyword.chars().last().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }

    pattern
}

/// Find adult-content keywords in `text`.
///
/// Returns every match, lowercased, in a stable order: vocabulary hits first,
/// then obfuscated spellings, then at most one [`CONTEXT_TOKEN`].
pub fn detect_keywords(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let text = text.to_lowercase();
    let mut found = Vec::new();

    for pattern in KEYWORD_PATTERNS.iter().chain(OBFUSCATION_PATTERNS.iter()) {
        found.extend(pattern.find_iter(&text).map(|x| x.as_str().to_owned()));
    }

    if CONTEXT_PATTERNS.iter().any(|x| x.is_match(&text)) {
        found.push(CONTEXT_TOKEN.to_owned());
    }

    found
}

/// Format up to the first three matches for a human-readable reason.
pub fn summarize(found: &[String]) -> String {
    found
        .iter()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
