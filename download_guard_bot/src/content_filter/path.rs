use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use super::keywords::{detect_keywords, summarize};

static PATH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/(?:porn|sex|xxx|adult|nude|nsfw)/",
        r"/(?:category|tag)/.*(?:porn|sex|xxx|adult)",
        r"/(?:watch|video|stream)/.*(?:sex|porn|xxx)",
        r"\.(?:jpg|jpeg|png|gif|mp4|avi).*(?:nude|sex|porn)",
    ]
    .into_iter()
    .map(|x| Regex::new(x).expect("Regex will always be valid"))
    .collect()
});

/// Path, query and fragment of the URL glued together, percent-decoded and lowercased.
fn decoded_path(url: &Url) -> String {
    let mut raw = String::from(url.path());
    raw.push_str(url.query().unwrap_or_default());
    raw.push_str(url.fragment().unwrap_or_default());

    percent_decode_str(&raw).decode_utf8_lossy().to_lowercase()
}

/// Look for adult content hints in everything after the host.
/// Returns the reason if something was found.
pub fn analyze_path(url: &Url) -> Option<String> {
    let path = decoded_path(url);

    if let Some(pattern) = PATH_PATTERNS.iter().find(|x| x.is_match(&path)) {
        return Some(format!("NSFW path pattern: {}", pattern.as_str()));
    }

    let found = detect_keywords(&path);
    if found.is_empty() {
        return None;
    }

    Some(format!("NSFW keywords in path: {}", summarize(&found)))
}
