use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::lists::{NSFW_DOMAINS, NSFW_HOST_PATHS, SAFE_DOMAINS};

/// Substrings of a host that make it look like an adult site.
static SUSPICIOUS_HOST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "porn",
        "xxx",
        "sex",
        "adult",
        "nude",
        "cam",
        "live.*sex",
        "free.*porn",
        "hot.*girls",
    ]
    .into_iter()
    .map(|x| Regex::new(x).expect("Regex will always be valid"))
    .collect()
});

/// What the domain check has to say about a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainVerdict {
    /// The host is on the NSFW list, or under a listed host.
    Known(String),
    /// The host merely looks like an adult site.
    Suspicious(String),
    /// The host is on the safe list.
    Safe,
    /// Nothing to say.
    Clean,
}

/// Host of the URL, lowercased and with a leading `www.` removed.
/// Returns [`None`] if the URL has no host at all, like `magnet:` links.
pub fn normalize_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => Some(stripped.to_owned()),
        None => Some(host),
    }
}

/// `true` if `host` is `domain` itself or one of its subdomains.
///
/// Unlike a plain suffix check, `notpornhub.com` is not under `pornhub.com`.
pub fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    match host.strip_suffix(domain) {
        Some("") => true,
        Some(rest) => rest.ends_with('.'),
        None => false,
    }
}

#[must_use]
pub fn is_safe_host(host: &str) -> bool {
    SAFE_DOMAINS.contains(&host)
}

/// Check a normalized `host` (see [`normalize_host`]) and the URL `path`.
pub fn check_domain(host: &str, path: &str) -> DomainVerdict {
    if NSFW_DOMAINS.contains(&host) {
        return DomainVerdict::Known(format!("Known NSFW domain: {host}"));
    }

    if let Some(parent) = NSFW_DOMAINS
        .iter()
        .find(|domain| is_same_or_subdomain(host, domain))
    {
        return DomainVerdict::Known(format!("NSFW subdomain of: {parent}"));
    }

    let path = path.to_lowercase();
    for entry in NSFW_HOST_PATHS {
        let Some((entry_host, entry_path)) = entry.split_once('/') else {
            continue;
        };
        // Entries are stored without the leading slash.
        let under_path = path
            .strip_prefix('/')
            .is_some_and(|x| x.starts_with(entry_path));

        if under_path && is_same_or_subdomain(host, entry_host) {
            return DomainVerdict::Known(format!("Known NSFW domain: {entry}"));
        }
    }

    if is_safe_host(host) {
        return DomainVerdict::Safe;
    }

    for pattern in SUSPICIOUS_HOST_PATTERNS.iter() {
        if pattern.is_match(host) {
            return DomainVerdict::Suspicious(format!(
                "Suspicious domain pattern: {}",
                pattern.as_str()
            ));
        }
    }

    DomainVerdict::Clean
}
