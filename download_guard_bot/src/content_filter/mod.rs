use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;

use crate::misc::parse_url_like_telegram;

use self::domain::DomainVerdict;
pub use self::policy::{decide, NsfwPolicy, Strictness};
pub use self::stats::FilterStatsSnapshot;
use self::stats::FilterStats;

mod domain;
mod keywords;
pub mod lists;
mod path;
mod policy;
mod stats;

pub use domain::{is_same_or_subdomain, normalize_host};
pub use keywords::detect_keywords;

// Each signal adds its weight to the confidence. The sum is not capped.
const KNOWN_DOMAIN_WEIGHT: f64 = 0.8;
const SUSPICIOUS_DOMAIN_WEIGHT: f64 = 0.6;
const PATH_WEIGHT: f64 = 0.6;
const TITLE_WEIGHT: f64 = 0.7;
const DESCRIPTION_WEIGHT: f64 = 0.5;
/// Confidence on safe hosts gets multiplied by this.
const SAFE_DOMAIN_DAMPENING: f64 = 0.3;
/// Confidence at which flagged content is blocked when the user has no preferences.
pub const DEFAULT_BLOCK_THRESHOLD: f64 = 0.5;

/// Outcome of a [`ContentFilter::scan`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    /// Whether any signal fired at all.
    pub is_flagged: bool,
    /// Sum of the weights of signals that fired. Not a probability, can exceed 1.0.
    pub confidence: f64,
    /// Human-readable description of every signal that fired, in order.
    pub reasons: Vec<String>,
    /// Verdict under the default threshold.
    pub blocked: bool,
    /// The host is a known safe one and the confidence was dampened.
    pub safe_override: bool,
}

impl ScanResult {
    fn flag(&mut self, weight: f64, reason: String) {
        self.is_flagged = true;
        self.confidence += weight;
        self.reasons.push(reason);
    }
}

/// Cache key. The inputs are kept apart so different splits of the same
/// concatenated string don't collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScanKey {
    url: String,
    title: String,
    description: String,
}

/// Keyword and list based adult content classifier.
///
/// Build one at startup and share it. Reference data is immutable; only the
/// result cache and the counters change.
pub struct ContentFilter {
    cache: Mutex<LruCache<ScanKey, ScanResult>>,
    stats: FilterStats,
}

impl ContentFilter {
    pub fn new(cache_capacity: NonZeroUsize) -> ContentFilter {
        ContentFilter {
            cache: Mutex::new(LruCache::new(cache_capacity)),
            stats: FilterStats::default(),
        }
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<ScanKey, ScanResult>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Classify a URL, optionally with the title and description of what it points to.
    /// Pass empty strings for missing title or description.
    ///
    /// Never fails. Unparseable URLs simply don't contribute domain and path signals.
    pub fn scan(&self, url: &str, title: &str, description: &str) -> ScanResult {
        self.stats.count_scan();

        let key = ScanKey {
            url: url.to_owned(),
            title: title.to_owned(),
            description: description.to_owned(),
        };

        let cached = self.cache().get(&key).cloned();
        let result = match cached {
            Some(result) => {
                self.stats.count_cache_hit();
                result
            }
            None => {
                self.stats.count_cache_miss();
                let result = evaluate(url, title, description);
                self.cache().put(key, result.clone());
                result
            }
        };

        if result.blocked {
            self.stats.count_blocked();
        }

        result
    }

    /// Note that a user believes this URL was flagged wrongly.
    /// This only gets logged and counted; it does not change future scans.
    pub fn report_false_positive(&self, url: &str, user_id: u64) {
        self.stats.count_false_positive();
        log::info!("False positive reported by user {user_id}: {url}");
    }

    /// Note that a user believes this URL should have been flagged.
    /// This only gets logged and counted; it does not change future scans.
    pub fn report_missed(&self, url: &str, user_id: u64) {
        self.stats.count_missed();
        log::info!("Missed content reported by user {user_id}: {url}");
    }

    pub fn stats(&self) -> FilterStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }
}

/// Run every check on the inputs. This is the uncached part of [`ContentFilter::scan`].
fn evaluate(url: &str, title: &str, description: &str) -> ScanResult {
    let mut result = ScanResult::default();

    let parsed = match parse_url_like_telegram(url.trim()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::debug!("Not scanning domain and path of {url:?}, it doesn't parse: {e}");
            None
        }
    };

    let host = parsed.as_ref().and_then(normalize_host);

    if let (Some(parsed), Some(host)) = (&parsed, &host) {
        match domain::check_domain(host, parsed.path()) {
            DomainVerdict::Known(reason) => result.flag(KNOWN_DOMAIN_WEIGHT, reason),
            DomainVerdict::Suspicious(reason) => result.flag(SUSPICIOUS_DOMAIN_WEIGHT, reason),
            DomainVerdict::Safe | DomainVerdict::Clean => (),
        }
    }

    if let Some(reason) = parsed.as_ref().and_then(path::analyze_path) {
        result.flag(PATH_WEIGHT, reason);
    }

    let title_keywords = keywords::detect_keywords(title);
    if !title_keywords.is_empty() {
        result.flag(
            TITLE_WEIGHT,
            format!("NSFW title keywords: {}", keywords::summarize(&title_keywords)),
        );
    }

    let description_keywords = keywords::detect_keywords(description);
    if !description_keywords.is_empty() {
        result.flag(
            DESCRIPTION_WEIGHT,
            format!(
                "NSFW description keywords: {}",
                keywords::summarize(&description_keywords)
            ),
        );
    }

    if host.as_deref().is_some_and(domain::is_safe_host) {
        result.safe_override = true;
        result.confidence *= SAFE_DOMAIN_DAMPENING;
    }

    result.blocked = result.is_flagged && result.confidence >= DEFAULT_BLOCK_THRESHOLD;

    result
}
