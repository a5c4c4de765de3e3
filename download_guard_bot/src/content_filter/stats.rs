use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of the content filter. They live only as long as the process does.
#[derive(Debug, Default)]
pub struct FilterStats {
    total_scanned: AtomicU64,
    nsfw_blocked: AtomicU64,
    false_positives: AtomicU64,
    user_reports: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Point-in-time copy of [`FilterStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStatsSnapshot {
    pub total_scanned: u64,
    pub nsfw_blocked: u64,
    pub false_positives: u64,
    pub user_reports: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl FilterStats {
    pub(super) fn count_scan(&self) {
        self.total_scanned.fetch_add(1, Ordering::Relaxed);
    }
    pub(super) fn count_blocked(&self) {
        self.nsfw_blocked.fetch_add(1, Ordering::Relaxed);
    }
    pub(super) fn count_false_positive(&self) {
        self.false_positives.fetch_add(1, Ordering::Relaxed);
        self.user_reports.fetch_add(1, Ordering::Relaxed);
    }
    pub(super) fn count_missed(&self) {
        self.user_reports.fetch_add(1, Ordering::Relaxed);
    }
    pub(super) fn count_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }
    pub(super) fn count_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FilterStatsSnapshot {
        FilterStatsSnapshot {
            total_scanned: self.total_scanned.load(Ordering::Relaxed),
            nsfw_blocked: self.nsfw_blocked.load(Ordering::Relaxed),
            false_positives: self.false_positives.load(Ordering::Relaxed),
            user_reports: self.user_reports.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

impl FilterStatsSnapshot {
    /// Share of scans that ended up blocked, in percent.
    pub fn blocked_percent(&self) -> f64 {
        percent(self.nsfw_blocked, self.total_scanned)
    }

    /// Share of blocks that users reported as wrong, in percent.
    pub fn false_positive_percent(&self) -> f64 {
        percent(self.false_positives, self.nsfw_blocked)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
