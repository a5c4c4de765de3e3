use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::ScanResult;

/// How eagerly a user wants flagged content blocked.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Off,
    Low,
    #[default]
    Medium,
    High,
    Strict,
}

impl Strictness {
    pub const ALL: [Strictness; 5] = [
        Strictness::Off,
        Strictness::Low,
        Strictness::Medium,
        Strictness::High,
        Strictness::Strict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strictness::Off => "off",
            Strictness::Low => "low",
            Strictness::Medium => "medium",
            Strictness::High => "high",
            Strictness::Strict => "strict",
        }
    }

    /// Human-readable summary for settings menus.
    pub fn description(&self) -> &'static str {
        match self {
            Strictness::Off => "Off - Never block anything",
            Strictness::Low => "Low - Only obvious adult sites",
            Strictness::Medium => "Medium - Balanced filtering (recommended)",
            Strictness::High => "High - Aggressive filtering",
            Strictness::Strict => "Strict - Block anything suspicious",
        }
    }

    /// Should a scan with this outcome be blocked at this level?
    pub fn blocks(&self, scan: &ScanResult) -> bool {
        match self {
            Strictness::Off => false,
            Strictness::Low => scan.confidence >= 0.8,
            Strictness::Medium => scan.confidence >= 0.5,
            Strictness::High => scan.confidence >= 0.3,
            Strictness::Strict => scan.is_flagged,
        }
    }
}

impl Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strictness {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strictness::ALL
            .into_iter()
            .find(|x| x.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// A user's content filter preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NsfwPolicy {
    pub enabled: bool,
    pub strictness: Strictness,
    /// Stop downloads of blocked content, instead of just warning.
    pub block_downloads: bool,
    /// Warn about flagged content that isn't blocked.
    pub show_warnings: bool,
    /// Let the user download blocked content anyway with a button.
    pub allow_override: bool,
    pub report_enabled: bool,
    /// Delete the user's message if it has blocked content in it.
    pub auto_delete_nsfw: bool,
    /// Hosts the user trusts regardless of what the filter thinks.
    pub whitelist_domains: Vec<String>,
}

impl Default for NsfwPolicy {
    fn default() -> Self {
        NsfwPolicy {
            enabled: true,
            strictness: Strictness::Medium,
            block_downloads: true,
            show_warnings: true,
            allow_override: false,
            report_enabled: true,
            auto_delete_nsfw: false,
            whitelist_domains: Vec::new(),
        }
    }
}

/// Decide whether to block content with this `scan` result for a user with
/// this `policy`. Users without a policy get the scan's own verdict.
pub fn decide(policy: Option<&NsfwPolicy>, scan: &ScanResult) -> bool {
    let Some(policy) = policy else {
        return scan.blocked;
    };

    if !policy.enabled {
        return false;
    }

    policy.strictness.blocks(scan)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn scan_with(confidence: f64, is_flagged: bool) -> ScanResult {
        ScanResult {
            is_flagged,
            confidence,
            reasons: Vec::new(),
            blocked: is_flagged && confidence >= 0.5,
            safe_override: false,
        }
    }

    fn policy(strictness: Strictness) -> NsfwPolicy {
        NsfwPolicy {
            strictness,
            ..Default::default()
        }
    }

    #[test]
    fn strictness_monotonicity() {
        let scan = scan_with(0.6, true);
        assert!(!decide(Some(&policy(Strictness::Off)), &scan));
        assert!(!decide(Some(&policy(Strictness::Low)), &scan));
        assert!(decide(Some(&policy(Strictness::Medium)), &scan));
        assert!(decide(Some(&policy(Strictness::High)), &scan));
        assert!(decide(Some(&policy(Strictness::Strict)), &scan));
    }

    #[test]
    fn off_never_blocks() {
        let scan = scan_with(5.0, true);
        assert!(!decide(Some(&policy(Strictness::Off)), &scan));

        let disabled = NsfwPolicy {
            enabled: false,
            strictness: Strictness::Strict,
            ..Default::default()
        };
        assert!(!decide(Some(&disabled), &scan));
    }

    #[test]
    fn strict_blocks_any_flag() {
        let scan = scan_with(0.1, true);
        assert!(decide(Some(&policy(Strictness::Strict)), &scan));
        assert!(!decide(Some(&policy(Strictness::High)), &scan));
    }

    #[test]
    fn missing_policy_uses_scan_verdict() {
        assert!(decide(None, &scan_with(0.5, true)));
        assert!(!decide(None, &scan_with(0.4, true)));
    }

    #[test]
    fn strictness_parsing() {
        assert_eq!("HIGH".parse::<Strictness>(), Ok(Strictness::High));
        assert_eq!("meh".parse::<Strictness>(), Err(()));
        assert_eq!(Strictness::default(), Strictness::Medium);
    }

    #[test]
    fn policy_json_fills_in_missing_fields() {
        let policy: NsfwPolicy = serde_json::from_str(r#"{"strictness":"strict"}"#).unwrap();
        assert_eq!(policy.strictness, Strictness::Strict);
        assert!(policy.enabled);
        assert!(policy.block_downloads);
    }
}
