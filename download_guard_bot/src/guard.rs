//! Combines a content filter scan with a user's preferences into what the bot
//! should do about a link.

use crate::{
    content_filter::{decide, is_same_or_subdomain, ContentFilter, ScanResult},
    misc::host_of,
    settings::UserSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAction {
    /// Go ahead.
    Allow,
    /// Go ahead, but tell the user it looks like adult content.
    Warn,
    /// Don't download.
    Block,
    /// Don't download unless the user insists.
    OverrideAvailable,
}

impl GuardAction {
    pub fn allows_download(&self) -> bool {
        matches!(self, GuardAction::Allow | GuardAction::Warn)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuardVerdict {
    pub scan: ScanResult,
    pub action: GuardAction,
}

/// What users can tell us about the content filter's mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    FalsePositive,
    Missed,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::FalsePositive => "false_positive",
            ReportKind::Missed => "missed",
        }
    }
}

/// Decide what to do with `url` for a user with these `settings`.
pub fn check_url(
    filter: &ContentFilter,
    settings: &UserSettings,
    url: &str,
    title: &str,
    description: &str,
) -> GuardVerdict {
    let scan = filter.scan(url, title, description);
    let policy = &settings.nsfw_filter;

    let host = host_of(url);
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if !host.is_empty()
        && policy
            .whitelist_domains
            .iter()
            .any(|d| is_same_or_subdomain(host, d))
    {
        log::debug!("{url} is whitelisted by the user, allowing");
        return GuardVerdict {
            scan,
            action: GuardAction::Allow,
        };
    }

    let action = if decide(Some(policy), &scan) && policy.block_downloads {
        if policy.allow_override {
            GuardAction::OverrideAvailable
        } else {
            GuardAction::Block
        }
    } else if scan.is_flagged && policy.show_warnings {
        GuardAction::Warn
    } else {
        GuardAction::Allow
    };

    GuardVerdict { scan, action }
}

fn domain_for_display(url: &str) -> String {
    let host = host_of(url);
    if host.is_empty() {
        html_escape::encode_text(url).into_owned()
    } else {
        host
    }
}

fn percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Message text for a verdict that needs one. [`GuardAction::Allow`] gets none.
pub fn verdict_message(url: &str, verdict: &GuardVerdict) -> Option<String> {
    let domain = domain_for_display(url);
    let confidence = percent(verdict.scan.confidence);

    let text = match verdict.action {
        GuardAction::Allow => return None,
        GuardAction::Block => format!(
            "🚫 <b>NSFW Content Blocked</b>\n\n\
            <b>Domain:</b> <code>{domain}</code>\n\
            <b>Confidence:</b> {confidence}\n\
            <b>Reason:</b> Adult content detected\n\n\
            <i>This link was blocked by your NSFW filter. \
            If this is a mistake, you can report it.</i>"
        ),
        GuardAction::Warn => format!(
            "⚠️ <b>Potentially NSFW Content</b>\n\n\
            <b>Domain:</b> <code>{domain}</code>\n\
            <b>Confidence:</b> {confidence}\n\
            <b>Status:</b> Allowed but flagged\n\n\
            <i>This content may contain adult material.</i>"
        ),
        GuardAction::OverrideAvailable => format!(
            "🛑 <b>NSFW Content Detected</b>\n\n\
            <b>Domain:</b> <code>{domain}</code>\n\
            <b>Confidence:</b> {confidence}\n\
            <b>Status:</b> Blocked by filter\n\n\
            <i>You can override this block if you believe this is safe content.</i>"
        ),
    };

    Some(text)
}

/// Notice sent after deleting a message with `count` blocked links in it.
pub fn deleted_notice(count: usize) -> String {
    format!(
        "🗑️ <b>NSFW Message Deleted</b>\n\n\
        A message containing {count} NSFW link(s) was deleted.\n\n\
        <i>You can disable this with <code>/nsfwfilter autodelete off</code>.</i>"
    )
}

/// Human-readable verdict of a scan for a user, for `/nsfwtest` and reports.
pub fn scan_summary(scan: &ScanResult, blocked_for_user: bool) -> String {
    let verdict = if scan.is_flagged { "🔞 NSFW" } else { "✅ Clean" };
    let decision = if blocked_for_user {
        "🚫 Blocked"
    } else {
        "✅ Allowed"
    };

    let mut text = format!(
        "<b>Result:</b> {verdict}\n\
        <b>Confidence:</b> {} {}\n\
        <b>Your filter:</b> {decision}",
        crate::misc::progress_bar(scan.confidence, 10),
        percent(scan.confidence),
    );

    if scan.safe_override {
        text.push_str("\n<i>Known safe site, confidence lowered.</i>");
    }

    if !scan.reasons.is_empty() {
        text.push_str("\n\n<b>Reasons:</b>");
        for reason in scan.reasons.iter().take(5) {
            text.push_str("\n• ");
            text.push_str(&html_escape::encode_text(reason));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::num::NonZeroUsize;

    use super::*;
    use crate::content_filter::Strictness;

    fn filter() -> ContentFilter {
        ContentFilter::new(NonZeroUsize::new(16).unwrap())
    }

    const NSFW_URL: &str = "https://pornhub.com/view_video.php";
    const CLEAN_URL: &str = "https://example.com/file.zip";

    #[test]
    fn defaults_block_and_allow() {
        let filter = filter();
        let settings = UserSettings::default();

        let verdict = check_url(&filter, &settings, NSFW_URL, "", "");
        assert_eq!(verdict.action, GuardAction::Block);
        assert!(verdict.scan.blocked);

        let verdict = check_url(&filter, &settings, CLEAN_URL, "", "");
        assert_eq!(verdict.action, GuardAction::Allow);
        assert!(verdict_message(CLEAN_URL, &verdict).is_none());
    }

    #[test]
    fn toggles() {
        let filter = filter();
        let mut settings = UserSettings::default();

        settings.nsfw_filter.allow_override = true;
        let verdict = check_url(&filter, &settings, NSFW_URL, "", "");
        assert_eq!(verdict.action, GuardAction::OverrideAvailable);
        assert!(!verdict.action.allows_download());

        settings.nsfw_filter.block_downloads = false;
        let verdict = check_url(&filter, &settings, NSFW_URL, "", "");
        assert_eq!(verdict.action, GuardAction::Warn);
        assert!(verdict.action.allows_download());

        settings.nsfw_filter.show_warnings = false;
        let verdict = check_url(&filter, &settings, NSFW_URL, "", "");
        assert_eq!(verdict.action, GuardAction::Allow);
    }

    #[test]
    fn flagged_below_threshold_warns() {
        let filter = filter();
        let mut settings = UserSettings::default();
        settings.nsfw_filter.strictness = Strictness::Low;

        // Suspicious host pattern only, 0.6.
        let verdict = check_url(&filter, &settings, "https://pornish.example/", "", "");
        assert!(verdict.scan.is_flagged);
        assert_eq!(verdict.action, GuardAction::Warn);

        settings.nsfw_filter.strictness = Strictness::High;
        let verdict = check_url(&filter, &settings, "https://pornish.example/", "", "");
        assert_eq!(verdict.action, GuardAction::Block);
    }

    #[test]
    fn whitelist_wins() {
        let filter = filter();
        let mut settings = UserSettings::default();
        settings
            .nsfw_filter
            .whitelist_domains
            .push("pornhub.com".to_owned());

        let verdict = check_url(&filter, &settings, NSFW_URL, "", "");
        assert_eq!(verdict.action, GuardAction::Allow);
        assert!(verdict.scan.is_flagged);

        let verdict = check_url(&filter, &settings, "https://www.pornhub.com/", "", "");
        assert_eq!(verdict.action, GuardAction::Allow);
    }

    #[test]
    fn messages() {
        let filter = filter();
        let verdict = check_url(&filter, &UserSettings::default(), NSFW_URL, "", "");
        let text = verdict_message(NSFW_URL, &verdict).unwrap();
        assert!(text.contains("<code>pornhub.com</code>"));
        assert!(text.contains("80%"));

        let summary = scan_summary(&verdict.scan, true);
        assert!(summary.contains("████████░░ 80%"));
        assert!(summary.contains("Known NSFW domain: pornhub.com"));
        assert!(deleted_notice(2).contains("2 NSFW link(s)"));
    }
}
