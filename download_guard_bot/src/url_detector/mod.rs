use std::{cmp::Reverse, ops::Range, sync::Arc, sync::LazyLock};

use regex::Regex;
use url::Url;

pub use self::category::{DetectionMetadata, EstimatedType, UrlCategory};
pub use self::policy::{AllowedTypes, AutoDownloadPolicy};
pub use self::sink::{
    DownloadOptions, DownloadOrigin, DownloadRequest, DownloadSink, QueueSink, SinkError,
};

mod category;
mod domains;
mod policy;
mod sink;

/// Hosts whose links get a priority bonus.
static TRUSTED_HOSTS: &[&str] = &["drive.google.com", "mega.nz", "youtube.com"];
const TRUSTED_HOST_BONUS: u8 = 10;

macro_rules! pattern {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($regex).expect("Regex will always be valid"));
    };
}

// Checked in this order.
pattern!(MAGNET, r"(?i)^magnet:\?xt=urn:(?:btih|btmh):[a-z0-9]{20,40}");
pattern!(TORRENT_FILE, r"(?i)\.torrent$");
pattern!(GDRIVE, r"(?i)^https?://drive\.google\.com/");
pattern!(
    GDRIVE_FOLDER,
    r"(?i)^https?://drive\.google\.com/drive/folders/[a-z0-9_-]+"
);
pattern!(GDRIVE_FILE, r"(?i)^https?://drive\.google\.com/file/d/[a-z0-9_-]+");
pattern!(MEGA, r"(?i)^https?://mega\.(?:nz|co\.nz)/");
pattern!(TELEGRAM, r"(?i)^https?://(?:t\.me|telegram\.(?:me|dog|space))/");
pattern!(YOUTUBE, r"(?i)^https?://(?:www\.)?(?:youtube\.com|youtu\.be)/");
pattern!(HTTP, r#"(?i)^https?://[^\s<>"{}|\\^`\[\]]+"#);
pattern!(FTP, r#"(?i)^ftp://[^\s<>"{}|\\^`\[\]]+"#);

pattern!(HTTP_IN_TEXT, r#"(?i)https?://[^\s<>"{}|\\^`\[\]]+"#);
pattern!(MAGNET_IN_TEXT, r"(?i)magnet:\?xt=urn:(?:btih|btmh):[a-z0-9]{20,40}");

/// Everything known about a URL, for showing to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlInfo {
    pub category: UrlCategory,
    pub metadata: DetectionMetadata,
    pub priority: u8,
}

/// Classify `url` into a download category.
///
/// Categories overlap, so the order of checks matters: a Drive link must come
/// out as Drive and not as a generic HTTP link. Empty input is
/// [`UrlCategory::Invalid`]. This never fails.
pub fn classify(url: &str) -> (UrlCategory, DetectionMetadata) {
    let url = url.trim();
    if url.is_empty() {
        return (UrlCategory::Invalid, DetectionMetadata::default());
    }

    let domain = match Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
        Err(e) => {
            log::debug!("Could not parse {url:?} for its host: {e}");
            String::new()
        }
    };

    let metadata = DetectionMetadata {
        url: url.to_owned(),
        domain,
        ..Default::default()
    };

    if MAGNET.is_match(url) {
        return (
            UrlCategory::Magnet,
            metadata.downloadable(EstimatedType::Torrent, false),
        );
    }

    if TORRENT_FILE.is_match(url) {
        return (
            UrlCategory::TorrentFile,
            metadata.downloadable(EstimatedType::Torrent, false),
        );
    }

    if GDRIVE.is_match(url) {
        return if GDRIVE_FOLDER.is_match(url) {
            (
                UrlCategory::GdriveFolder,
                metadata.downloadable(EstimatedType::CloudFolder, true),
            )
        } else if GDRIVE_FILE.is_match(url) {
            (
                UrlCategory::GdriveFile,
                metadata.downloadable(EstimatedType::CloudFile, false),
            )
        } else {
            (
                UrlCategory::Gdrive,
                metadata.downloadable(EstimatedType::Cloud, false),
            )
        };
    }

    if MEGA.is_match(url) {
        let is_folder = url.contains("#F!");
        return (
            UrlCategory::Mega,
            metadata.downloadable(EstimatedType::Cloud, is_folder),
        );
    }

    if TELEGRAM.is_match(url) {
        let metadata = DetectionMetadata {
            requires_auth: true,
            ..metadata.downloadable(EstimatedType::Telegram, false)
        };
        return (UrlCategory::Telegram, metadata);
    }

    if YOUTUBE.is_match(url) {
        let is_batch = url.contains("playlist") || url.contains("channel");
        return (
            UrlCategory::Youtube,
            metadata.downloadable(EstimatedType::Video, is_batch),
        );
    }

    if let Some(category) = domains::lookup(&metadata.domain) {
        let (estimated_type, is_batch) = match category {
            UrlCategory::Video => (EstimatedType::Video, true),
            UrlCategory::Cloud => (EstimatedType::Cloud, true),
            UrlCategory::Filehost => (EstimatedType::Filehost, false),
            UrlCategory::Direct => (EstimatedType::Direct, false),
            UrlCategory::Torrent => (EstimatedType::Torrent, false),
            _ => (EstimatedType::Archive, false),
        };
        return (category, metadata.downloadable(estimated_type, is_batch));
    }

    if HTTP.is_match(url) {
        return (
            UrlCategory::Http,
            metadata.downloadable(EstimatedType::Http, false),
        );
    }

    if FTP.is_match(url) {
        return (
            UrlCategory::Ftp,
            metadata.downloadable(EstimatedType::Ftp, false),
        );
    }

    (UrlCategory::Unknown, metadata)
}

/// Download priority of a URL, from 0 to 100. Higher goes first.
pub fn priority(url: &str) -> u8 {
    let (category, metadata) = classify(url);
    priority_of(category, &metadata)
}

fn priority_of(category: UrlCategory, metadata: &DetectionMetadata) -> u8 {
    let mut priority = category.base_priority();

    if TRUSTED_HOSTS.iter().any(|x| metadata.domain.contains(x)) {
        priority = priority.saturating_add(TRUSTED_HOST_BONUS);
    }

    priority.min(100)
}

/// Find downloadable links in free text.
///
/// Picks up every `http(s)://` link, and the first magnet link, which runs
/// until the next whitespace.
pub fn extract_urls(text: &str) -> Vec<(String, DetectionMetadata)> {
    extract_url_spans(text)
        .into_iter()
        .map(|(span, metadata)| (text[span].to_owned(), metadata))
        .collect()
}

/// Same as [`extract_urls`], but gives where in `text` each link is.
pub fn extract_url_spans(text: &str) -> Vec<(Range<usize>, DetectionMetadata)> {
    let mut found = Vec::new();

    for link in HTTP_IN_TEXT.find_iter(text) {
        let (_, metadata) = classify(link.as_str());
        if metadata.downloadable {
            found.push((link.range(), metadata));
        }
    }

    if MAGNET_IN_TEXT.is_match(text) {
        if let Some(start) = text.find("magnet:") {
            let rest = &text[start..];
            let magnet = rest
                .split(char::is_whitespace)
                .next()
                .unwrap_or(rest);

            let (_, metadata) = classify(magnet);
            if metadata.downloadable {
                found.push((start..start + magnet.len(), metadata));
            }
        }
    }

    found
}

/// Decides what kind of links people send and hands downloadable ones to a [`DownloadSink`].
pub struct UrlDetector {
    sink: Arc<dyn DownloadSink>,
}

impl UrlDetector {
    pub fn new(sink: Arc<dyn DownloadSink>) -> UrlDetector {
        UrlDetector { sink }
    }

    /// See [`classify`].
    pub fn classify(&self, url: &str) -> (UrlCategory, DetectionMetadata) {
        classify(url)
    }

    /// See [`extract_urls`].
    pub fn extract_urls(&self, text: &str) -> Vec<(String, DetectionMetadata)> {
        extract_urls(text)
    }

    /// See [`extract_url_spans`].
    pub fn extract_url_spans(&self, text: &str) -> Vec<(Range<usize>, DetectionMetadata)> {
        extract_url_spans(text)
    }

    /// See [`priority`].
    pub fn priority(&self, url: &str) -> u8 {
        priority(url)
    }

    pub fn url_info(&self, url: &str) -> UrlInfo {
        let (category, metadata) = classify(url);
        let priority = priority_of(category, &metadata);
        UrlInfo {
            category,
            metadata,
            priority,
        }
    }

    /// Should this URL be downloaded without asking?
    ///
    /// With a `policy`, the user must have auto-download enabled, allow the
    /// category, and the host must pass their white- and blacklists. Without
    /// one, only [`UrlCategory::SAFE_AUTO`] categories go.
    pub fn is_auto_downloadable(&self, url: &str, policy: Option<&AutoDownloadPolicy>) -> bool {
        let (category, metadata) = classify(url);

        if !metadata.downloadable {
            return false;
        }

        let Some(policy) = policy else {
            return category.is_safe_auto();
        };

        policy.enabled
            && policy.allowed_types.allows(category)
            && policy.allows_host(&metadata.domain)
    }

    /// Should the user be asked whether to download a link that wasn't
    /// downloaded automatically? Only users with preferences get asked.
    pub fn should_prompt(&self, category: UrlCategory, policy: Option<&AutoDownloadPolicy>) -> bool {
        policy.is_some_and(|x| x.prompt_enabled) && category.is_safe_auto()
    }

    /// Build a download request for `url` with options from the user's `policy`.
    pub fn make_request(
        &self,
        url: &str,
        origin: DownloadOrigin,
        policy: Option<&AutoDownloadPolicy>,
    ) -> DownloadRequest {
        let (category, metadata) = classify(url);
        let options = policy
            .map(|x| DownloadOptions {
                leech: x.leech,
                extract: x.extract,
                compress: x.compress,
                name: None,
            })
            .unwrap_or_default();

        DownloadRequest {
            url: metadata.url.clone(),
            category,
            priority: priority_of(category, &metadata),
            origin,
            options,
        }
    }

    pub fn dispatch(&self, request: DownloadRequest) -> Result<(), SinkError> {
        self.sink.submit(request)
    }

    /// Dispatch several requests, highest priority first. Requests of equal
    /// priority keep their order. Returns the URL and outcome of each, in
    /// dispatch order.
    pub fn dispatch_batch(
        &self,
        mut requests: Vec<DownloadRequest>,
    ) -> Vec<(String, Result<(), SinkError>)> {
        requests.sort_by_key(|x| Reverse(x.priority));

        requests
            .into_iter()
            .map(|request| {
                let url = request.url.clone();
                (url, self.dispatch(request))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use teloxide::types::{ChatId, MessageId, UserId};

    use super::*;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<DownloadRequest>>);

    impl DownloadSink for RecordingSink {
        fn submit(&self, request: DownloadRequest) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(request);
            Ok(())
        }
    }

    fn detector() -> (UrlDetector, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (UrlDetector::new(sink.clone()), sink)
    }

    fn origin() -> DownloadOrigin {
        DownloadOrigin {
            chat_id: ChatId(10),
            user_id: UserId(20),
            message_id: MessageId(30),
        }
    }

    const MAGNET_URL: &str = "magnet:?xt=urn:btih:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    #[test]
    fn magnet() {
        let (category, metadata) = classify(MAGNET_URL);
        assert_eq!(category, UrlCategory::Magnet);
        assert!(metadata.downloadable);
        assert!(!metadata.supports_batch);
        assert_eq!(metadata.estimated_type, EstimatedType::Torrent);
        assert_eq!(metadata.domain, "");
    }

    #[test]
    fn gdrive() {
        let (category, metadata) = classify("https://drive.google.com/drive/folders/abc123");
        assert_eq!(category, UrlCategory::GdriveFolder);
        assert!(metadata.supports_batch);

        let (category, metadata) = classify("https://drive.google.com/file/d/abc123");
        assert_eq!(category, UrlCategory::GdriveFile);
        assert!(!metadata.supports_batch);
        assert_eq!(metadata.domain, "drive.google.com");

        let (category, _) = classify("https://drive.google.com/open?id=abc123");
        assert_eq!(category, UrlCategory::Gdrive);
    }

    #[test]
    fn mega_folders() {
        let (category, metadata) = classify("https://mega.nz/#F!abc!def");
        assert_eq!(category, UrlCategory::Mega);
        assert!(metadata.supports_batch);

        let (_, metadata) = classify("https://mega.co.nz/#!abc!def");
        assert!(!metadata.supports_batch);
    }

    #[test]
    fn telegram_needs_auth() {
        let (category, metadata) = classify("https://t.me/somechannel/123");
        assert_eq!(category, UrlCategory::Telegram);
        assert!(metadata.requires_auth);

        let (_, metadata) = classify("https://youtube.com/watch?v=x");
        assert!(!metadata.requires_auth);
    }

    #[test]
    fn youtube_batches() {
        let (category, metadata) = classify("https://www.youtube.com/playlist?list=abc");
        assert_eq!(category, UrlCategory::Youtube);
        assert!(metadata.supports_batch);

        let (_, metadata) = classify("https://youtu.be/dQw4w9WgXcQ");
        assert!(!metadata.supports_batch);
    }

    #[test]
    fn domain_table_and_fallbacks() {
        let (category, metadata) = classify("https://vimeo.com/12345");
        assert_eq!(category, UrlCategory::Video);
        assert!(metadata.supports_batch);

        let (category, metadata) = classify("https://gofile.io/d/abc");
        assert_eq!(category, UrlCategory::Filehost);
        assert!(!metadata.supports_batch);

        assert_eq!(classify("https://example.com/a.zip").0, UrlCategory::Http);
        assert_eq!(classify("ftp://example.com/a.zip").0, UrlCategory::Ftp);
        assert_eq!(classify("https://example.com/a.torrent").0, UrlCategory::TorrentFile);

        let (category, metadata) = classify("gopher://example.com/");
        assert_eq!(category, UrlCategory::Unknown);
        assert!(!metadata.downloadable);
        assert_eq!(metadata.domain, "example.com");
    }

    #[test]
    fn invalid_input() {
        for url in ["", "   \n"] {
            let (category, metadata) = classify(url);
            assert_eq!(category, UrlCategory::Invalid);
            assert_eq!(metadata, DetectionMetadata::default());
        }
        let (category, metadata) = classify("not a url at all");
        assert_eq!(category, UrlCategory::Unknown);
        assert_eq!(metadata.domain, "");
    }

    #[test]
    fn priorities() {
        assert_eq!(priority(MAGNET_URL), 90);
        assert_eq!(priority("https://example.com/a.zip"), 20);
        assert!(priority(MAGNET_URL) > priority("https://example.com/a.zip"));
        assert_eq!(priority("https://drive.google.com/file/d/abc"), 90);
        assert_eq!(priority("https://www.youtube.com/watch?v=x"), 75);
        assert_eq!(priority("https://drive.google.com/open?id=x"), 20);
        assert_eq!(priority("gopher://x"), 10);
    }

    #[test]
    fn extracting() {
        let magnet = format!("{MAGNET_URL}&dn=thing");
        let text = format!(
            "grab https://example.com/a.zip and {MAGNET_URL}&dn=thing please, \
            also gopher://nope and https://drive.google.com/file/d/abc"
        );
        let found = extract_urls(&text);
        let urls: Vec<_> = found.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/a.zip",
                "https://drive.google.com/file/d/abc",
                magnet.as_str(),
            ]
        );
        assert!(extract_urls("").is_empty());
        assert!(extract_urls("magnet: is a word").is_empty());
    }

    #[test]
    fn spans_point_into_the_text() {
        let text = "see https://e.com/ab then https://e.com/a";
        let spans: Vec<_> = extract_url_spans(text)
            .into_iter()
            .map(|(span, _)| span)
            .collect();
        assert_eq!(spans, vec![4..20, 26..41]);
        assert_eq!(&text[spans[1].clone()], "https://e.com/a");
    }

    #[test]
    fn auto_download_without_policy() {
        let (detector, _) = detector();
        assert!(detector.is_auto_downloadable(MAGNET_URL, None));
        assert!(detector.is_auto_downloadable("https://mega.nz/file/abc", None));
        assert!(!detector.is_auto_downloadable("https://example.com/a.zip", None));
        assert!(!detector.is_auto_downloadable("gopher://x", None));
        // Only generic Drive links are in the safe set.
        assert!(!detector.is_auto_downloadable("https://drive.google.com/file/d/abc", None));
    }

    #[test]
    fn auto_download_with_policy() {
        let (detector, _) = detector();
        let mut policy = AutoDownloadPolicy::default();
        assert!(!detector.is_auto_downloadable("https://mega.nz/file/abc", Some(&policy)));

        policy.enabled = true;
        assert!(detector.is_auto_downloadable("https://mega.nz/file/abc", Some(&policy)));
        assert!(!detector.is_auto_downloadable("https://example.com/a.zip", Some(&policy)));

        policy.allowed_types = AllowedTypes::All;
        assert!(detector.is_auto_downloadable("https://example.com/a.zip", Some(&policy)));

        policy.domain_blacklist.push("example.com".to_owned());
        assert!(!detector.is_auto_downloadable("https://example.com/a.zip", Some(&policy)));

        policy.domain_whitelist.push("mega.nz".to_owned());
        assert!(detector.is_auto_downloadable("https://mega.nz/file/abc", Some(&policy)));
        assert!(!detector.is_auto_downloadable("https://gofile.io/d/abc", Some(&policy)));
    }

    #[test]
    fn enabling_defaults_keeps_the_safe_set() {
        let (detector, _) = detector();
        let policy = AutoDownloadPolicy {
            enabled: true,
            ..Default::default()
        };

        for url in [
            MAGNET_URL,
            "https://example.com/some.torrent",
            "https://mega.nz/file/abc",
            "https://youtube.com/watch?v=abc",
            "https://example.com/a.zip",
        ] {
            assert_eq!(
                detector.is_auto_downloadable(url, Some(&policy)),
                detector.is_auto_downloadable(url, None),
                "{url}"
            );
        }
    }

    #[test]
    fn prompting() {
        let (detector, _) = detector();
        let policy = AutoDownloadPolicy::default();
        assert!(detector.should_prompt(UrlCategory::Magnet, Some(&policy)));
        assert!(!detector.should_prompt(UrlCategory::Http, Some(&policy)));
        assert!(!detector.should_prompt(UrlCategory::Magnet, None));

        let quiet = AutoDownloadPolicy {
            prompt_enabled: false,
            ..Default::default()
        };
        assert!(!detector.should_prompt(UrlCategory::Magnet, Some(&quiet)));
    }

    #[test]
    fn batches_go_out_by_priority() {
        let (detector, sink) = detector();
        let requests = [
            "https://example.com/a.zip",
            "ftp://example.com/b.zip",
            MAGNET_URL,
            "https://example.com/c.zip",
            "https://mega.nz/file/abc",
        ]
        .into_iter()
        .map(|url| detector.make_request(url, origin(), None))
        .collect();

        let results = detector.dispatch_batch(requests);
        assert!(results.iter().all(|(_, result)| result.is_ok()));

        let order: Vec<_> = sink.0.lock().unwrap().iter().map(|x| x.url.clone()).collect();
        assert_eq!(
            order,
            vec![
                MAGNET_URL,
                "https://mega.nz/file/abc",
                "https://example.com/a.zip",
                "https://example.com/c.zip",
                "ftp://example.com/b.zip",
            ]
        );
    }

    #[test]
    fn requests_carry_policy_options() {
        let (detector, _) = detector();
        let policy = AutoDownloadPolicy {
            leech: true,
            compress: true,
            ..Default::default()
        };
        let request = detector.make_request(" https://gofile.io/d/abc ", origin(), Some(&policy));
        assert_eq!(request.url, "https://gofile.io/d/abc");
        assert_eq!(request.category, UrlCategory::Filehost);
        assert_eq!(request.priority, 50);
        assert_eq!(request.command_line(), "/leech -z https://gofile.io/d/abc");
    }
}
