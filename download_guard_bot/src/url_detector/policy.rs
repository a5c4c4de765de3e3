use serde::{Deserialize, Serialize};

use super::category::UrlCategory;

/// Which categories a user wants downloaded automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedTypes {
    All,
    Only(Vec<UrlCategory>),
}

impl AllowedTypes {
    pub fn allows(&self, category: UrlCategory) -> bool {
        match self {
            AllowedTypes::All => true,
            AllowedTypes::Only(categories) => categories.contains(&category),
        }
    }

    /// Comma separated list, or `all`.
    pub fn describe(&self) -> String {
        match self {
            AllowedTypes::All => "all".to_owned(),
            AllowedTypes::Only(categories) if categories.is_empty() => "none".to_owned(),
            AllowedTypes::Only(categories) => categories
                .iter()
                .map(UrlCategory::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl Default for AllowedTypes {
    fn default() -> Self {
        AllowedTypes::Only(vec![
            UrlCategory::Gdrive,
            UrlCategory::Mega,
            UrlCategory::Youtube,
            UrlCategory::TorrentFile,
            UrlCategory::Magnet,
        ])
    }
}

/// A user's auto-download preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoDownloadPolicy {
    pub enabled: bool,
    /// Ask about links that aren't downloaded automatically.
    pub prompt_enabled: bool,
    pub allowed_types: AllowedTypes,
    /// If not empty, only hosts containing one of these get downloaded.
    pub domain_whitelist: Vec<String>,
    /// Hosts containing one of these never get downloaded.
    pub domain_blacklist: Vec<String>,
    /// Upload the result to Telegram instead of mirroring it.
    pub leech: bool,
    pub extract: bool,
    pub compress: bool,
}

impl Default for AutoDownloadPolicy {
    fn default() -> Self {
        AutoDownloadPolicy {
            enabled: false,
            prompt_enabled: true,
            allowed_types: AllowedTypes::default(),
            domain_whitelist: Vec::new(),
            domain_blacklist: Vec::new(),
            leech: false,
            extract: false,
            compress: false,
        }
    }
}

impl AutoDownloadPolicy {
    /// Check the host against the white- and blacklists.
    pub fn allows_host(&self, host: &str) -> bool {
        if !self.domain_whitelist.is_empty()
            && !self.domain_whitelist.iter().any(|d| host.contains(d.as_str()))
        {
            return false;
        }

        !self.domain_blacklist.iter().any(|d| host.contains(d.as_str()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn host_lists() {
        let mut policy = AutoDownloadPolicy::default();
        assert!(policy.allows_host("anything.example"));

        policy.domain_blacklist.push("bad.example".to_owned());
        assert!(!policy.allows_host("cdn.bad.example"));
        assert!(policy.allows_host("good.example"));

        policy.domain_whitelist.push("good.example".to_owned());
        assert!(policy.allows_host("good.example"));
        assert!(!policy.allows_host("other.example"));
    }

    #[test]
    fn allowed_types() {
        assert!(AllowedTypes::All.allows(UrlCategory::Ftp));
        assert!(AllowedTypes::default().allows(UrlCategory::Mega));
        assert!(AllowedTypes::default().allows(UrlCategory::Magnet));
        assert!(AllowedTypes::default().allows(UrlCategory::TorrentFile));
        assert!(!AllowedTypes::default().allows(UrlCategory::Http));
        assert_eq!(
            AllowedTypes::default().describe(),
            "gdrive, mega, youtube, torrent_file, magnet"
        );
        assert_eq!(AllowedTypes::Only(Vec::new()).describe(), "none");
    }

    #[test]
    fn serialized_form() {
        let json = serde_json::to_string(&AllowedTypes::All).unwrap();
        assert_eq!(json, "\"all\"");
        let parsed: AllowedTypes = serde_json::from_str(r#"{"only":["magnet"]}"#).unwrap();
        assert_eq!(parsed, AllowedTypes::Only(vec![UrlCategory::Magnet]));

        let policy: AutoDownloadPolicy = serde_json::from_str(r#"{"enabled":true}"#).unwrap();
        assert!(policy.enabled);
        assert!(policy.prompt_enabled);
        assert_eq!(policy.allowed_types, AllowedTypes::default());
    }
}
