use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// What kind of link a URL is, as far as downloading it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlCategory {
    Magnet,
    TorrentFile,
    Gdrive,
    GdriveFile,
    GdriveFolder,
    Mega,
    Youtube,
    Telegram,
    Video,
    Cloud,
    Filehost,
    Direct,
    Torrent,
    Archive,
    Http,
    Ftp,
    Unknown,
    Invalid,
}

impl UrlCategory {
    pub const ALL: [UrlCategory; 18] = [
        UrlCategory::Magnet,
        UrlCategory::TorrentFile,
        UrlCategory::Gdrive,
        UrlCategory::GdriveFile,
        UrlCategory::GdriveFolder,
        UrlCategory::Mega,
        UrlCategory::Youtube,
        UrlCategory::Telegram,
        UrlCategory::Video,
        UrlCategory::Cloud,
        UrlCategory::Filehost,
        UrlCategory::Direct,
        UrlCategory::Torrent,
        UrlCategory::Archive,
        UrlCategory::Http,
        UrlCategory::Ftp,
        UrlCategory::Unknown,
        UrlCategory::Invalid,
    ];

    /// Categories that get downloaded without asking when the user has no preferences,
    /// and the only ones the user gets prompted about.
    pub const SAFE_AUTO: [UrlCategory; 5] = [
        UrlCategory::Gdrive,
        UrlCategory::Mega,
        UrlCategory::TorrentFile,
        UrlCategory::Magnet,
        UrlCategory::Youtube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UrlCategory::Magnet => "magnet",
            UrlCategory::TorrentFile => "torrent_file",
            UrlCategory::Gdrive => "gdrive",
            UrlCategory::GdriveFile => "gdrive_file",
            UrlCategory::GdriveFolder => "gdrive_folder",
            UrlCategory::Mega => "mega",
            UrlCategory::Youtube => "youtube",
            UrlCategory::Telegram => "telegram",
            UrlCategory::Video => "video",
            UrlCategory::Cloud => "cloud",
            UrlCategory::Filehost => "filehost",
            UrlCategory::Direct => "direct",
            UrlCategory::Torrent => "torrent",
            UrlCategory::Archive => "archive",
            UrlCategory::Http => "http",
            UrlCategory::Ftp => "ftp",
            UrlCategory::Unknown => "unknown",
            UrlCategory::Invalid => "invalid",
        }
    }

    /// Priority of this category before any host bonus.
    pub fn base_priority(&self) -> u8 {
        match self {
            UrlCategory::Magnet => 90,
            UrlCategory::TorrentFile => 85,
            UrlCategory::GdriveFile => 80,
            UrlCategory::GdriveFolder => 75,
            UrlCategory::Mega => 70,
            UrlCategory::Youtube => 65,
            UrlCategory::Telegram => 60,
            UrlCategory::Filehost => 50,
            UrlCategory::Direct => 45,
            UrlCategory::Cloud => 40,
            UrlCategory::Video => 35,
            UrlCategory::Http => 20,
            UrlCategory::Ftp => 15,
            _ => 10,
        }
    }

    pub fn is_safe_auto(&self) -> bool {
        UrlCategory::SAFE_AUTO.contains(self)
    }
}

impl Display for UrlCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrlCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UrlCategory::ALL
            .into_iter()
            .find(|x| x.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Rough kind of content behind a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedType {
    Torrent,
    CloudFolder,
    CloudFile,
    Cloud,
    Telegram,
    Video,
    Filehost,
    Direct,
    Archive,
    Http,
    Ftp,
    #[default]
    Unknown,
}

impl EstimatedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatedType::Torrent => "torrent",
            EstimatedType::CloudFolder => "cloud_folder",
            EstimatedType::CloudFile => "cloud_file",
            EstimatedType::Cloud => "cloud",
            EstimatedType::Telegram => "telegram",
            EstimatedType::Video => "video",
            EstimatedType::Filehost => "filehost",
            EstimatedType::Direct => "direct",
            EstimatedType::Archive => "archive",
            EstimatedType::Http => "http",
            EstimatedType::Ftp => "ftp",
            EstimatedType::Unknown => "unknown",
        }
    }
}

impl Display for EstimatedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the detector found out about a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionMetadata {
    /// The URL, trimmed.
    pub url: String,
    /// Lowercased host, or empty if there is none.
    pub domain: String,
    pub downloadable: bool,
    /// Downloading needs an account, as with Telegram links.
    pub requires_auth: bool,
    /// The link points at many files, like a folder or a playlist.
    pub supports_batch: bool,
    pub estimated_type: EstimatedType,
}

impl DetectionMetadata {
    /// Metadata for a link whose category was decided. All of those are downloadable.
    pub(super) fn downloadable(
        self,
        estimated_type: EstimatedType,
        supports_batch: bool,
    ) -> DetectionMetadata {
        DetectionMetadata {
            downloadable: true,
            estimated_type,
            supports_batch,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for category in UrlCategory::ALL {
            assert_eq!(category.as_str().parse(), Ok(category));
            assert_eq!(
                serde_json::to_string(&category).ok(),
                Some(format!("\"{category}\""))
            );
        }
        assert_eq!("GDRIVE_FOLDER".parse(), Ok(UrlCategory::GdriveFolder));
        assert_eq!("all".parse::<UrlCategory>(), Err(()));
    }

    #[test]
    fn priorities() {
        assert_eq!(UrlCategory::Magnet.base_priority(), 90);
        assert_eq!(UrlCategory::Ftp.base_priority(), 15);
        assert_eq!(UrlCategory::Gdrive.base_priority(), 10);
        assert_eq!(UrlCategory::Archive.base_priority(), 10);
    }
}
