use std::fmt::Display;

use teloxide::types::{ChatId, MessageId, UserId};
use tokio::sync::mpsc;

use super::category::UrlCategory;

/// Where a download request came from, so results can be reported back there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOrigin {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub message_id: MessageId,
}

/// How the download bot should treat the download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Upload to Telegram instead of mirroring to cloud storage.
    pub leech: bool,
    pub extract: bool,
    pub compress: bool,
    /// Name to save the download under.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub category: UrlCategory,
    pub priority: u8,
    pub origin: DownloadOrigin,
    pub options: DownloadOptions,
}

impl DownloadRequest {
    /// The download bot command that starts this download, like
    /// `/mirror -e https://example.com/file.zip`.
    pub fn command_line(&self) -> String {
        let mut parts = vec![match self.options.leech {
            true => "/leech",
            false => "/mirror",
        }];

        if self.options.extract {
            parts.push("-e");
        }
        if self.options.compress {
            parts.push("-z");
        }
        if let Some(name) = &self.options.name {
            parts.push("-n");
            parts.push(name);
        }

        parts.push(&self.url);
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// Too many downloads are waiting already.
    QueueFull,
    /// Nobody is processing downloads anymore.
    Closed,
}

impl Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::QueueFull => f.write_str("the download queue is full"),
            SinkError::Closed => f.write_str("the download queue is closed"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Something that accepts links to download. The detector hands everything it
/// decides to download to one of these.
pub trait DownloadSink: Send + Sync {
    /// Hand over a download. This must not block.
    fn submit(&self, request: DownloadRequest) -> Result<(), SinkError>;
}

/// A [`DownloadSink`] that puts requests on a bounded queue for a worker to pick up.
#[derive(Debug, Clone)]
pub struct QueueSink {
    sender: mpsc::Sender<DownloadRequest>,
}

impl QueueSink {
    /// Make a sink along with the receiving end of its queue.
    pub fn new(capacity: usize) -> (QueueSink, mpsc::Receiver<DownloadRequest>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (QueueSink { sender }, receiver)
    }
}

impl DownloadSink for QueueSink {
    fn submit(&self, request: DownloadRequest) -> Result<(), SinkError> {
        use mpsc::error::TrySendError;

        let url = request.url.clone();
        match self.sender.try_send(request) {
            Ok(()) => {
                log::info!("Queued download of {url}");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(SinkError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(SinkError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn request(url: &str) -> DownloadRequest {
        DownloadRequest {
            url: url.to_owned(),
            category: UrlCategory::Http,
            priority: 20,
            origin: DownloadOrigin {
                chat_id: ChatId(1),
                user_id: UserId(2),
                message_id: MessageId(3),
            },
            options: DownloadOptions::default(),
        }
    }

    #[test]
    fn command_lines() {
        let mut request = request("https://example.com/a.zip");
        assert_eq!(request.command_line(), "/mirror https://example.com/a.zip");

        request.options = DownloadOptions {
            leech: true,
            extract: true,
            compress: true,
            name: Some("stuff".to_owned()),
        };
        assert_eq!(
            request.command_line(),
            "/leech -e -z -n stuff https://example.com/a.zip"
        );
    }

    #[tokio::test]
    async fn queue_delivers_then_fills_up() {
        let (sink, mut receiver) = QueueSink::new(1);

        sink.submit(request("https://a.example/")).unwrap();
        assert_eq!(
            sink.submit(request("https://b.example/")),
            Err(SinkError::QueueFull)
        );

        assert_eq!(receiver.recv().await.unwrap().url, "https://a.example/");

        drop(receiver);
        assert_eq!(
            sink.submit(request("https://c.example/")),
            Err(SinkError::Closed)
        );
    }
}
