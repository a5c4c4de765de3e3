use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Weak,
    },
    time::Duration,
};

use bot_commons::teloxide_retry;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    sugar::request::{RequestLinkPreviewExt, RequestReplyExt},
    types::{Message, ParseMode},
    Bot,
};
use tokio::sync::mpsc;

use crate::{misc::shorten_url, url_detector::DownloadRequest};

/// Counters of what happened to links seen in chats.
#[derive(Debug, Default)]
pub struct AutoDownloadStats {
    total_detected: AtomicU64,
    auto_downloaded: AtomicU64,
    user_prompted: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoDownloadStatsSnapshot {
    pub total_detected: u64,
    pub auto_downloaded: u64,
    pub user_prompted: u64,
    pub failed: u64,
}

impl AutoDownloadStats {
    pub fn count_detected(&self, count: u64) {
        self.total_detected.fetch_add(count, Ordering::Relaxed);
    }
    pub fn count_auto_downloaded(&self) {
        self.auto_downloaded.fetch_add(1, Ordering::Relaxed);
    }
    pub fn count_prompted(&self) {
        self.user_prompted.fetch_add(1, Ordering::Relaxed);
    }
    pub fn count_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AutoDownloadStatsSnapshot {
        AutoDownloadStatsSnapshot {
            total_detected: self.total_detected.load(Ordering::Relaxed),
            auto_downloaded: self.auto_downloaded.load(Ordering::Relaxed),
            user_prompted: self.user_prompted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// How long a bot message stays in the chat before it cleans itself up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Something went wrong, nothing to do about it.
    Failure,
    Notice,
    /// Has buttons to press.
    Prompt,
}

impl Lifetime {
    pub fn duration(self) -> Duration {
        match self {
            Lifetime::Failure => Duration::from_secs(5),
            Lifetime::Notice => Duration::from_secs(10),
            Lifetime::Prompt => Duration::from_secs(5 * 60),
        }
    }
}

/// Delete the message once its lifetime is over, in the background.
pub fn delete_later(bot: &Bot, message: &Message, lifetime: Lifetime) {
    let bot = bot.clone();
    let (chat_id, message_id) = (message.chat.id, message.id);

    tokio::spawn(async move {
        tokio::time::sleep(lifetime.duration()).await;
        // Fine if someone got to it first.
        if let Err(e) = bot.delete_message(chat_id, message_id).await {
            log::debug!("Could not clean up message {} in {chat_id}: {e}", message_id.0);
        }
    });
}

/// Text posted into the chat for a download request. The command in it is
/// what the download bot in that chat picks up.
pub fn download_announcement(request: &DownloadRequest) -> String {
    format!(
        "🤖 <b>Auto-Download Started</b>\n\n\
        <b>Type:</b> <code>{}</code>\n\
        <b>URL:</b> <code>{}</code>\n\n\
        <code>{}</code>",
        request.category,
        html_escape::encode_text(&shorten_url(&request.url, 50)),
        html_escape::encode_text(&request.command_line()),
    )
}

/// Launches a loop that takes download requests off the queue and posts them
/// into the chats they came from, one per second.
///
/// Ends when everything that could submit to the queue is gone, or when the stats are.
pub async fn download_queue_spinloop(
    bot: Bot,
    mut queue: mpsc::Receiver<DownloadRequest>,
    stats: Weak<AutoDownloadStats>,
) {
    use tokio::time::sleep;

    while let Some(request) = queue.recv().await {
        let Some(stats) = stats.upgrade() else {
            // Nobody to report to anymore.
            return;
        };

        let origin = request.origin;
        let result = teloxide_retry!(
            bot.send_message(origin.chat_id, download_announcement(&request))
                .parse_mode(ParseMode::Html)
                .reply_to(origin.message_id)
                .disable_link_preview(true)
                .await
        );

        match result {
            Ok(_) => {
                log::debug!("Started download of {} for {}", request.url, origin.user_id);
                stats.count_auto_downloaded();
            }
            Err(e) => {
                log::warn!("Failed to start download of {}: {e:?}", request.url);
                stats.count_failed();
            }
        }

        drop(stats);
        sleep(Duration::from_secs(1)).await;
    }

    log::info!("Download queue closed, stopping.");
}

#[cfg(test)]
mod tests {
    use teloxide::types::{ChatId, MessageId, UserId};

    use super::*;
    use crate::url_detector::{DownloadOptions, DownloadOrigin, UrlCategory};

    #[test]
    fn counters() {
        let stats = AutoDownloadStats::default();
        stats.count_detected(3);
        stats.count_auto_downloaded();
        stats.count_prompted();
        stats.count_prompted();
        stats.count_failed();

        assert_eq!(
            stats.snapshot(),
            AutoDownloadStatsSnapshot {
                total_detected: 3,
                auto_downloaded: 1,
                user_prompted: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn lifetimes() {
        assert_eq!(Lifetime::Failure.duration(), Duration::from_secs(5));
        assert_eq!(Lifetime::Notice.duration(), Duration::from_secs(10));
        // Long enough to read it and press a button.
        assert!(Lifetime::Prompt.duration() >= Duration::from_secs(60));
    }

    #[test]
    fn announcement_has_the_command() {
        let request = DownloadRequest {
            url: "https://example.com/a?b=1&c=2".to_owned(),
            category: UrlCategory::Http,
            priority: 20,
            origin: DownloadOrigin {
                chat_id: ChatId(1),
                user_id: UserId(2),
                message_id: MessageId(3),
            },
            options: DownloadOptions {
                extract: true,
                ..Default::default()
            },
        };

        let text = download_announcement(&request);
        assert!(text.contains("<code>http</code>"));
        assert!(text.contains("<code>/mirror -e https://example.com/a?b=1&amp;c=2</code>"));
    }
}
