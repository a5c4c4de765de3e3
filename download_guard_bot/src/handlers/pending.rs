use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;
use teloxide::types::UserId;

use crate::url_detector::DownloadOrigin;

/// A link waiting for its user to press a button about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUrl {
    pub url: String,
    pub origin: DownloadOrigin,
    /// Stopped by the content filter, as opposed to just warned about or offered.
    pub blocked: bool,
}

/// Hash identifying a URL in callback data, which is too small for whole URLs.
pub fn url_hash(url: &str) -> u32 {
    crc32fast::hash(url.as_bytes())
}

/// Links waiting for button presses, keyed by user and URL hash.
/// The oldest ones are forgotten once there are too many.
pub struct PendingUrls {
    urls: Mutex<LruCache<(UserId, u32), PendingUrl>>,
}

impl PendingUrls {
    pub fn new(capacity: NonZeroUsize) -> PendingUrls {
        PendingUrls {
            urls: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn urls(&self) -> MutexGuard<'_, LruCache<(UserId, u32), PendingUrl>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remember the link, returning the hash to put in callback data.
    pub fn insert(&self, pending: PendingUrl) -> u32 {
        let hash = url_hash(&pending.url);
        self.urls().put((pending.origin.user_id, hash), pending);
        hash
    }

    /// Look the link up without forgetting it.
    pub fn get(&self, user: UserId, hash: u32) -> Option<PendingUrl> {
        self.urls().get(&(user, hash)).cloned()
    }

    /// Look the link up and forget it.
    pub fn take(&self, user: UserId, hash: u32) -> Option<PendingUrl> {
        self.urls().pop(&(user, hash))
    }

    pub fn len(&self) -> usize {
        self.urls().len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use teloxide::types::{ChatId, MessageId};

    use super::*;

    fn pending(url: &str, user: u64) -> PendingUrl {
        PendingUrl {
            url: url.to_owned(),
            origin: DownloadOrigin {
                chat_id: ChatId(1),
                user_id: UserId(user),
                message_id: MessageId(1),
            },
            blocked: false,
        }
    }

    #[test]
    fn keyed_by_user_and_hash() {
        let urls = PendingUrls::new(NonZeroUsize::new(8).unwrap());
        let hash = urls.insert(pending("https://example.com/", 5));
        assert_eq!(hash, url_hash("https://example.com/"));

        assert!(urls.get(UserId(6), hash).is_none());
        assert_eq!(urls.get(UserId(5), hash).unwrap().url, "https://example.com/");
        assert_eq!(urls.take(UserId(5), hash).unwrap().url, "https://example.com/");
        assert!(urls.take(UserId(5), hash).is_none());
    }

    #[test]
    fn forgets_the_oldest() {
        let urls = PendingUrls::new(NonZeroUsize::new(2).unwrap());
        let first = urls.insert(pending("https://a.example/", 1));
        urls.insert(pending("https://b.example/", 1));
        urls.insert(pending("https://c.example/", 1));

        assert_eq!(urls.len(), 2);
        assert!(urls.get(UserId(1), first).is_none());
    }
}
