//! Download Guard Bot: keeps adult content away from a Telegram download bot,
//! and hands the links it knows how to download over to it.

/// Adult content classifier for links.
pub mod content_filter;

/// Link type detection and download dispatching.
pub mod url_detector;

/// Per-user preferences.
pub mod settings;

/// Turning scans and preferences into chat actions.
pub mod guard;

/// The database.
mod database;

/// Miscellaneous functions.
mod misc;

/// Functions that perform stuff via the bot.
mod actions;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;

use std::num::NonZeroUsize;

/// How many scan results the content filter remembers.
pub const SCAN_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(2048).unwrap();

/// How many downloads can wait in the queue before new ones are refused.
pub const DOWNLOAD_QUEUE_CAPACITY: usize = 256;

/// How many links waiting for a button press are remembered.
pub const PENDING_URL_LIMIT: NonZeroUsize = NonZeroUsize::new(4096).unwrap();
