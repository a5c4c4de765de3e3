use std::{fs, sync::Arc};
use teloxide::{dptree::deps, prelude::*};

use crate::{
    actions::{download_queue_spinloop, AutoDownloadStats},
    content_filter::ContentFilter,
    database::Database,
    handlers::{generate_bot_commands, handle_callback_query, handle_message, BotState, PendingUrls},
    url_detector::{QueueSink, UrlDetector},
    DOWNLOAD_QUEUE_CAPACITY, PENDING_URL_LIMIT, SCAN_CACHE_CAPACITY,
};

/// # Panics
///
/// Panics if there's no key file, or if the database fails to open.
pub async fn entry() {
    log::info!("Starting up the guard...");
    let key = fs::read_to_string(match cfg!(debug_assertions) {
        true => "key_debug",
        false => "key",
    })
    .expect("Could not load bot key file!");

    let bot = Bot::new(key.trim());

    bot.set_my_commands(generate_bot_commands())
        .await
        .expect("Failed to set bot commands!");

    let database = Database::new().await.expect("Failed to create database!");

    let (sink, queue) = QueueSink::new(DOWNLOAD_QUEUE_CAPACITY);
    let stats = Arc::new(AutoDownloadStats::default());

    tokio::spawn(download_queue_spinloop(
        bot.clone(),
        queue,
        Arc::downgrade(&stats),
    ));

    let state = Arc::new(BotState {
        database,
        filter: ContentFilter::new(SCAN_CACHE_CAPACITY),
        detector: UrlDetector::new(Arc::new(sink)),
        stats,
        pending: PendingUrls::new(PENDING_URL_LIMIT),
    });

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_edited_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query));

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher stopped, shutting down.");
}
