mod callbacks;
mod commands;
mod pending;

use std::{ops::Range, sync::Arc};

use bot_commons::useful_methods::*;
use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    types::{InlineKeyboardMarkup, Me, Message, ParseMode},
    Bot, RequestError,
};

pub use self::callbacks::handle_callback_query;
pub use self::pending::PendingUrls;

use self::callbacks::{CallbackData, NsfwAction};
use self::commands::{Command, CommandParams};
use self::pending::PendingUrl;

use crate::{
    actions::{delete_later, AutoDownloadStats, Lifetime},
    content_filter::ContentFilter,
    database::Database,
    guard::{check_url, deleted_notice, verdict_message, GuardAction},
    misc::{sender_name_prettyprint, shorten_url},
    url_detector::{DownloadOrigin, DownloadRequest, UrlDetector},
};

/// Everything the handlers share.
pub struct BotState {
    pub database: Arc<Database>,
    pub filter: ContentFilter,
    pub detector: UrlDetector,
    pub stats: Arc<AutoDownloadStats>,
    pub pending: PendingUrls,
}

pub fn generate_bot_commands() -> Vec<teloxide::types::BotCommand> {
    Command::generate_bot_commands()
}

/// Whether a message just arrived or was edited into what it is now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    New,
    Edited,
}

impl Delivery {
    fn of(message: &Message) -> Delivery {
        match message.edit_date() {
            Some(_) => Delivery::Edited,
            None => Delivery::New,
        }
    }

    /// Links of edited messages only go through the content filter.
    fn starts_downloads(self) -> bool {
        self == Delivery::New
    }
}

/// Handles both new and edited messages.
pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    state: Arc<BotState>,
) -> Result<(), RequestError> {
    // Ignore bots, including ourselves.
    if message.from.as_ref().is_some_and(|x| x.is_bot) {
        return Ok(());
    }

    let delivery = Delivery::of(&message);
    if delivery == Delivery::Edited {
        return handle_links(&bot, &state, &message, delivery).await;
    }

    if let Some(command) =
        CommandParams::new(&state, &bot, &message).and_then(|cp| cp.run(&me))
    {
        return command.await;
    }

    if message.text_full().is_some_and(|x| x.starts_with('/')) {
        // Someone else's command.
        return Ok(());
    }

    handle_links(&bot, &state, &message, delivery).await
}

/// Cut the `spans` out of the text, leaving what surrounds them.
fn text_without_urls(text: &str, spans: &[Range<usize>]) -> String {
    let mut spans = spans.to_vec();
    spans.sort_by_key(|x| x.start);

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        if span.start >= cursor {
            result.push_str(&text[cursor..span.start]);
            result.push(' ');
        }
        cursor = cursor.max(span.end);
    }
    result.push_str(&text[cursor..]);
    result
}

/// Check every link in a message with the content filter, and start or offer
/// downloads of the ones that pass.
async fn handle_links(
    bot: &Bot,
    state: &BotState,
    message: &Message,
    delivery: Delivery,
) -> Result<(), RequestError> {
    let Some(text) = message.text_full() else {
        return Ok(());
    };

    let found = state.detector.extract_url_spans(text);
    if found.is_empty() {
        return Ok(());
    }
    if delivery.starts_downloads() {
        state.stats.count_detected(found.len() as u64);
    }

    let Some(user) = message.sender_user_id() else {
        log::debug!("Ignoring links from an anonymous sender.");
        return Ok(());
    };

    let settings = state
        .database
        .get_settings(user)
        .await
        .expect("Database died!");
    let has_settings = state
        .database
        .has_settings(user)
        .await
        .expect("Database died!");
    let download_policy = has_settings.then_some(&settings.auto_download);

    let origin = DownloadOrigin {
        chat_id: message.chat.id,
        user_id: user,
        message_id: message.id,
    };

    let spans: Vec<Range<usize>> = found.into_iter().map(|(span, _)| span).collect();
    let urls: Vec<String> = spans.iter().map(|x| text[x.clone()].to_owned()).collect();
    let context = text_without_urls(text, &spans);

    let mut stopped = Vec::new();
    let mut to_download: Vec<DownloadRequest> = Vec::new();

    for url in &urls {
        let verdict = check_url(&state.filter, &settings, url, context.trim(), "");

        if !verdict.action.allows_download() {
            log::debug!("Stopped {url} with {:?}", verdict.action);
            stopped.push((url, verdict));
            continue;
        }

        if verdict.action == GuardAction::Warn {
            if let Some(warning) = verdict_message(url, &verdict) {
                let hash = state.pending.insert(PendingUrl {
                    url: url.clone(),
                    origin,
                    blocked: false,
                });
                let markup = settings.nsfw_filter.report_enabled.then(|| {
                    InlineKeyboardMarkup::new(vec![vec![
                        nsfw_button(NsfwAction::FalsePositive, origin, hash, "📝 Report if Safe"),
                        nsfw_button(NsfwAction::Missed, origin, hash, "🚫 Report if NSFW"),
                    ]])
                });
                let sent = bot.reply_html(message, warning, markup).await?;
                delete_later(bot, &sent, Lifetime::Prompt);
            }
        }

        if !delivery.starts_downloads() {
            continue;
        }

        if state.detector.is_auto_downloadable(url, download_policy) {
            to_download.push(state.detector.make_request(url, origin, download_policy));
        } else {
            let (category, metadata) = state.detector.classify(url);
            if state.detector.should_prompt(category, download_policy) {
                prompt_download(bot, state, message, origin, url, &metadata.domain, category)
                    .await?;
            }
        }
    }

    if !stopped.is_empty() && settings.nsfw_filter.auto_delete_nsfw {
        match bot.delete_message(message.chat.id, message.id).await {
            Ok(_) => {
                log::info!(
                    "Deleted a message with {} NSFW link(s) from user {user}",
                    stopped.len()
                );
                let sent = bot
                    .send_message(message.chat.id, deleted_notice(stopped.len()))
                    .parse_mode(ParseMode::Html)
                    .await?;
                delete_later(bot, &sent, Lifetime::Notice);
                // The message is gone, so are the downloads from it.
                return Ok(());
            }
            Err(e) => {
                log::warn!("Failed to delete a message with NSFW links: {e}");
                bot.reply_html(
                    message,
                    format!(
                        "Tried to remove a message from {} containing NSFW links, but failed. \
                        Is this bot an admin with ability to remove messages?",
                        sender_name_prettyprint(message)
                    ),
                    None,
                )
                .await?;
            }
        }
    }

    for (url, verdict) in &stopped {
        let Some(text) = verdict_message(url, verdict) else {
            continue;
        };

        let hash = state.pending.insert(PendingUrl {
            url: (*url).clone(),
            origin,
            blocked: true,
        });

        let mut rows = Vec::new();
        if verdict.action == GuardAction::OverrideAvailable {
            rows.push(vec![
                nsfw_button(NsfwAction::Override, origin, hash, "✅ Override & Download"),
                nsfw_button(NsfwAction::Keep, origin, hash, "❌ Keep Blocked"),
            ]);
        }
        if settings.nsfw_filter.report_enabled {
            rows.push(vec![nsfw_button(
                NsfwAction::FalsePositive,
                origin,
                hash,
                "📝 Report False Positive",
            )]);
        }

        let markup = (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows));
        bot.reply_html(message, text, markup).await?;
    }

    if to_download.is_empty() {
        return Ok(());
    }

    for (url, result) in state.detector.dispatch_batch(to_download) {
        if let Err(e) = result {
            log::warn!("Could not queue download of {url}: {e}");
            state.stats.count_failed();
            let sent = bot
                .reply_html(
                    message,
                    format!(
                        "❌ Failed to start downloading <code>{}</code>: {e}",
                        html_escape::encode_text(&shorten_url(&url, 50))
                    ),
                    None,
                )
                .await?;
            delete_later(bot, &sent, Lifetime::Failure);
        }
    }

    Ok(())
}

fn nsfw_button(
    action: NsfwAction,
    origin: DownloadOrigin,
    hash: u32,
    text: &str,
) -> teloxide::types::InlineKeyboardButton {
    CallbackData::Nsfw {
        action,
        user: origin.user_id,
        hash,
    }
    .button(text)
}

/// Ask the user whether to download a link.
async fn prompt_download(
    bot: &Bot,
    state: &BotState,
    message: &Message,
    origin: DownloadOrigin,
    url: &str,
    domain: &str,
    category: crate::url_detector::UrlCategory,
) -> Result<(), RequestError> {
    let hash = state.pending.insert(PendingUrl {
        url: url.to_owned(),
        origin,
        blocked: false,
    });

    let answer = |accept| CallbackData::AutoDownload {
        accept,
        user: origin.user_id,
        hash,
    };
    let markup = InlineKeyboardMarkup::new(vec![vec![
        answer(true).button("✅ Download"),
        answer(false).button("❌ Skip"),
    ]]);

    let text = format!(
        "🔗 <b>URL Detected</b>\n\n\
        <b>Domain:</b> <code>{}</code>\n\
        <b>Type:</b> <code>{category}</code>\n\
        <b>URL:</b> <code>{}</code>\n\n\
        Would you like to download this?",
        html_escape::encode_text(if domain.is_empty() { "unknown" } else { domain }),
        html_escape::encode_text(&shorten_url(url, 50)),
    );

    let sent = bot.reply_html(message, text, Some(markup)).await?;
    delete_later(bot, &sent, Lifetime::Prompt);
    state.stats.count_prompted();
    log::debug!("Prompted about {url}, {} links pending", state.pending.len());
    Ok(())
}
