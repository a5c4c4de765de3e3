use std::{fmt::Display, str::FromStr, sync::Arc};

use bot_commons::useful_methods::BotStuff;
use teloxide::{
    payloads::AnswerCallbackQuerySetters,
    requests::Requester,
    types::{CallbackQuery, InlineKeyboardButton, UserId},
    Bot, RequestError,
};

use super::{pending::PendingUrl, BotState};
use crate::guard::ReportKind;

/// What a content filter button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsfwAction {
    /// Download the blocked link anyway.
    Override,
    /// Leave it blocked.
    Keep,
    FalsePositive,
    Missed,
}

impl NsfwAction {
    const ALL: [NsfwAction; 4] = [
        NsfwAction::Override,
        NsfwAction::Keep,
        NsfwAction::FalsePositive,
        NsfwAction::Missed,
    ];

    /// Whether pressing this about `pending` starts downloading it.
    /// Reporting a blocked link as safe lets it through.
    pub fn downloads(&self, pending: &PendingUrl) -> bool {
        match self {
            NsfwAction::Override => true,
            NsfwAction::FalsePositive => pending.blocked,
            NsfwAction::Keep | NsfwAction::Missed => false,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            NsfwAction::Override => "override",
            NsfwAction::Keep => "keep",
            NsfwAction::FalsePositive => "fp",
            NsfwAction::Missed => "missed",
        }
    }
}

/// Data of an inline keyboard button, like `nsfw override 1234 567890`.
///
/// Telegram only allows 64 bytes of it, so links are referred to by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    Nsfw {
        action: NsfwAction,
        user: UserId,
        hash: u32,
    },
    AutoDownload {
        accept: bool,
        user: UserId,
        hash: u32,
    },
}

impl CallbackData {
    /// The only user allowed to press this button.
    pub fn user(&self) -> UserId {
        match self {
            CallbackData::Nsfw { user, .. } | CallbackData::AutoDownload { user, .. } => *user,
        }
    }

    pub fn hash(&self) -> u32 {
        match self {
            CallbackData::Nsfw { hash, .. } | CallbackData::AutoDownload { hash, .. } => *hash,
        }
    }

    pub fn button(self, text: &str) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(text.to_string(), self.to_string())
    }
}

impl Display for CallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackData::Nsfw { action, user, hash } => {
                write!(f, "nsfw {} {} {}", action.as_str(), user, hash)
            }
            CallbackData::AutoDownload { accept, user, hash } => {
                let answer = if *accept { "yes" } else { "no" };
                write!(f, "autodl {answer} {user} {hash}")
            }
        }
    }
}

impl FromStr for CallbackData {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split(' ');

        let (Some(kind), Some(action), Some(user), Some(hash), None) = (
            words.next(),
            words.next(),
            words.next(),
            words.next(),
            words.next(),
        ) else {
            return Err("wrong amount of words");
        };

        let user = UserId(user.parse().map_err(|_| "bad user ID")?);
        let hash = hash.parse().map_err(|_| "bad URL hash")?;

        match kind {
            "nsfw" => {
                let action = NsfwAction::ALL
                    .into_iter()
                    .find(|x| x.as_str() == action)
                    .ok_or("unknown action")?;
                Ok(CallbackData::Nsfw { action, user, hash })
            }
            "autodl" => {
                let accept = match action {
                    "yes" => true,
                    "no" => false,
                    _ => return Err("unknown action"),
                };
                Ok(CallbackData::AutoDownload { accept, user, hash })
            }
            _ => Err("unknown kind"),
        }
    }
}

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    state: Arc<BotState>,
) -> Result<(), RequestError> {
    macro_rules! goodbye {
        ($text:expr) => {
            bot.answer_callback_query(query.id.clone())
                .text($text)
                .await?;
            return Ok(());
        };
    }

    let Some(data) = query.data.as_deref() else {
        goodbye!("No query data.");
    };

    let data = match data.parse::<CallbackData>() {
        Ok(x) => x,
        Err(e) => {
            log::warn!("Invalid callback data {data:?}: {e}");
            goodbye!(format!("Invalid query data: {e}"));
        }
    };

    if query.from.id != data.user() {
        bot.answer_callback_query(query.id.clone())
            .text("❌ Not your request!")
            .show_alert(true)
            .await?;
        return Ok(());
    }

    let user = data.user();
    let hash = data.hash();

    // Reports don't resolve the link, so people can still press other buttons after.
    let pending = match data {
        CallbackData::Nsfw {
            action: NsfwAction::Missed,
            ..
        } => state.pending.get(user, hash),
        _ => state.pending.take(user, hash),
    };

    let Some(pending) = pending else {
        goodbye!("This request has expired.");
    };
    let blocked_download = match data {
        CallbackData::Nsfw { action, .. } => action.downloads(&pending),
        CallbackData::AutoDownload { .. } => false,
    };
    let PendingUrl { url, origin, .. } = pending;

    let settings = state
        .database
        .get_settings(user)
        .await
        .expect("Database died!");

    let prompt_message = query.regular_message();

    let (answer, edit) = match data {
        CallbackData::Nsfw {
            action: NsfwAction::Override,
            ..
        } => {
            if !settings.nsfw_filter.allow_override {
                goodbye!("Overriding is disabled in your NSFW filter settings.");
            }

            log::info!("User {user} overrode the NSFW block of {url}");
            let request = state
                .detector
                .make_request(&url, origin, Some(&settings.auto_download));

            match state.detector.dispatch(request) {
                Ok(()) => ("✅ Download started!", Some("✅ <i>Block overridden, downloading.</i>")),
                Err(e) => {
                    log::warn!("Could not queue overridden download of {url}: {e}");
                    state.stats.count_failed();
                    ("❌ Failed to start the download.", None)
                }
            }
        }
        CallbackData::Nsfw {
            action: NsfwAction::Keep,
            ..
        } => ("Kept blocked.", Some("🚫 <i>Kept blocked.</i>")),
        CallbackData::Nsfw { action, .. } => {
            if !settings.nsfw_filter.report_enabled {
                goodbye!("Reporting is disabled in your NSFW filter settings.");
            }

            let kind = match action {
                NsfwAction::FalsePositive => {
                    state.filter.report_false_positive(&url, user.0);
                    ReportKind::FalsePositive
                }
                _ => {
                    state.filter.report_missed(&url, user.0);
                    ReportKind::Missed
                }
            };

            state
                .database
                .add_report(user, &url, kind)
                .await
                .expect("Database died!");

            if !blocked_download {
                ("📝 Thanks for the report!", None)
            } else {
                log::info!("User {user} reported {url} as safe, downloading it");
                let request = state
                    .detector
                    .make_request(&url, origin, Some(&settings.auto_download));

                match state.detector.dispatch(request) {
                    Ok(()) => (
                        "📝 Thanks for the report! Download started.",
                        Some("📝 <i>Reported as safe, downloading.</i>"),
                    ),
                    Err(e) => {
                        log::warn!("Could not queue reported download of {url}: {e}");
                        state.stats.count_failed();
                        ("📝 Thanks for the report! The download failed to start.", None)
                    }
                }
            }
        }
        CallbackData::AutoDownload { accept: true, .. } => {
            let request = state
                .detector
                .make_request(&url, origin, Some(&settings.auto_download));

            match state.detector.dispatch(request) {
                Ok(()) => ("✅ Download started!", None),
                Err(e) => {
                    log::warn!("Could not queue download of {url}: {e}");
                    state.stats.count_failed();
                    ("❌ Failed to start the download.", None)
                }
            }
        }
        CallbackData::AutoDownload { accept: false, .. } => ("Download skipped.", None),
    };

    bot.answer_callback_query(query.id.clone())
        .text(answer)
        .await?;

    let Some(message) = prompt_message else {
        return Ok(());
    };

    match (data, edit) {
        (_, Some(text)) => {
            let original = message.text().unwrap_or_default();
            let text = format!("{}\n\n{text}", html_escape::encode_text(original));
            bot.edit_html(message, text).await?;
        }
        (CallbackData::AutoDownload { .. }, None) => {
            // No biggie if it's already gone.
            let _ = bot.delete_message(message.chat.id, message.id).await;
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use teloxide::types::{ChatId, MessageId};

    use super::*;
    use crate::url_detector::DownloadOrigin;

    #[test]
    fn string_form() {
        let all = NsfwAction::ALL
            .into_iter()
            .map(|action| CallbackData::Nsfw {
                action,
                user: UserId(123456789),
                hash: u32::MAX,
            })
            .chain([true, false].map(|accept| CallbackData::AutoDownload {
                accept,
                user: UserId(u64::MAX),
                hash: 0,
            }));

        for data in all {
            let text = data.to_string();
            assert!(text.len() <= 64, "{text} is too long for Telegram");
            assert_eq!(text.parse::<CallbackData>(), Ok(data));
        }

        assert_eq!(
            CallbackData::AutoDownload {
                accept: true,
                user: UserId(5),
                hash: 7
            }
            .to_string(),
            "autodl yes 5 7"
        );
    }

    #[test]
    fn which_buttons_download() {
        let mut pending = PendingUrl {
            url: "https://example.com/".to_owned(),
            origin: DownloadOrigin {
                chat_id: ChatId(1),
                user_id: UserId(2),
                message_id: MessageId(3),
            },
            blocked: true,
        };

        assert!(NsfwAction::Override.downloads(&pending));
        assert!(NsfwAction::FalsePositive.downloads(&pending));
        assert!(!NsfwAction::Keep.downloads(&pending));
        assert!(!NsfwAction::Missed.downloads(&pending));

        // Warned links went through already.
        pending.blocked = false;
        assert!(!NsfwAction::FalsePositive.downloads(&pending));
    }

    #[test]
    fn junk() {
        for junk in [
            "",
            "nsfw",
            "nsfw override 1",
            "nsfw override 1 2 3",
            "nsfw sideways 1 2",
            "autodl maybe 1 2",
            "nsfw fp one 2",
            "nsfw fp 1 -2",
            "download yes 1 2",
        ] {
            assert!(junk.parse::<CallbackData>().is_err(), "{junk} parsed");
        }
    }
}
