use std::future::Future;

use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters},
    requests::Requester,
    sugar::request::{RequestLinkPreviewExt, RequestReplyExt},
    types::{InlineKeyboardMarkup, Message, ParseMode, UserId},
    Bot, RequestError,
};

pub trait MessageStuff {
    /// Text of the message, or its caption if it's a media message.
    fn text_full(&self) -> Option<&str>;
    /// ID of the user that sent this message, if it was sent by a user.
    fn sender_user_id(&self) -> Option<UserId>;
}

impl MessageStuff for Message {
    fn text_full(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }
    fn sender_user_id(&self) -> Option<UserId> {
        self.from.as_ref().map(|user| user.id)
    }
}

pub trait BotStuff {
    /// Reply to `to` with HTML formatted `text`, with link previews disabled.
    fn reply_html(
        &self,
        to: &Message,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<Message, RequestError>> + Send;

    /// Replace the text of `message` with HTML formatted `text` and drop its keyboard.
    fn edit_html(
        &self,
        message: &Message,
        text: String,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl BotStuff for Bot {
    async fn reply_html(
        &self,
        to: &Message,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, RequestError> {
        let mut request = self
            .send_message(to.chat.id, text)
            .parse_mode(ParseMode::Html)
            .reply_to(to.id)
            .disable_link_preview(true);

        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }

        request.await
    }

    async fn edit_html(&self, message: &Message, text: String) -> Result<(), RequestError> {
        self.edit_message_text(message.chat.id, message.id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(InlineKeyboardMarkup {
                inline_keyboard: Vec::new(),
            })
            .disable_link_preview(true)
            .await?;
        Ok(())
    }
}
