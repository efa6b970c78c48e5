//! Telegram delivery using teloxide.
//!
//! Maps the composer's reply values onto the platform send operations.

use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQuery, InlineQueryResult,
    InlineQueryResultArticle, InlineQueryResultPhoto, InputFile, InputMedia, InputMediaPhoto,
    InputMessageContent, InputMessageContentText, LinkPreviewOptions, MessageEntity,
    MessageEntityKind, MessageId, ReplyParameters,
};
use tracing::warn;
use url::Url;

use crate::compose::{Control, InlineItem, OutboundReply, TextReply};

const DEEP_LINK_LABEL: &str = "LaTeX";

pub struct Transport {
    bot: Bot,
}

impl Transport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub async fn deliver(&self, chat_id: ChatId, reply: OutboundReply) -> Result<(), String> {
        match reply {
            OutboundReply::Text(text) => self.send_text(chat_id, text).await,
            OutboundReply::Photo {
                url,
                reply_to,
                control,
            } => self.send_photo(chat_id, &url, reply_to, control).await,
            OutboundReply::PhotoGroup { urls, reply_to } => {
                self.send_photo_group(chat_id, &urls, reply_to).await
            }
        }
    }

    async fn send_text(&self, chat_id: ChatId, reply: TextReply) -> Result<(), String> {
        let mut request = self.bot.send_message(chat_id, &reply.text);

        if reply.monospace {
            // Entity lengths are measured in UTF-16 code units
            let length = reply.text.encode_utf16().count();
            request = request.entities(vec![MessageEntity::new(MessageEntityKind::Code, 0, length)]);
        }
        if reply.disable_link_preview {
            request = request.link_preview_options(LinkPreviewOptions {
                is_disabled: true,
                url: None,
                prefer_small_media: false,
                prefer_large_media: false,
                show_above_text: false,
            });
        }
        if let Some(message_id) = reply.reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id));
        }
        if let Some(markup) = reply.control.as_ref().and_then(keyboard) {
            request = request.reply_markup(markup);
        }

        request.await.map(drop).map_err(|e| {
            let msg = format!("Failed to send text: {e}");
            warn!("{}", msg);
            msg
        })
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        url: &str,
        reply_to: Option<MessageId>,
        control: Option<Control>,
    ) -> Result<(), String> {
        let photo = Url::parse(url).map_err(|e| format!("Invalid image URL '{url}': {e}"))?;
        let mut request = self.bot.send_photo(chat_id, InputFile::url(photo));

        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id));
        }
        if let Some(markup) = control.as_ref().and_then(keyboard) {
            request = request.reply_markup(markup);
        }

        request.await.map(drop).map_err(|e| {
            let msg = format!("Failed to send photo: {e}");
            warn!("{}", msg);
            msg
        })
    }

    async fn send_photo_group(
        &self,
        chat_id: ChatId,
        urls: &[String],
        reply_to: MessageId,
    ) -> Result<(), String> {
        let media: Vec<InputMedia> = urls
            .iter()
            .filter_map(|url| match Url::parse(url) {
                Ok(url) => Some(InputMedia::Photo(InputMediaPhoto::new(InputFile::url(url)))),
                Err(e) => {
                    warn!("Skipping unparseable image URL '{url}': {e}");
                    None
                }
            })
            .collect();

        self.bot
            .send_media_group(chat_id, media)
            .reply_parameters(ReplyParameters::new(reply_to))
            .await
            .map(drop)
            .map_err(|e| {
                let msg = format!("Failed to send media group: {e}");
                warn!("{}", msg);
                msg
            })
    }

    pub async fn answer_inline(
        &self,
        query: &InlineQuery,
        items: Vec<InlineItem>,
    ) -> Result<(), String> {
        let results: Vec<InlineQueryResult> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| inline_result(index, item))
            .collect();

        self.bot
            .answer_inline_query(query.id.clone(), results)
            .await
            .map(drop)
            .map_err(|e| {
                let msg = format!("Failed to answer inline query: {e}");
                warn!("{}", msg);
                msg
            })
    }
}

fn inline_result(index: usize, item: InlineItem) -> Option<InlineQueryResult> {
    match item {
        InlineItem::InvalidFormula { formula } => Some(InlineQueryResult::Article(
            InlineQueryResultArticle::new(
                "err",
                "Invalid LaTeX",
                InputMessageContent::Text(InputMessageContentText::new(formula.clone())),
            )
            .description(formula),
        )),
        InlineItem::Photo { url, control } => {
            let photo = match Url::parse(&url) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping unparseable image URL '{url}': {e}");
                    return None;
                }
            };
            let mut result =
                InlineQueryResultPhoto::new(index.to_string(), photo.clone(), photo);
            if let Some(markup) = keyboard(&control) {
                result = result.reply_markup(markup);
            }
            Some(InlineQueryResult::Photo(result))
        }
    }
}

fn keyboard(control: &Control) -> Option<InlineKeyboardMarkup> {
    match control {
        Control::DeepLink { url } => match Url::parse(url) {
            Ok(url) => Some(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::url(DEEP_LINK_LABEL, url),
            ]])),
            Err(e) => {
                warn!("Unparseable deep link '{url}': {e}");
                None
            }
        },
        Control::SwitchInline => Some(InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::switch_inline_query_current_chat(
                "try it", "",
            )],
            vec![InlineKeyboardButton::switch_inline_query("send it", "")],
        ])),
    }
}
