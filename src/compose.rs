//! Builds outbound replies from render outcomes.
//!
//! Pure decision table: every branch of the chat-context matrix maps to
//! exactly one reply value (or none), with delivery left to the transport.

use teloxide::types::MessageId;

use crate::deeplink;
use crate::event::BotIdentity;

/// Telegram caps media groups at ten entries.
const MEDIA_GROUP_LIMIT: usize = 10;

const WELCOME_TEXT: &str = "Hi! I can render LaTeX formulas to images!";
const INVALID_LATEX_TEXT: &str = "This is invalid LaTeX and could not be rendered";

/// A formula paired with its render outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub formula: String,
    pub image_url: Option<String>,
}

/// Keyboard attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// URL button that reopens the bot with the formula pre-filled.
    DeepLink { url: String },
    /// "try it" / "send it" switch-inline buttons on the welcome message.
    SwitchInline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReply {
    pub text: String,
    /// Style the whole text as a `code` entity.
    pub monospace: bool,
    pub disable_link_preview: bool,
    pub reply_to: Option<MessageId>,
    pub control: Option<Control>,
}

impl TextReply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            monospace: false,
            disable_link_preview: false,
            reply_to: None,
            control: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundReply {
    Text(TextReply),
    Photo {
        url: String,
        reply_to: Option<MessageId>,
        control: Option<Control>,
    },
    /// Always 2..=10 entries; a single success uses `Photo` instead.
    PhotoGroup {
        urls: Vec<String>,
        reply_to: MessageId,
    },
}

/// One entry of an inline-query answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineItem {
    /// Error-styled article result carrying the formula text.
    InvalidFormula { formula: String },
    Photo { url: String, control: Control },
}

fn deep_link(me: &BotIdentity, formula: &str) -> Control {
    Control::DeepLink {
        url: deeplink::start_link(&me.username, formula),
    }
}

/// Welcome message for a bare `/start`.
pub fn welcome() -> OutboundReply {
    OutboundReply::Text(TextReply {
        control: Some(Control::SwitchInline),
        ..TextReply::plain(WELCOME_TEXT)
    })
}

/// Echo a deep-linked formula back as a monospace block.
pub fn start_echo(formula: &str) -> OutboundReply {
    OutboundReply::Text(TextReply {
        monospace: true,
        ..TextReply::plain(formula)
    })
}

/// Fixed `/help` text: extraction rules and attribution.
pub fn help(me: &BotIdentity) -> OutboundReply {
    let text = format!(
        "I can render LaTeX to images.\n\
         \n\
         RENDERING is always done inside an align* environment.\n\
         \n\
         INPUT is read from\n\
         \x20 - inline queries (typing @{username} ...)\n\
         \x20 - text messages in a private chat\n\
         \x20 - code/pre formatting inside text messages in a group chat \
         if the formatted pieces of text are surrounded by $ signs\n\
         \n\
         CREDIT goes to latex2image.joeraut.com",
        username = me.username
    );
    OutboundReply::Text(TextReply {
        disable_link_preview: true,
        ..TextReply::plain(text)
    })
}

/// Private chat: photo on success, a failure notice replying to the original
/// message otherwise. No control either way.
pub fn private(message_id: MessageId, rendered: &Rendered) -> OutboundReply {
    match &rendered.image_url {
        Some(url) => OutboundReply::Photo {
            url: url.clone(),
            reply_to: None,
            control: None,
        },
        None => OutboundReply::Text(TextReply {
            reply_to: Some(message_id),
            ..TextReply::plain(INVALID_LATEX_TEXT)
        }),
    }
}

/// Group chat: silence on zero successes, a single photo with a deep-link
/// control on one, a capped media group (no control) on several.
pub fn group(message_id: MessageId, rendered: &[Rendered], me: &BotIdentity) -> Option<OutboundReply> {
    let successes: Vec<(&str, &str)> = rendered
        .iter()
        .filter_map(|r| r.image_url.as_deref().map(|url| (r.formula.as_str(), url)))
        .collect();

    match successes.as_slice() {
        [] => None,
        [(formula, url)] => Some(OutboundReply::Photo {
            url: url.to_string(),
            reply_to: Some(message_id),
            control: Some(deep_link(me, formula)),
        }),
        many => Some(OutboundReply::PhotoGroup {
            urls: many
                .iter()
                .take(MEDIA_GROUP_LIMIT)
                .map(|(_, url)| url.to_string())
                .collect(),
            reply_to: message_id,
        }),
    }
}

/// Inline query: empty result set for no candidate, an error article for a
/// failed render, a photo result with a deep-link control for a success.
pub fn inline(rendered: Option<&Rendered>, me: &BotIdentity) -> Vec<InlineItem> {
    match rendered {
        None => Vec::new(),
        Some(r) => match &r.image_url {
            None => vec![InlineItem::InvalidFormula {
                formula: r.formula.clone(),
            }],
            Some(url) => vec![InlineItem::Photo {
                url: url.clone(),
                control: deep_link(me, &r.formula),
            }],
        },
    }
}
