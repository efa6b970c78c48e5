//! Classification of raw Telegram updates into inbound events.
//!
//! Every update is classified exactly once at the boundary; everything
//! downstream consumes only the resulting [`InboundEvent`] variant.

use teloxide::types::{ChatId, Message, MessageEntityKind, MessageId, UserId};

/// The bot's own identity, fetched once at startup via `getMe`.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: UserId,
    pub username: String,
}

/// One classified inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start`, optionally with a deep-link payload.
    Start {
        chat_id: ChatId,
        payload: Option<String>,
    },
    /// `/help`.
    Help { chat_id: ChatId },
    /// Free text in a private chat.
    PrivateText {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    /// Text in a group or supergroup; `spans` holds the literal text of
    /// code/pre entities in order of appearance.
    GroupText {
        chat_id: ChatId,
        message_id: MessageId,
        spans: Vec<String>,
    },
    /// An inline query's raw text.
    InlineQuery { query: String },
}

/// Classify a message update. `None` means the update is dropped.
pub fn classify_message(msg: &Message, me: &BotIdentity) -> Option<InboundEvent> {
    // Messages sent through the bot itself would feed back into it forever.
    if msg.via_bot.as_ref().is_some_and(|bot| bot.id == me.id) {
        return None;
    }

    let text = msg.text()?;

    if let Some((command, payload)) = parse_command(text, &me.username) {
        match command.as_str() {
            "start" => {
                return Some(InboundEvent::Start {
                    chat_id: msg.chat.id,
                    payload: payload.map(str::to_string),
                });
            }
            "help" => return Some(InboundEvent::Help { chat_id: msg.chat.id }),
            // Unknown commands fall through to plain text handling
            _ => {}
        }
    }

    if msg.chat.is_private() {
        return Some(InboundEvent::PrivateText {
            chat_id: msg.chat.id,
            message_id: msg.id,
            text: text.to_string(),
        });
    }

    if msg.chat.is_group() || msg.chat.is_supergroup() {
        return Some(InboundEvent::GroupText {
            chat_id: msg.chat.id,
            message_id: msg.id,
            spans: code_spans(msg),
        });
    }

    None
}

/// Parse a leading bot command. Returns the command name (lowercased, no
/// slash) and the remainder after the first whitespace, if any.
///
/// A `/cmd@other_bot` addressed to a different bot is not ours and is left
/// to the plain-text paths.
fn parse_command<'a>(text: &'a str, own_username: &str) -> Option<(String, Option<&'a str>)> {
    let rest = text.strip_prefix('/')?;
    let (head, tail) = match rest.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, Some(tail.trim())),
        None => (rest, None),
    };
    let (name, target) = match head.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (head, None),
    };
    if let Some(target) = target
        && !target.eq_ignore_ascii_case(own_username)
    {
        return None;
    }
    let tail = tail.filter(|t| !t.is_empty());
    Some((name.to_ascii_lowercase(), tail))
}

/// Literal text of code/pre entities, in order of appearance.
fn code_spans(msg: &Message) -> Vec<String> {
    msg.parse_entities()
        .map(|entities| {
            entities
                .iter()
                .filter(|e| {
                    matches!(
                        e.kind(),
                        MessageEntityKind::Code | MessageEntityKind::Pre { .. }
                    )
                })
                .map(|e| e.text().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn me() -> BotIdentity {
        BotIdentity {
            id: UserId(42),
            username: "texbot".to_string(),
        }
    }

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).expect("valid message JSON")
    }

    fn private_text(text: &str) -> Message {
        message(json!({
            "message_id": 100,
            "date": 1_700_000_000,
            "chat": {"id": 7, "type": "private", "first_name": "Ada"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
            "text": text,
        }))
    }

    fn group_text(text: &str, entities: serde_json::Value) -> Message {
        message(json!({
            "message_id": 200,
            "date": 1_700_000_000,
            "chat": {"id": -1_001_234, "type": "supergroup", "title": "maths"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
            "text": text,
            "entities": entities,
        }))
    }

    #[test]
    fn test_private_text_is_classified_as_private() {
        let event = classify_message(&private_text("E=mc^2"), &me()).unwrap();
        assert_eq!(
            event,
            InboundEvent::PrivateText {
                chat_id: ChatId(7),
                message_id: MessageId(100),
                text: "E=mc^2".to_string(),
            }
        );
    }

    #[test]
    fn test_bare_start_command() {
        let event = classify_message(&private_text("/start"), &me()).unwrap();
        assert_eq!(
            event,
            InboundEvent::Start {
                chat_id: ChatId(7),
                payload: None,
            }
        );
    }

    #[test]
    fn test_start_command_with_payload() {
        let event = classify_message(&private_text("/start RT1tY14y"), &me()).unwrap();
        assert_eq!(
            event,
            InboundEvent::Start {
                chat_id: ChatId(7),
                payload: Some("RT1tY14y".to_string()),
            }
        );
    }

    #[test]
    fn test_command_addressed_to_this_bot() {
        let event = classify_message(&private_text("/help@texbot"), &me()).unwrap();
        assert_eq!(event, InboundEvent::Help { chat_id: ChatId(7) });
    }

    #[test]
    fn test_command_addressed_to_another_bot_is_plain_text() {
        let event = classify_message(&private_text("/help@otherbot"), &me()).unwrap();
        assert!(matches!(event, InboundEvent::PrivateText { .. }));
    }

    #[test]
    fn test_unknown_command_is_plain_text() {
        let event = classify_message(&private_text("/frac"), &me()).unwrap();
        assert!(matches!(event, InboundEvent::PrivateText { .. }));
    }

    #[test]
    fn test_group_text_collects_code_spans_in_order() {
        let msg = group_text(
            "compare $a$ with $b$",
            json!([
                {"type": "code", "offset": 8, "length": 3},
                {"type": "code", "offset": 17, "length": 3},
            ]),
        );
        let event = classify_message(&msg, &me()).unwrap();
        assert_eq!(
            event,
            InboundEvent::GroupText {
                chat_id: ChatId(-1_001_234),
                message_id: MessageId(200),
                spans: vec!["$a$".to_string(), "$b$".to_string()],
            }
        );
    }

    #[test]
    fn test_group_text_includes_pre_entities() {
        let msg = group_text(
            "block: $x+y$",
            json!([{"type": "pre", "offset": 7, "length": 5}]),
        );
        let event = classify_message(&msg, &me()).unwrap();
        assert_eq!(
            event,
            InboundEvent::GroupText {
                chat_id: ChatId(-1_001_234),
                message_id: MessageId(200),
                spans: vec!["$x+y$".to_string()],
            }
        );
    }

    #[test]
    fn test_group_text_ignores_other_entities() {
        let msg = group_text(
            "bold $x$",
            json!([{"type": "bold", "offset": 0, "length": 4}]),
        );
        let event = classify_message(&msg, &me()).unwrap();
        assert_eq!(
            event,
            InboundEvent::GroupText {
                chat_id: ChatId(-1_001_234),
                message_id: MessageId(200),
                spans: vec![],
            }
        );
    }

    #[test]
    fn test_self_authored_messages_are_dropped() {
        let msg = message(json!({
            "message_id": 300,
            "date": 1_700_000_000,
            "chat": {"id": -1_001_234, "type": "supergroup", "title": "maths"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
            "via_bot": {"id": 42, "is_bot": true, "first_name": "texbot", "username": "texbot"},
            "text": "$x$",
        }));
        assert_eq!(classify_message(&msg, &me()), None);
    }

    #[test]
    fn test_messages_via_other_bots_are_kept() {
        let msg = message(json!({
            "message_id": 301,
            "date": 1_700_000_000,
            "chat": {"id": 7, "type": "private", "first_name": "Ada"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
            "via_bot": {"id": 99, "is_bot": true, "first_name": "other", "username": "otherbot"},
            "text": "x",
        }));
        assert!(classify_message(&msg, &me()).is_some());
    }

    #[test]
    fn test_channel_posts_are_dropped() {
        let msg = message(json!({
            "message_id": 303,
            "date": 1_700_000_000,
            "chat": {"id": -1_000_000, "type": "channel", "title": "news"},
            "text": "$x$",
        }));
        assert_eq!(classify_message(&msg, &me()), None);
    }

    #[test]
    fn test_non_text_messages_are_dropped() {
        let msg = message(json!({
            "message_id": 302,
            "date": 1_700_000_000,
            "chat": {"id": 7, "type": "private", "first_name": "Ada"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
            "photo": [{"file_id": "abc", "file_unique_id": "u", "width": 1, "height": 1, "file_size": 64}],
        }));
        assert_eq!(classify_message(&msg, &me()), None);
    }
}
