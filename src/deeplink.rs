//! Deep links that reopen the bot with a formula pre-filled.
//!
//! The formula travels in the `/start` payload as URL-safe base64, so the
//! encoding is reversible and survives Telegram's deep-link charset rules.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

pub fn encode(formula: &str) -> String {
    URL_SAFE_NO_PAD.encode(formula.as_bytes())
}

/// Inverse of [`encode`]. `None` for payloads that are not valid base64 or
/// do not decode to UTF-8.
pub fn decode(payload: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

/// `t.me` link that starts the bot with the formula as payload.
pub fn start_link(bot_username: &str, formula: &str) -> String {
    format!("https://t.me/{}?start={}", bot_username, encode(formula))
}
