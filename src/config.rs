//! Environment-based configuration.

use std::fmt;
use url::Url;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// BOT_TOKEN is missing or empty.
    MissingToken,
    /// BOT_TOKEN does not look like a Telegram bot credential.
    InvalidToken,
    /// WEBHOOK_URL could not be parsed.
    InvalidWebhookUrl { value: String, source: url::ParseError },
    /// PORT could not be parsed.
    InvalidPort {
        value: String,
        source: std::num::ParseIntError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "BOT_TOKEN is required"),
            Self::InvalidToken => write!(
                f,
                "BOT_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)"
            ),
            Self::InvalidWebhookUrl { value, source } => {
                write!(f, "WEBHOOK_URL '{}' is not a valid URL: {}", value, source)
            }
            Self::InvalidPort { value, source } => {
                write!(f, "PORT '{}' is not a valid port: {}", value, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidWebhookUrl { source, .. } => Some(source),
            Self::InvalidPort { source, .. } => Some(source),
            _ => None,
        }
    }
}

const DEFAULT_PORT: u16 = 8080;

pub struct Config {
    pub bot_token: String,
    /// Switches to long polling and verbose logging.
    pub debug: bool,
    /// Public URL Telegram pushes updates to. Absent means long polling.
    pub webhook_url: Option<Url>,
    /// Local port the webhook listener binds.
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var("BOT_TOKEN").ok(),
            std::env::var("DEBUG").ok(),
            std::env::var("WEBHOOK_URL").ok(),
            std::env::var("PORT").ok(),
        )
    }

    fn from_vars(
        token: Option<String>,
        debug: Option<String>,
        webhook_url: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bot_token = token
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = bot_token.split(':').collect();
        if token_parts.len() != 2
            || token_parts[0].parse::<u64>().is_err()
            || token_parts[1].is_empty()
        {
            return Err(ConfigError::InvalidToken);
        }

        let debug = debug.is_some_and(|v| !v.is_empty());

        let webhook_url = webhook_url
            .filter(|v| !v.is_empty())
            .map(|v| {
                Url::parse(&v).map_err(|e| ConfigError::InvalidWebhookUrl { value: v, source: e })
            })
            .transpose()?;

        let port = port
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<u16>()
                    .map_err(|e| ConfigError::InvalidPort { value: v, source: e })
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            bot_token,
            debug,
            webhook_url,
            port,
        })
    }

    /// Secret Telegram echoes back on every webhook delivery.
    ///
    /// The token's secret segment is used directly; the full credential
    /// contains a colon, which the secret-token charset does not allow.
    pub fn webhook_secret(&self) -> String {
        self.bot_token
            .split(':')
            .nth(1)
            .unwrap_or_default()
            .to_string()
    }
}
