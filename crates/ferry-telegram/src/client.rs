//! Telegram client configuration and construction.

use std::time::Duration;

use teloxide::types::ChatId;
use teloxide::Bot;
use url::Url;

use crate::error::{TelegramError, TelegramResult};

/// Default upload timeout: multi-GB uploads over slow links take hours.
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 20 * 60 * 60;

/// Configuration for the Telegram destination.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// Chat the segments are delivered to
    pub chat_id: i64,
    /// Bot API server URL override (a local server lifts the hosted
    /// upload cap)
    pub api_url: Option<String>,
    /// Per-request timeout for uploads
    pub upload_timeout: Duration,
}

impl TelegramConfig {
    /// Create config from environment variables.
    pub fn from_env() -> TelegramResult<Self> {
        Ok(Self {
            bot_token: std::env::var("TELOXIDE_TOKEN")
                .map_err(|_| TelegramError::config("TELOXIDE_TOKEN not set"))?,
            chat_id: std::env::var("FERRY_CHAT_ID")
                .map_err(|_| TelegramError::config("FERRY_CHAT_ID not set"))?
                .parse()
                .map_err(|_| TelegramError::config("FERRY_CHAT_ID is not a valid chat id"))?,
            api_url: std::env::var("FERRY_API_URL").ok(),
            upload_timeout: Duration::from_secs(
                std::env::var("FERRY_UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS),
            ),
        })
    }
}

/// An authenticated Telegram chat destination.
///
/// One value is shared across all segment uploads of a run; the pipeline
/// keeps uploads sequential, so the underlying connection is never used by
/// two in-flight uploads of the same source.
#[derive(Clone)]
pub struct TelegramDestination {
    bot: Bot,
    chat: ChatId,
}

impl TelegramDestination {
    /// Build a destination from configuration.
    pub fn new(config: &TelegramConfig) -> TelegramResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()?;

        let mut bot = Bot::with_client(&config.bot_token, client);
        if let Some(api_url) = &config.api_url {
            bot = bot.set_api_url(Url::parse(api_url)?);
        }

        Ok(Self {
            bot,
            chat: ChatId(config.chat_id),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> TelegramResult<Self> {
        Self::new(&TelegramConfig::from_env()?)
    }

    pub(crate) fn bot(&self) -> &Bot {
        &self.bot
    }

    pub(crate) fn chat(&self) -> ChatId {
        self.chat
    }
}
