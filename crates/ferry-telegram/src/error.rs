//! Telegram client error types.

use thiserror::Error;

pub type TelegramResult<T> = Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid Bot API URL: {0}")]
    InvalidApiUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl TelegramError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
