use chime_core::ChimeError;

/// Errors produced by the Telegram adapter.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("teloxide error: {0}")]
    Teloxide(#[from] teloxide::RequestError),

    #[error("no bot token configured")]
    NoToken,
}

impl From<TelegramError> for ChimeError {
    fn from(e: TelegramError) -> Self {
        ChimeError::Channel {
            channel: "telegram".to_string(),
            reason: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TelegramError>;
