//! Proactive Telegram delivery: the sink that sends fired reminders to a chat.

use async_trait::async_trait;
use teloxide::prelude::*;

use chime_scheduler::{NotificationSink, SinkError};

/// [`NotificationSink`] whose destinations are Telegram chat ids.
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Parse a destination string back into the chat id it was bound from.
pub fn chat_id_from_destination(destination: &str) -> Result<ChatId, SinkError> {
    destination
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| SinkError::InvalidDestination(destination.to_string()))
}

#[async_trait]
impl NotificationSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<(), SinkError> {
        let chat_id = chat_id_from_destination(destination)?;
        crate::send::send_text(&self.bot, chat_id, text)
            .await
            .map_err(|e| SinkError::Send(e.to_string()))
    }
}
