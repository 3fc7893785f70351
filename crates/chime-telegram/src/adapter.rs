//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event loop.
//! Long polling, so no public URL is required.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use chime_agent::ToolRegistry;
use chime_core::config::TelegramConfig;
use chime_scheduler::NotificationBridge;

use crate::allow::Allowlist;
use crate::error::{Result, TelegramError};
use crate::handler::{handle_message, HandlerState};
use crate::proactive::TelegramSink;

pub struct TelegramAdapter {
    config: TelegramConfig,
    registry: Arc<ToolRegistry>,
    bridge: Arc<NotificationBridge>,
}

impl TelegramAdapter {
    pub fn new(
        config: &TelegramConfig,
        registry: Arc<ToolRegistry>,
        bridge: Arc<NotificationBridge>,
    ) -> Self {
        Self {
            config: config.clone(),
            registry,
            bridge,
        }
    }

    /// Connect to Telegram and drive the long-polling loop until the
    /// dispatcher stops.
    ///
    /// Spawns the reminder delivery task first; the bridge is bound to a chat
    /// when the first allowed message arrives.
    pub async fn run(self) -> Result<()> {
        if self.config.bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }
        let bot = Bot::new(&self.config.bot_token);
        let me = bot.get_me().await?;
        let bot_username = me.user.username.clone().unwrap_or_default();

        let allow = Allowlist::new(&self.config.allow_users);
        if allow.is_empty() {
            warn!("Telegram: allow_users is empty, every message will be ignored");
        }

        let sink = Arc::new(TelegramSink::new(bot.clone()));
        let (outbox, _delivery) = self.bridge.spawn_delivery(sink);

        let state = Arc::new(HandlerState {
            registry: self.registry,
            bridge: self.bridge,
            outbox,
            allow,
            bot_username: bot_username.clone(),
        });

        info!(bot = %bot_username, "Telegram: starting long-polling dispatcher");

        let handler = Update::filter_message().endpoint(handle_message);
        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![state])
            .default_handler(|_upd| async {})
            .build()
            .dispatch()
            .await;

        info!("Telegram: dispatcher stopped");
        Ok(())
    }
}
