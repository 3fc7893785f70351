//! Telegram message handler registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info, warn};

use chime_agent::ToolRegistry;
use chime_scheduler::{DeliverySender, NotificationBridge};

use crate::allow::Allowlist;
use crate::commands::{parse_command, Command, HELP_TEXT};
use crate::send;

/// Everything the handler needs, injected as a single dptree dependency.
pub struct HandlerState {
    pub registry: Arc<ToolRegistry>,
    pub bridge: Arc<NotificationBridge>,
    /// Queue drained by the Telegram delivery task.
    pub outbox: DeliverySender,
    pub allow: Allowlist,
    /// Bot username without `@`, for `/cmd@bot` addressing.
    pub bot_username: String,
}

impl HandlerState {
    /// Make `chat_id` the reminder destination. The first call binds the
    /// bridge; later calls only re-point it.
    pub fn bind_chat(&self, chat_id: ChatId) {
        let destination = chat_id.0.to_string();
        if self.bridge.destination().is_none() {
            self.bridge.bind_destination(destination, self.outbox.clone());
        } else {
            self.bridge.set_destination(destination);
        }
    }

    /// Reply for `text`, or `None` when the message is not for us.
    pub async fn respond(&self, text: &str) -> Option<String> {
        match parse_command(text, &self.bot_username)? {
            Err(usage) => Some(usage),
            Ok(Command::Help) => Some(HELP_TEXT.to_string()),
            Ok(command) => {
                let (tool, input) = command.tool_call()?;
                debug!(tool, "dispatching command");
                Some(self.registry.dispatch(tool, input).await.content)
            }
        }
    }
}

/// Main message handler registered in the teloxide Dispatcher.
///
/// 1. Bot-message filter
/// 2. Allowlist check (deny-by-default)
/// 3. Destination binding for reminders
/// 4. Slash command dispatch through the tool registry
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    state: Arc<HandlerState>,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    if !state.allow.permits(from.username.as_deref(), from.id.0) {
        debug!(user_id = from.id.0, "telegram: sender not in allowlist, ignoring");
        return Ok(());
    }

    let chat_id = msg.chat.id;
    state.bind_chat(chat_id);

    let Some(text) = msg.text() else {
        return Ok(());
    };

    let reply = match state.respond(text).await {
        Some(reply) => reply,
        None if msg.chat.is_private() => "Send /help to see what I can do.".to_string(),
        None => return Ok(()),
    };

    if let Err(e) = send::send_text(&bot, chat_id, &reply).await {
        warn!(error = %e, chat_id = chat_id.0, "telegram: failed to send reply");
    } else {
        info!(chat_id = chat_id.0, "telegram: replied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chime_agent::ReminderService;
    use chime_core::config::SchedulerConfig;
    use chime_scheduler::{DeliveryReceiver, ReminderScheduler};

    use super::*;

    fn state() -> (HandlerState, DeliveryReceiver) {
        let bridge = Arc::new(NotificationBridge::new());
        let scheduler = Arc::new(ReminderScheduler::start(Arc::clone(&bridge)).unwrap());
        let service = Arc::new(ReminderService::new(scheduler, &SchedulerConfig::default()));
        let (outbox, rx) = tokio::sync::mpsc::unbounded_channel();
        let state = HandlerState {
            registry: Arc::new(ToolRegistry::reminders(service)),
            bridge,
            outbox,
            allow: Allowlist::new(&["*".to_string()]),
            bot_username: "chime_bot".into(),
        };
        (state, rx)
    }

    #[tokio::test]
    async fn commands_before_binding_report_not_ready() {
        let (state, _rx) = state();
        let reply = state.respond("/remind 5m | tea").await.unwrap();
        assert!(reply.starts_with("❌ Bot not ready"), "{reply}");
    }

    #[tokio::test]
    async fn first_chat_binds_and_later_chats_repoint() {
        let (state, _rx) = state();
        state.bind_chat(ChatId(10));
        assert_eq!(state.bridge.destination().as_deref(), Some("10"));
        state.bind_chat(ChatId(-20));
        assert_eq!(state.bridge.destination().as_deref(), Some("-20"));
    }

    #[tokio::test]
    async fn remind_then_list_then_cancel() {
        let (state, _rx) = state();
        state.bind_chat(ChatId(10));

        let set = state.respond("/remind in 2 hours | call mom").await.unwrap();
        assert!(set.starts_with("✅ Reminder set for"), "{set}");

        let list = state.respond("/reminders").await.unwrap();
        assert!(list.contains("⏰ r_1: call mom"), "{list}");

        let cancel = state.respond("/cancel r_1").await.unwrap();
        assert_eq!(cancel, "✅ Cancelled: call mom");
    }

    #[tokio::test]
    async fn help_and_usage_are_local() {
        let (state, _rx) = state();
        assert_eq!(state.respond("/help").await.as_deref(), Some(HELP_TEXT));
        assert_eq!(
            state.respond("/remind soon").await.as_deref(),
            Some("Usage: /remind <when> | <text>")
        );
        assert!(state.respond("just chatting").await.is_none());
    }

    #[tokio::test]
    async fn time_command_uses_default_zone() {
        let (state, _rx) = state();
        let reply = state.respond("/time").await.unwrap();
        assert!(reply.ends_with(" UTC"), "{reply}");
    }
}
