//! Reminder tools: create, list, cancel and clear jobs through [`ReminderService`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::service::ReminderService;

use super::{optional_str, required_str, Tool, ToolResult};

fn timezone_property() -> Value {
    json!({
        "type": "string",
        "description": "IANA timezone such as 'America/New_York'. Defaults to the configured zone (UTC unless set)."
    })
}

pub struct SetReminderTool {
    service: Arc<ReminderService>,
}

impl SetReminderTool {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SetReminderTool {
    fn name(&self) -> &str {
        "set_reminder"
    }

    fn description(&self) -> &str {
        "Set a one-time reminder. 'when' accepts '30s', '5m', 'in 2 hours', \
         'tomorrow at 3pm' or '2024-12-25 10:00'. The reminder is delivered to \
         the bound chat when it fires."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "What to remind about."
                },
                "when": {
                    "type": "string",
                    "description": "When to fire, relative ('5m', 'in 2 hours') or absolute ('tomorrow at 3pm')."
                },
                "timezone": timezone_property()
            },
            "required": ["text", "when"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let text = match required_str(&input, "text") {
            Ok(t) => t,
            Err(e) => return e,
        };
        let when = match required_str(&input, "when") {
            Ok(w) => w,
            Err(e) => return e,
        };
        ToolResult::from_reply(self.service.set_reminder(
            text,
            when,
            optional_str(&input, "timezone"),
        ))
    }
}

pub struct SetRecurringReminderTool {
    service: Arc<ReminderService>,
}

impl SetRecurringReminderTool {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SetRecurringReminderTool {
    fn name(&self) -> &str {
        "set_recurring_reminder"
    }

    fn description(&self) -> &str {
        "Set a recurring reminder. 'pattern' accepts 'daily at 9am', \
         'every monday at 10am', 'every hour' or a five-field cron line."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "What to remind about."
                },
                "pattern": {
                    "type": "string",
                    "description": "Recurrence, e.g. 'daily at 9am' or '30 8 * * 1-5'."
                },
                "timezone": timezone_property()
            },
            "required": ["text", "pattern"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let text = match required_str(&input, "text") {
            Ok(t) => t,
            Err(e) => return e,
        };
        let pattern = match required_str(&input, "pattern") {
            Ok(p) => p,
            Err(e) => return e,
        };
        ToolResult::from_reply(self.service.set_recurring_reminder(
            text,
            pattern,
            optional_str(&input, "timezone"),
        ))
    }
}

pub struct ListRemindersTool {
    service: Arc<ReminderService>,
}

impl ListRemindersTool {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ListRemindersTool {
    fn name(&self) -> &str {
        "list_reminders"
    }

    fn description(&self) -> &str {
        "List all active reminders with their ids and time until the next fire."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value) -> ToolResult {
        ToolResult::success(self.service.list_reminders())
    }
}

pub struct CancelReminderTool {
    service: Arc<ReminderService>,
}

impl CancelReminderTool {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for CancelReminderTool {
    fn name(&self) -> &str {
        "cancel_reminder"
    }

    fn description(&self) -> &str {
        "Cancel a reminder by id (e.g. 'r_1' or 'rec_2')."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Reminder id as shown by list_reminders."
                }
            },
            "required": ["id"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        match required_str(&input, "id") {
            Ok(id) => ToolResult::from_reply(self.service.cancel_reminder(id)),
            Err(e) => e,
        }
    }
}

pub struct ClearRemindersTool {
    service: Arc<ReminderService>,
}

impl ClearRemindersTool {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ClearRemindersTool {
    fn name(&self) -> &str {
        "clear_all_reminders"
    }

    fn description(&self) -> &str {
        "Cancel every active reminder."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value) -> ToolResult {
        ToolResult::success(self.service.clear_all_reminders())
    }
}
