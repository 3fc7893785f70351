use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::service::ReminderService;

use super::{optional_str, Tool, ToolResult};

/// `get_current_time`: a clock lookup that never schedules anything.
pub struct GetCurrentTimeTool {
    service: Arc<ReminderService>,
}

impl GetCurrentTimeTool {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current time in a timezone (e.g. 'America/New_York')."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name. Defaults to the configured zone."
                }
            }
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let tz = optional_str(&input, "timezone");
        let out = self.service.get_current_time(tz);
        if out.starts_with("Unknown timezone") {
            ToolResult::error(out)
        } else {
            ToolResult::success(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use chime_core::config::SchedulerConfig;
    use chime_scheduler::{NotificationBridge, ReminderScheduler};

    use super::*;

    fn tool() -> GetCurrentTimeTool {
        let scheduler =
            Arc::new(ReminderScheduler::start(Arc::new(NotificationBridge::new())).unwrap());
        GetCurrentTimeTool::new(Arc::new(ReminderService::new(
            scheduler,
            &SchedulerConfig::default(),
        )))
    }

    #[tokio::test]
    async fn defaults_to_configured_zone() {
        let out = tool().execute(json!({})).await;
        assert!(!out.is_error);
        assert!(out.content.ends_with(" UTC"));
    }

    #[tokio::test]
    async fn unknown_zone_is_an_error() {
        let out = tool().execute(json!({"timezone": "Nope/Nowhere"})).await;
        assert!(out.is_error);
        assert_eq!(out.content, "Unknown timezone 'Nope/Nowhere'");
    }
}
