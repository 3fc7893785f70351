//! Tool system exposing the reminder operations to a conversational loop.
//!
//! Defines the `Tool` trait that all tools implement, plus a registry that
//! dispatches calls by name and lists definitions for prompts or `/help`.

pub mod clock;
pub mod reminder;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::{ReminderService, ERR_MARK};

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Text content returned to the caller.
    pub content: String,
    /// Whether the tool execution failed.
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }

    /// Wrap a service reply, flagging it as an error when it carries the `❌` mark.
    pub fn from_reply(reply: String) -> Self {
        if reply.starts_with(ERR_MARK) {
            Self::error(reply)
        } else {
            Self::success(reply)
        }
    }
}

/// API-level description of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Trait that all tools must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name for this tool (e.g. "set_reminder").
    fn name(&self) -> &str;
    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;
    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> Value;
    /// Execute the tool with the given input.
    async fn execute(&self, input: Value) -> ToolResult;
}

/// Name-indexed set of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All six reminder and clock tools backed by `service`.
    pub fn reminders(service: Arc<ReminderService>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(reminder::SetReminderTool::new(Arc::clone(&service))));
        registry.register(Box::new(reminder::SetRecurringReminderTool::new(Arc::clone(
            &service,
        ))));
        registry.register(Box::new(reminder::ListRemindersTool::new(Arc::clone(&service))));
        registry.register(Box::new(reminder::CancelReminderTool::new(Arc::clone(&service))));
        registry.register(Box::new(reminder::ClearRemindersTool::new(Arc::clone(&service))));
        registry.register(Box::new(clock::GetCurrentTimeTool::new(service)));
        registry
    }

    /// Add a tool; a later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Run the named tool. Unknown names produce an error result.
    pub async fn dispatch(&self, name: &str, input: Value) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.execute(input).await,
            None => ToolResult::error(format!("unknown tool '{name}'")),
        }
    }
}

/// Required non-empty string field, or the error result to return.
pub(crate) fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolResult> {
    match input.get(field).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ToolResult::error(format!("missing required field '{field}'"))),
    }
}

/// Optional string field; empty strings count as absent.
pub(crate) fn optional_str<'a>(input: &'a Value, field: &str) -> Option<&'a str> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}
