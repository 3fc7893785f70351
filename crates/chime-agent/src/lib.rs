//! `chime-agent`: reminder operations as chat replies and callable tools.

pub mod service;
pub mod tools;

pub use service::ReminderService;
pub use tools::{Tool, ToolDefinition, ToolRegistry, ToolResult};
