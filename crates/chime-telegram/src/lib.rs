pub mod adapter;
pub mod allow;
pub mod commands;
pub mod error;
pub mod handler;
pub mod proactive;
pub mod send;

pub use adapter::TelegramAdapter;
pub use error::TelegramError;
pub use proactive::TelegramSink;
