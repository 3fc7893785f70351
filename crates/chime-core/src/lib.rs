//! Shared configuration, error and delivery types for the chime workspace.

pub mod config;
pub mod error;
pub mod reminder;

pub use config::ChimeConfig;
pub use error::{ChimeError, Result};
