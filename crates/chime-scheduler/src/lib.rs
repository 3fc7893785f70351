//! `chime-scheduler`: in-memory reminder scheduling with a thread-safe delivery hand-off.
//!
//! # Overview
//!
//! A [`ReminderScheduler`] owns a [`JobTable`] and a dedicated `chime-scheduler`
//! OS thread that sleeps until the earliest armed deadline. When a job fires,
//! its text is handed to the [`NotificationBridge`], which queues it for a
//! delivery task running on the tokio runtime. Nothing is persisted; jobs live
//! as long as the scheduler does.
//!
//! # Job kinds
//!
//! | Kind        | Id      | Marker | Created from                                  |
//! |-------------|---------|--------|-----------------------------------------------|
//! | One-shot    | `r_N`   | ⏰     | `30s`, `in 2 hours`, `tomorrow at 3pm`, ISO   |
//! | Recurring   | `rec_N` | 🔔     | `daily at 9am`, `every monday`, `every hour`, 5-field cron |

pub mod bridge;
pub mod engine;
pub mod error;
pub mod format;
pub mod fuzzy;
pub mod parse;
pub mod table;
pub mod trigger;
pub mod types;

pub use bridge::{
    run_delivery, BridgeStats, Delivered, DeliveryReceiver, DeliverySender, NotificationBridge,
    NotificationSink,
};
pub use engine::ReminderScheduler;
pub use error::{BridgeError, ParseError, Result, SchedulerError, SinkError};
pub use fuzzy::{FuzzyDate, FuzzyDateParser, NaturalDateParser};
pub use parse::{parse_instant, resolve_timezone};
pub use table::JobTable;
pub use trigger::{compile_pattern, Trigger};
pub use types::{ActiveJob, Confirmation, Job, JobId, JobKind, Schedule};
