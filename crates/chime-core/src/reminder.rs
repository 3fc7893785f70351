//! Reminder delivery types shared between the scheduler's notification bridge
//! and every transport that implements a sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fired reminder on its way from the scheduler thread to the loop that
/// owns the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDelivery {
    /// Originating job ID, used for logging.
    pub job_id: String,
    /// Transport-specific destination (a Telegram chat id, for instance),
    /// captured at fire time.
    pub destination: String,
    /// Text to send, already decorated with the kind marker.
    pub message: String,
    /// When the scheduler handed the reminder off.
    pub fired_at: DateTime<Utc>,
}
