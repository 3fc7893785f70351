use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::trigger::Trigger;

/// Identifier of a scheduled job: `r_<n>` for one-shot, `rec_<n>` for recurring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub(crate) fn new(kind: JobKind, seq: u64) -> Self {
        Self(format!("{}{seq}", kind.id_prefix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Whether a job fires once or repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    OneShot,
    Recurring,
}

impl JobKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            JobKind::OneShot => "r_",
            JobKind::Recurring => "rec_",
        }
    }

    /// Marker prepended to the payload when the job fires.
    pub fn marker(self) -> &'static str {
        match self {
            JobKind::OneShot => "⏰",
            JobKind::Recurring => "🔔",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::OneShot => write!(f, "once"),
            JobKind::Recurring => write!(f, "recurring"),
        }
    }
}

/// When a job fires.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// A single absolute instant.
    Once { at: DateTime<Tz> },
    /// A compiled trigger, plus the pattern text it came from (for listing).
    Recurring { trigger: Trigger, pattern: String },
}

impl Schedule {
    pub fn kind(&self) -> JobKind {
        match self {
            Schedule::Once { .. } => JobKind::OneShot,
            Schedule::Recurring { .. } => JobKind::Recurring,
        }
    }
}

/// An entry in the job table.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Payload delivered when the job fires; opaque to the scheduler.
    pub text: String,
    pub schedule: Schedule,
    /// Zone the job was created in; used when rendering instants.
    pub timezone: Tz,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn kind(&self) -> JobKind {
        self.schedule.kind()
    }

    /// Payload as delivered: the kind marker followed by the text.
    pub fn delivery_text(&self) -> String {
        format!("{} {}", self.kind().marker(), self.text)
    }
}

/// A job joined with its live timer, as returned by
/// [`ReminderScheduler::active_jobs`](crate::engine::ReminderScheduler::active_jobs).
#[derive(Debug, Clone)]
pub struct ActiveJob {
    pub job: Job,
    /// Next armed fire instant; `None` while the job is firing or if its
    /// trigger is exhausted.
    pub next_fire: Option<DateTime<Utc>>,
}

/// Successful outcome of a scheduler operation.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub job_id: JobId,
    /// Next fire instant for create operations; `None` for cancellation.
    pub next_fire: Option<DateTime<Utc>>,
    /// Human-readable summary, suitable for a chat reply.
    pub message: String,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
