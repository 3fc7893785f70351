use thiserror::Error;

/// Accepted one-shot forms, echoed back whenever an expression is not understood.
pub const INSTANT_HELP: &str =
    "Try: '30s', '5m', 'in 2 hours', 'tomorrow at 3pm', or '2024-12-25 10:00'";

/// Accepted recurrence forms.
pub const PATTERN_HELP: &str =
    "Try: 'daily at 9am', 'every monday at 10am', 'every hour', or a cron line like '30 8 * * 1-5'";

/// User-input errors from the temporal parser and the trigger compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// None of the parsing strategies matched. Carries the help text.
    #[error("{0}")]
    Unrecognized(String),

    /// The expression resolved to an instant that is not in the future.
    #[error("Time must be in the future")]
    PastInstant,

    /// The timezone name is not a known IANA zone.
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// Errors returned by the scheduler's public operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No delivery destination has been bound yet.
    #[error("Bot not ready: no delivery destination is bound yet")]
    SinkNotReady,

    #[error("'{id}' not found")]
    NotFound { id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a fired reminder could not be handed to the delivery loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("no delivery destination bound")]
    NoDestination,

    #[error("delivery loop not available")]
    LoopUnavailable,
}

/// Failure reported by a transport while sending a reminder.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("destination '{0}' is not valid for this transport")]
    InvalidDestination(String),

    #[error("send failed: {0}")]
    Send(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
