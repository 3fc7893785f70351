//! Chat-facing reminder operations.
//!
//! Every method returns a short reply string and never fails: scheduler errors
//! are folded into the text with a `❌` prefix, successes carry `✅`.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use chime_core::config::SchedulerConfig;
use chime_scheduler::{
    format::format_current_time, resolve_timezone, ReminderScheduler, SchedulerError,
};

pub const OK_MARK: &str = "✅";
pub const ERR_MARK: &str = "❌";

pub struct ReminderService {
    scheduler: Arc<ReminderScheduler>,
    default_timezone: String,
}

impl ReminderService {
    pub fn new(scheduler: Arc<ReminderScheduler>, config: &SchedulerConfig) -> Self {
        Self {
            scheduler,
            default_timezone: config.default_timezone.clone(),
        }
    }

    /// One-shot reminder, e.g. `when = "in 2 hours"`.
    pub fn set_reminder(&self, text: &str, when: &str, timezone: Option<&str>) -> String {
        let tz = timezone.unwrap_or(&self.default_timezone);
        reply(
            self.scheduler
                .schedule_once(text, when, tz)
                .map(|c| c.message),
        )
    }

    /// Recurring reminder, e.g. `pattern = "every monday at 10am"`.
    pub fn set_recurring_reminder(
        &self,
        text: &str,
        pattern: &str,
        timezone: Option<&str>,
    ) -> String {
        let tz = timezone.unwrap_or(&self.default_timezone);
        reply(
            self.scheduler
                .schedule_recurring(text, pattern, tz)
                .map(|c| c.message),
        )
    }

    pub fn list_reminders(&self) -> String {
        self.scheduler.list_active()
    }

    pub fn cancel_reminder(&self, id: &str) -> String {
        reply(self.scheduler.cancel(id).map(|c| c.message))
    }

    pub fn clear_all_reminders(&self) -> String {
        let count = self.scheduler.clear_all();
        format!("{OK_MARK} Cleared {count} reminder(s)")
    }

    /// Current wall-clock time in `timezone`; no scheduling side effect.
    pub fn get_current_time(&self, timezone: Option<&str>) -> String {
        let tz_name = timezone.unwrap_or(&self.default_timezone);
        match resolve_timezone(tz_name) {
            Ok(tz) => format_current_time(Utc::now(), &tz),
            Err(e) => e.to_string(),
        }
    }
}

fn reply(result: Result<String, SchedulerError>) -> String {
    match result {
        Ok(message) => format!("{OK_MARK} {message}"),
        Err(e) => {
            debug!(error = %e, "reminder operation refused");
            format!("{ERR_MARK} {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use chime_scheduler::{DeliveryReceiver, NotificationBridge};

    use super::*;

    fn service(bound: bool) -> (ReminderService, Option<DeliveryReceiver>) {
        let bridge = Arc::new(NotificationBridge::new());
        let rx = bound.then(|| {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            bridge.bind_destination("chat", tx);
            rx
        });
        let scheduler = Arc::new(ReminderScheduler::start(bridge).unwrap());
        (ReminderService::new(scheduler, &SchedulerConfig::default()), rx)
    }

    #[test]
    fn set_and_cancel_round_trip() {
        let (svc, _rx) = service(true);
        let set = svc.set_reminder("call mom", "2h", None);
        assert!(set.starts_with("✅ Reminder set for "), "{set}");
        assert!(set.ends_with("(2h 0m)"), "{set}");
        assert!(svc.list_reminders().contains("⏰ r_1: call mom"));
        assert_eq!(svc.cancel_reminder("r_1"), "✅ Cancelled: call mom");
        assert_eq!(svc.cancel_reminder("r_1"), "❌ 'r_1' not found");
    }

    #[test]
    fn not_ready_before_binding() {
        let (svc, _) = service(false);
        let out = svc.set_reminder("x", "5m", None);
        assert!(out.starts_with("❌ Bot not ready"), "{out}");
        assert_eq!(svc.list_reminders(), "📭 No reminders");
    }

    #[test]
    fn past_and_garbage_inputs_are_explained() {
        let (svc, _rx) = service(true);
        assert_eq!(
            svc.set_reminder("x", "2001-01-01 09:00", None),
            "❌ Time must be in the future"
        );
        let garbage = svc.set_reminder("x", "someday maybe", None);
        assert!(garbage.starts_with("❌ Try: '30s'"), "{garbage}");
        let bad_pattern = svc.set_recurring_reminder("x", "now and then", None);
        assert!(bad_pattern.starts_with("❌ Try: 'daily at 9am'"), "{bad_pattern}");
    }

    #[test]
    fn recurring_reply_names_pattern_and_next_fire() {
        let (svc, _rx) = service(true);
        let out = svc.set_recurring_reminder("standup", "every monday at 10am", Some("Europe/Berlin"));
        assert!(out.starts_with("✅ Recurring: every monday at 10am\n⏰ Next: "), "{out}");
    }

    #[test]
    fn clear_all_reports_count() {
        let (svc, _rx) = service(true);
        assert_eq!(svc.clear_all_reminders(), "✅ Cleared 0 reminder(s)");
        svc.set_reminder("a", "1h", None);
        svc.set_recurring_reminder("b", "every hour", None);
        assert_eq!(svc.clear_all_reminders(), "✅ Cleared 2 reminder(s)");
        assert_eq!(svc.list_reminders(), "📭 No reminders");
    }

    #[test]
    fn current_time_and_unknown_zone() {
        let (svc, _) = service(false);
        let now = svc.get_current_time(Some("UTC"));
        assert!(now.ends_with(" UTC"), "{now}");
        assert_eq!(now.len(), "2026-10-16 10:00:00 UTC".len());
        assert_eq!(
            svc.get_current_time(Some("Moon/Base")),
            "Unknown timezone 'Moon/Base'"
        );
    }

    #[test]
    fn configured_default_zone_is_used() {
        let bridge = Arc::new(NotificationBridge::new());
        let scheduler = Arc::new(ReminderScheduler::start(bridge).unwrap());
        let config = SchedulerConfig {
            default_timezone: "Asia/Tokyo".into(),
        };
        let svc = ReminderService::new(scheduler, &config);
        assert!(svc.get_current_time(None).ends_with(" JST"));
    }
}
