use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::{
    bridge::NotificationBridge,
    error::{ParseError, Result, SchedulerError},
    format::{format_instant, format_until},
    fuzzy::{FuzzyDateParser, NaturalDateParser},
    parse::{ensure_future, parse_instant_at, resolve_timezone},
    table::JobTable,
    trigger::{compile_pattern_in, Trigger},
    types::{ActiveJob, Confirmation, Job, JobId, JobKind, Schedule},
};

/// Stale queue entries tolerated before the heap is rebuilt.
const COMPACT_SLACK: usize = 64;

/// One armed deadline. Entries whose generation no longer matches
/// `TimerState::live` are stale (cancelled or re-armed) and skipped on pop.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Armed {
    due: DateTime<Utc>,
    generation: u64,
    id: JobId,
}

#[derive(Default)]
struct TimerState {
    queue: BinaryHeap<Reverse<Armed>>,
    live: HashMap<JobId, (DateTime<Utc>, u64)>,
    generation: u64,
    shutdown: bool,
}

impl TimerState {
    fn arm(&mut self, id: JobId, due: DateTime<Utc>) {
        self.generation += 1;
        self.live.insert(id.clone(), (due, self.generation));
        self.queue.push(Reverse(Armed {
            due,
            generation: self.generation,
            id,
        }));
    }

    fn disarm(&mut self, id: &JobId) -> bool {
        let was_armed = self.live.remove(id).is_some();
        if was_armed {
            self.prune();
        }
        was_armed
    }

    /// Drop stale entries from the front of the queue, and rebuild it once
    /// stale entries deeper in the heap outnumber the live ones.
    fn prune(&mut self) {
        while let Some(Reverse(head)) = self.queue.peek() {
            if self.is_current(head) {
                break;
            }
            self.queue.pop();
        }
        if self.queue.len() > 2 * self.live.len() + COMPACT_SLACK {
            let live = &self.live;
            self.queue.retain(|Reverse(armed)| {
                live.get(&armed.id)
                    .is_some_and(|(_, generation)| *generation == armed.generation)
            });
        }
    }

    fn disarm_all(&mut self) {
        self.live.clear();
        self.queue.clear();
    }

    fn is_current(&self, armed: &Armed) -> bool {
        self.live
            .get(&armed.id)
            .is_some_and(|(_, generation)| *generation == armed.generation)
    }
}

/// State shared between the caller-facing handle and the engine thread.
///
/// Lock order: `timers` before the job table's internal lock.
struct Shared {
    table: JobTable,
    timers: Mutex<TimerState>,
    wake: Condvar,
    bridge: Arc<NotificationBridge>,
    fuzzy: Box<dyn FuzzyDateParser>,
    next_seq: AtomicU64,
}

impl Shared {
    fn lock_timers(&self) -> MutexGuard<'_, TimerState> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_and_arm(&self, job: Job, due: DateTime<Utc>) {
        let mut timers = self.lock_timers();
        let id = job.id.clone();
        self.table.insert(job);
        timers.arm(id, due);
        drop(timers);
        self.wake.notify_one();
    }

    /// Engine thread body: sleep until the earliest deadline, fire, repeat.
    fn run(self: Arc<Self>) {
        info!("scheduler engine started");
        let mut timers = self.lock_timers();
        loop {
            if timers.shutdown {
                break;
            }
            let now = Utc::now();
            match timers.queue.peek().map(|Reverse(next)| next.due) {
                None => {
                    timers = self.wake.wait(timers).unwrap_or_else(PoisonError::into_inner);
                }
                Some(due) if due > now => {
                    let wait = (due - now).to_std().unwrap_or_default();
                    timers = self
                        .wake
                        .wait_timeout(timers, wait)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
                Some(_) => {
                    let Some(Reverse(armed)) = timers.queue.pop() else {
                        continue;
                    };
                    if !timers.is_current(&armed) {
                        continue;
                    }
                    timers.disarm(&armed.id);
                    // Looked up under the timer lock so a completed cancel is always observed.
                    let job = self.table.get(&armed.id);
                    drop(timers);
                    if let Some(job) = job {
                        self.fire(job, armed.due);
                    }
                    timers = self.lock_timers();
                }
            }
        }
        info!("scheduler engine stopped");
    }

    /// Deliver one job and then retire or re-arm it. Never panics.
    fn fire(&self, job: Job, due: DateTime<Utc>) {
        info!(job_id = %job.id, kind = %job.kind(), "reminder fired");
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
            let text = job.delivery_text();
            // Failures are counted and logged by the bridge.
            let _ = self.bridge.deliver(&job.id, &text);
        }));
        if delivered.is_err() {
            error!(job_id = %job.id, "panic while delivering reminder");
        }

        match &job.schedule {
            Schedule::Once { .. } => {
                // Already gone if a cancel raced the fire.
                self.table.remove(&job.id);
            }
            Schedule::Recurring { trigger, .. } => self.rearm(&job.id, trigger, due),
        }
    }

    fn rearm(&self, id: &JobId, trigger: &Trigger, due: DateTime<Utc>) {
        let after = Utc::now().max(due);
        let next = panic::catch_unwind(AssertUnwindSafe(|| trigger.next_after(after)));

        let mut timers = self.lock_timers();
        if !self.table.contains(id) {
            return;
        }
        match next {
            Ok(Some(at)) => {
                timers.arm(id.clone(), at);
                info!(job_id = %id, next_fire = %at, "recurring reminder re-armed");
            }
            Ok(None) => {
                self.table.remove(id);
                warn!(job_id = %id, "recurring trigger exhausted; reminder removed");
            }
            Err(_) => {
                error!(job_id = %id, "panic computing next fire; reminder kept without a timer");
            }
        }
    }
}

/// Owns a job table and the background thread that fires it.
///
/// Every instance is independent. Create/cancel/list only touch memory and
/// return immediately; delivery goes through the [`NotificationBridge`].
pub struct ReminderScheduler {
    shared: Arc<Shared>,
    engine: Mutex<Option<JoinHandle<()>>>,
}

impl ReminderScheduler {
    /// Start the engine thread with the default natural-language date parser.
    pub fn start(bridge: Arc<NotificationBridge>) -> Result<Self> {
        Self::with_fuzzy_parser(bridge, Box::new(NaturalDateParser))
    }

    /// Start the engine thread with a custom fuzzy date parser.
    pub fn with_fuzzy_parser(
        bridge: Arc<NotificationBridge>,
        fuzzy: Box<dyn FuzzyDateParser>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            table: JobTable::new(),
            timers: Mutex::new(TimerState::default()),
            wake: Condvar::new(),
            bridge,
            fuzzy,
            next_seq: AtomicU64::new(0),
        });
        let engine_state = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("chime-scheduler".into())
            .spawn(move || engine_state.run())
            .map_err(|e| SchedulerError::Internal(format!("failed to spawn engine thread: {e}")))?;
        Ok(Self {
            shared,
            engine: Mutex::new(Some(handle)),
        })
    }

    pub fn bridge(&self) -> &Arc<NotificationBridge> {
        &self.shared.bridge
    }

    /// Schedule `text` for the instant described by `when`.
    pub fn schedule_once(&self, text: &str, when: &str, timezone: &str) -> Result<Confirmation> {
        self.ensure_ready()?;
        let tz = resolve_timezone(timezone)?;
        let now = Utc::now();
        let local_now = now.with_timezone(&tz);
        let at = parse_instant_at(when, local_now, self.shared.fuzzy.as_ref())?;
        ensure_future(&at, &local_now)?;

        let due = at.with_timezone(&Utc);
        let id = self.next_id(JobKind::OneShot);
        self.shared.insert_and_arm(
            Job {
                id: id.clone(),
                text: text.to_string(),
                schedule: Schedule::Once { at },
                timezone: tz,
                created_at: now,
            },
            due,
        );
        info!(job_id = %id, due = %due, "one-shot reminder scheduled");

        Ok(Confirmation {
            message: format!(
                "Reminder set for {} ({})",
                format_instant(&at, &tz),
                format_until(due, now)
            ),
            job_id: id,
            next_fire: Some(due),
        })
    }

    /// Schedule `text` to repeat according to `pattern`.
    pub fn schedule_recurring(
        &self,
        text: &str,
        pattern: &str,
        timezone: &str,
    ) -> Result<Confirmation> {
        self.ensure_ready()?;
        let tz = resolve_timezone(timezone)?;
        let trigger = compile_pattern_in(pattern, tz)?;
        let now = Utc::now();
        let due = trigger.next_after(now).ok_or_else(|| {
            ParseError::Unrecognized(format!("'{pattern}' has no upcoming occurrence"))
        })?;

        let id = self.next_id(JobKind::Recurring);
        info!(
            job_id = %id,
            trigger = %trigger.describe(),
            next_fire = %due,
            "recurring reminder scheduled"
        );
        self.shared.insert_and_arm(
            Job {
                id: id.clone(),
                text: text.to_string(),
                schedule: Schedule::Recurring {
                    trigger,
                    pattern: pattern.to_string(),
                },
                timezone: tz,
                created_at: now,
            },
            due,
        );

        Ok(Confirmation {
            message: format!(
                "Recurring: {pattern}\n⏰ Next: {}",
                format_instant(&due, &tz)
            ),
            job_id: id,
            next_fire: Some(due),
        })
    }

    /// Jobs in insertion order, each with its armed deadline if any.
    pub fn active_jobs(&self) -> Vec<ActiveJob> {
        let timers = self.shared.lock_timers();
        let jobs = self.shared.table.snapshot();
        jobs.into_iter()
            .map(|job| {
                let next_fire = timers.live.get(&job.id).map(|(due, _)| *due);
                ActiveJob { job, next_fire }
            })
            .collect()
    }

    /// Chat-ready listing of [`active_jobs`](Self::active_jobs).
    pub fn list_active(&self) -> String {
        let active = self.active_jobs();
        if active.is_empty() {
            return "📭 No reminders".to_string();
        }

        let now = Utc::now();
        let mut out = String::from("📋 Active Reminders:\n");
        for ActiveJob { job, next_fire } in &active {
            out.push_str(&format!("\n{} {}: {}\n", job.kind().marker(), job.id, job.text));
            match &job.schedule {
                Schedule::Once { at } => {
                    out.push_str(&format!("   Time: {}\n", format_instant(at, &job.timezone)));
                }
                Schedule::Recurring { pattern, .. } => {
                    out.push_str(&format!("   Pattern: {pattern}\n"));
                }
            }
            if let Some(due) = next_fire {
                out.push_str(&format!("   Next: {}\n", format_until(*due, now)));
            }
            out.push_str(&format!(
                "   Added: {}\n",
                format_instant(&job.created_at, &job.timezone)
            ));
        }
        out.trim_end().to_string()
    }

    /// Disarm and remove `id`. Once this returns, the job will not fire again.
    pub fn cancel(&self, id: &str) -> Result<Confirmation> {
        let id = JobId::from(id.trim());
        let mut timers = self.shared.lock_timers();
        timers.disarm(&id);
        let removed = self.shared.table.remove(&id);
        drop(timers);
        self.shared.wake.notify_one();

        let job = removed.ok_or_else(|| SchedulerError::NotFound { id: id.to_string() })?;
        info!(job_id = %id, "reminder cancelled");
        Ok(Confirmation {
            message: format!("Cancelled: {}", job.text),
            job_id: id,
            next_fire: None,
        })
    }

    /// Disarm and remove every job; returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut timers = self.shared.lock_timers();
        timers.disarm_all();
        let count = self.shared.table.clear();
        drop(timers);
        self.shared.wake.notify_one();
        info!(count, "all reminders cleared");
        count
    }

    /// Stop and join the engine thread. Idempotent.
    pub fn shutdown(&self) {
        self.shared.lock_timers().shutdown = true;
        self.shared.wake.notify_all();
        let handle = self
            .engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("scheduler engine thread panicked");
            }
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.shared.bridge.is_ready() {
            Ok(())
        } else {
            Err(SchedulerError::SinkNotReady)
        }
    }

    fn next_id(&self, kind: JobKind) -> JobId {
        JobId::new(kind, self.shared.next_seq.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
