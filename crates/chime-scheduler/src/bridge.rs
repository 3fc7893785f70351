//! Hand-off between the scheduler's engine thread and the async runtime.
//!
//! The engine thread never awaits anything. A fired job becomes a
//! [`ReminderDelivery`] pushed onto an unbounded channel; a task on the runtime
//! ([`run_delivery`]) drains it and calls the transport's [`NotificationSink`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chime_core::reminder::ReminderDelivery;

use crate::error::{BridgeError, SinkError};
use crate::types::JobId;

pub type DeliverySender = mpsc::UnboundedSender<ReminderDelivery>;
pub type DeliveryReceiver = mpsc::UnboundedReceiver<ReminderDelivery>;

/// A transport able to push text to a destination (a chat id, a channel name...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short transport name for logs.
    fn name(&self) -> &str;

    async fn send(&self, destination: &str, text: &str) -> Result<(), SinkError>;
}

/// Successful hand-off: the delivery is queued for `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub destination: String,
}

/// Counters exposed for tests and operators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Calls to [`NotificationBridge::deliver`].
    pub attempts: u64,
    /// Deliveries queued onto the runtime.
    pub handed_off: u64,
    /// Hand-offs refused plus sends the transport rejected.
    pub failed: u64,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct Binding {
    destination: Option<String>,
    outbox: Option<DeliverySender>,
}

/// Holds the current destination and the runtime-side queue.
#[derive(Default)]
pub struct NotificationBridge {
    binding: Mutex<Binding>,
    attempts: AtomicU64,
    handed_off: AtomicU64,
    failed: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl NotificationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the destination together with the queue drained by the runtime.
    ///
    /// Called by the transport once it knows where reminders should go.
    pub fn bind_destination(&self, destination: impl Into<String>, outbox: DeliverySender) {
        let destination = destination.into();
        let mut binding = self.lock_binding();
        info!(destination = %destination, "notification destination bound");
        binding.destination = Some(destination);
        binding.outbox = Some(outbox);
    }

    /// Re-point an already bound bridge. Takes effect on the next fire.
    pub fn set_destination(&self, destination: impl Into<String>) {
        let destination = destination.into();
        let mut binding = self.lock_binding();
        if binding.destination.as_deref() != Some(destination.as_str()) {
            debug!(destination = %destination, "notification destination changed");
            binding.destination = Some(destination);
        }
    }

    pub fn destination(&self) -> Option<String> {
        self.lock_binding().destination.clone()
    }

    /// Whether a destination is known. Job creation is refused until it is.
    pub fn is_ready(&self) -> bool {
        self.lock_binding().destination.is_some()
    }

    /// Queue `text` for the bound destination and return without waiting.
    ///
    /// Safe to call from any thread. Failures are counted and logged here, so
    /// callers on the engine thread only need the result for their own logs.
    pub fn deliver(&self, job_id: &JobId, text: &str) -> Result<Delivered, BridgeError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let result = self.hand_off(job_id, text);
        match &result {
            Ok(delivered) => {
                self.handed_off.fetch_add(1, Ordering::Relaxed);
                debug!(job_id = %job_id, destination = %delivered.destination, "delivery queued");
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "delivery not queued");
                self.record_failure(e.to_string());
            }
        }
        result
    }

    /// Spawn [`run_delivery`] for `sink` on the current runtime and return the
    /// sender to pass to [`bind_destination`](Self::bind_destination).
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_delivery(
        self: &Arc<Self>,
        sink: Arc<dyn NotificationSink>,
    ) -> (DeliverySender, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_delivery(Arc::clone(self), sink, rx));
        (tx, handle)
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            handed_off: self.handed_off.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    fn hand_off(&self, job_id: &JobId, text: &str) -> Result<Delivered, BridgeError> {
        let binding = self.lock_binding();
        let destination = binding
            .destination
            .clone()
            .ok_or(BridgeError::NoDestination)?;
        let outbox = binding.outbox.as_ref().ok_or(BridgeError::LoopUnavailable)?;
        outbox
            .send(ReminderDelivery {
                job_id: job_id.to_string(),
                destination: destination.clone(),
                message: text.to_string(),
                fired_at: Utc::now(),
            })
            .map_err(|_| BridgeError::LoopUnavailable)?;
        Ok(Delivered { destination })
    }

    fn record_failure(&self, error: String) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    fn lock_binding(&self) -> MutexGuard<'_, Binding> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runtime-side loop: send every queued delivery through `sink`.
///
/// Runs until every [`DeliverySender`] is dropped. Send failures are logged and
/// recorded on `bridge`; nothing is retried.
pub async fn run_delivery(
    bridge: Arc<NotificationBridge>,
    sink: Arc<dyn NotificationSink>,
    mut rx: DeliveryReceiver,
) {
    info!(sink = sink.name(), "delivery task started");
    while let Some(delivery) = rx.recv().await {
        debug!(
            job_id = %delivery.job_id,
            destination = %delivery.destination,
            sink = sink.name(),
            "delivering reminder"
        );
        match sink.send(&delivery.destination, &delivery.message).await {
            Ok(()) => info!(job_id = %delivery.job_id, "reminder delivered"),
            Err(e) => {
                warn!(job_id = %delivery.job_id, error = %e, "reminder delivery failed");
                bridge.record_failure(e.to_string());
            }
        }
    }
    info!(sink = sink.name(), "delivery task exiting (channel closed)");
}
