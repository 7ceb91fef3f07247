//! Scheduler - the single pending-operation slot.
//!
//! # State machine
//!
//! ```text
//! Idle ──schedule(delay > 0)──▶ Scheduled ──timer fires──▶ Executed ──▶ Idle
//!   │                              │
//!   │                              └──cancel()──▶ Cancelled ──▶ Idle
//!   └──schedule(delay = 0)──▶ Executed ──▶ Idle
//! ```
//!
//! One mutex guards the slot together with the timer handle. The timer task
//! takes the same lock and only proceeds if the slot still holds *its*
//! operation, so a cancel and a firing timer always resolve to exactly one
//! outcome. The lock is never held across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::backend::PowerBackend;
use crate::config::{PowerConfig, validate_reason_message};
use crate::error::{PowerError, Result};
use crate::executor::Executor;
use crate::types::{Operation, OperationId, OperationKind, Platform, RequesterId};

/// A request to schedule a power operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerRequest {
    /// What to do.
    pub kind: OperationKind,
    /// Authorized caller.
    pub requested_by: RequesterId,
    /// How long to wait before executing.
    pub delay: Duration,
    /// Overrides the configured reason message.
    pub reason_message: Option<String>,
}

impl PowerRequest {
    /// Creates a shutdown request.
    #[must_use]
    pub fn shutdown(requested_by: impl Into<RequesterId>, delay: Duration, force: bool) -> Self {
        Self {
            kind: OperationKind::new(false, force),
            requested_by: requested_by.into(),
            delay,
            reason_message: None,
        }
    }

    /// Creates a reboot request.
    #[must_use]
    pub fn reboot(requested_by: impl Into<RequesterId>, delay: Duration, force: bool) -> Self {
        Self {
            kind: OperationKind::new(true, force),
            requested_by: requested_by.into(),
            delay,
            reason_message: None,
        }
    }

    /// Sets the message shown by the OS.
    #[must_use]
    pub fn with_reason_message(mut self, msg: impl Into<String>) -> Self {
        self.reason_message = Some(msg.into());
        self
    }
}

/// Lifecycle notifications published by the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A delayed operation now occupies the slot.
    Scheduled(Operation),
    /// The pending operation was cancelled before it fired.
    Cancelled(Operation),
    /// The operation was handed to the executor.
    Executed {
        /// The operation that ran.
        operation: Operation,
        /// What the executor returned.
        result: Result<()>,
    },
}

/// Snapshot of the scheduler for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// False when the stub backend is in use.
    pub supported: bool,
    /// Platform of the backend.
    pub platform: Platform,
    /// Backend name.
    pub backend: &'static str,
    /// Copy of the pending operation, if any.
    pub pending: Option<Operation>,
    /// Time left before the pending operation fires.
    #[serde(with = "humantime_serde")]
    pub remaining: Option<Duration>,
}

/// Slot contents: the operation and the timer that will fire it.
struct Pending {
    operation: Operation,
    timer: JoinHandle<()>,
}

/// State shared with timer tasks.
struct Shared {
    slot: Mutex<Option<Pending>>,
    executor: Executor,
    events: broadcast::Sender<SchedulerEvent>,
}

impl Shared {
    fn emit(&self, event: SchedulerEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn pending_kind(&self) -> Option<OperationKind> {
        self.slot.lock().as_ref().map(|p| p.operation.kind)
    }
}

/// Single-slot deferred power-operation scheduler.
///
/// Construct one per process and share it by reference (or `Arc`); dropping
/// it stops any live timer without executing the pending operation.
pub struct Scheduler {
    shared: Arc<Shared>,
    config: PowerConfig,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("executor", &self.shared.executor)
            .field("pending", &self.status())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler around an executor.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(executor: Executor, config: PowerConfig) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                executor,
                events,
            }),
            config,
        })
    }

    /// Creates a scheduler directly from a backend.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_backend(backend: Arc<dyn PowerBackend>, config: PowerConfig) -> Result<Self> {
        Self::new(Executor::new(backend), config)
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PowerConfig {
        &self.config
    }

    /// Schedules a shutdown.
    ///
    /// # Errors
    /// See [`Scheduler::schedule`].
    pub async fn schedule_shutdown(
        &self,
        requester: impl Into<RequesterId>,
        delay: Duration,
        force: bool,
    ) -> Result<()> {
        self.schedule(PowerRequest::shutdown(requester, delay, force))
            .await
            .map(drop)
    }

    /// Schedules a reboot.
    ///
    /// # Errors
    /// See [`Scheduler::schedule`].
    pub async fn schedule_reboot(
        &self,
        requester: impl Into<RequesterId>,
        delay: Duration,
        force: bool,
    ) -> Result<()> {
        self.schedule(PowerRequest::reboot(requester, delay, force))
            .await
            .map(drop)
    }

    /// Accepts a request.
    ///
    /// A zero delay runs the executor before returning and never touches the
    /// slot. A positive delay stores the operation and arms a timer; the
    /// call returns as soon as the bookkeeping is done.
    ///
    /// # Errors
    /// - `Unsupported` if the backend refuses every operation
    /// - `InvalidDelay` if the delay exceeds `max_delay`
    /// - `Config` if the reason message override is blank or too long
    /// - `AlreadyScheduled` if the slot is occupied
    /// - for zero delay, whatever the executor returns
    pub async fn schedule(&self, request: PowerRequest) -> Result<Operation> {
        if !self.shared.executor.is_supported() {
            return Err(PowerError::unsupported(
                self.shared.executor.platform(),
                request.kind.name(),
            ));
        }

        if request.delay > self.config.max_delay {
            return Err(PowerError::InvalidDelay {
                requested: request.delay,
                max: self.config.max_delay,
            });
        }

        let reason = match request.reason_message {
            Some(msg) => {
                validate_reason_message(&msg)?;
                msg
            }
            None => self.config.reason_message.clone(),
        };
        let operation = Operation::new(request.kind, request.requested_by, request.delay, reason);

        if operation.is_immediate() {
            return self.execute_now(operation).await;
        }

        {
            let mut slot = self.shared.slot.lock();
            if let Some(pending) = slot.as_ref() {
                return Err(PowerError::AlreadyScheduled {
                    pending: pending.operation.kind,
                });
            }
            let timer = tokio::spawn(fire(
                Arc::clone(&self.shared),
                operation.id,
                operation.delay,
            ));
            *slot = Some(Pending {
                operation: operation.clone(),
                timer,
            });
        }

        tracing::info!(
            operation_id = %operation.id,
            kind = %operation.kind,
            requester = %operation.requested_by,
            delay = %humantime::format_duration(operation.delay),
            "power operation scheduled"
        );
        if operation.kind.is_forced() {
            tracing::warn!(
                operation_id = %operation.id,
                "forced operations cannot be aborted once they fire"
            );
        }
        self.shared.emit(SchedulerEvent::Scheduled(operation.clone()));
        Ok(operation)
    }

    async fn execute_now(&self, operation: Operation) -> Result<Operation> {
        if let Some(pending) = self.shared.pending_kind() {
            return Err(PowerError::AlreadyScheduled { pending });
        }

        tracing::info!(
            operation_id = %operation.id,
            kind = %operation.kind,
            requester = %operation.requested_by,
            "executing power operation immediately"
        );
        let result = self.shared.executor.run(&operation).await;
        if let Err(ref e) = result {
            tracing::error!(operation_id = %operation.id, error = %e, "power operation failed");
        }
        self.shared.emit(SchedulerEvent::Executed {
            operation: operation.clone(),
            result: result.clone(),
        });
        result.map(|()| operation)
    }

    /// Cancels the pending operation and returns it.
    ///
    /// The timer is stopped first. For graceful kinds a best-effort OS abort
    /// follows; its failure is logged and does not fail the cancel. Forced
    /// kinds have no OS-side countdown, so no abort is issued for them.
    ///
    /// # Errors
    /// Returns `NothingScheduled` if the slot is empty.
    pub async fn cancel(&self) -> Result<Operation> {
        let pending = self
            .shared
            .slot
            .lock()
            .take()
            .ok_or(PowerError::NothingScheduled)?;
        pending.timer.abort();
        let operation = pending.operation;

        tracing::info!(
            operation_id = %operation.id,
            kind = %operation.kind,
            requester = %operation.requested_by,
            "power operation cancelled"
        );

        if !operation.kind.is_forced() {
            if let Err(e) = self.shared.executor.abort().await {
                tracing::warn!(operation_id = %operation.id, error = %e, "OS abort failed");
            }
        }

        self.shared.emit(SchedulerEvent::Cancelled(operation.clone()));
        Ok(operation)
    }

    /// Returns a copy of the pending operation, if any.
    #[must_use]
    pub fn status(&self) -> Option<Operation> {
        self.shared
            .slot
            .lock()
            .as_ref()
            .map(|p| p.operation.clone())
    }

    /// Returns true while an operation occupies the slot.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.slot.lock().is_some()
    }

    /// Returns a full status snapshot.
    #[must_use]
    pub fn report(&self) -> StatusReport {
        let pending = self.status();
        let remaining = pending.as_ref().map(Operation::remaining);
        StatusReport {
            supported: self.shared.executor.is_supported(),
            platform: self.shared.executor.platform(),
            backend: self.shared.executor.backend_name(),
            pending,
            remaining,
        }
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.shared.events.subscribe()
    }

    /// Stops any live timer and empties the slot without executing or
    /// aborting anything at OS level. Returns the discarded operation.
    pub fn close(&self) -> Option<Operation> {
        let pending = self.shared.slot.lock().take()?;
        pending.timer.abort();
        tracing::debug!(
            operation_id = %pending.operation.id,
            "scheduler closed with pending operation"
        );
        Some(pending.operation)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(pending) = self.shared.slot.lock().take() {
            pending.timer.abort();
        }
    }
}

/// Timer body: wait, claim the slot if it still holds `id`, execute.
async fn fire(shared: Arc<Shared>, id: OperationId, delay: Duration) {
    tokio::time::sleep(delay).await;

    let operation = {
        let mut slot = shared.slot.lock();
        let ours = slot.as_ref().is_some_and(|p| p.operation.id == id);
        if ours {
            slot.take().map(|p| p.operation)
        } else {
            None
        }
    };

    let Some(operation) = operation else {
        tracing::debug!(operation_id = %id, "timer fired after cancel; nothing to do");
        return;
    };

    let result = shared.executor.run(&operation).await;
    match &result {
        Ok(()) => tracing::info!(
            operation_id = %operation.id,
            kind = %operation.kind,
            "power operation executed"
        ),
        Err(e) => tracing::error!(
            operation_id = %operation.id,
            kind = %operation.kind,
            error = %e,
            "power operation failed"
        ),
    }
    shared.emit(SchedulerEvent::Executed { operation, result });
}
