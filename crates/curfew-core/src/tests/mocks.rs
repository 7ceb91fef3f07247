//! Mock backend for testing.
//!
//! Records every primitive call and can be told to fail at each step.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::PowerBackend;
use crate::error::{PowerError, PrivilegeError, Result};
use crate::types::Platform;

/// Arguments of the last graceful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GracefulCall {
    /// Countdown handed to the OS.
    pub timeout: Duration,
    /// Message handed to the OS.
    pub message: String,
    /// Reboot flag.
    pub reboot: bool,
}

/// Mock power backend.
///
/// Cloning shares the recorded state, so a test can keep one clone while
/// the scheduler owns another.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<MockState>,
}

struct MockState {
    supported: AtomicBool,
    privilege_error: parking_lot::RwLock<Option<PrivilegeError>>,
    os_error: parking_lot::RwLock<Option<PowerError>>,
    abort_error: parking_lot::RwLock<Option<PowerError>>,
    latency_ms: AtomicU64,

    ensure_count: AtomicU32,
    graceful_count: AtomicU32,
    forced_count: AtomicU32,
    abort_count: AtomicU32,

    last_graceful: parking_lot::Mutex<Option<GracefulCall>>,
    last_forced_reboot: parking_lot::Mutex<Option<bool>>,
}

impl MockBackend {
    /// Creates a mock backend where everything succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                supported: AtomicBool::new(true),
                privilege_error: parking_lot::RwLock::new(None),
                os_error: parking_lot::RwLock::new(None),
                abort_error: parking_lot::RwLock::new(None),
                latency_ms: AtomicU64::new(0),
                ensure_count: AtomicU32::new(0),
                graceful_count: AtomicU32::new(0),
                forced_count: AtomicU32::new(0),
                abort_count: AtomicU32::new(0),
                last_graceful: parking_lot::Mutex::new(None),
                last_forced_reboot: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Makes privilege acquisition fail.
    #[must_use]
    pub fn fail_privilege(self, err: PrivilegeError) -> Self {
        *self.state.privilege_error.write() = Some(err);
        self
    }

    /// Makes both power primitives fail with an OS error.
    #[must_use]
    pub fn fail_os(self, code: i32, msg: impl Into<String>) -> Self {
        *self.state.os_error.write() = Some(PowerError::os_call("mock", code, msg));
        self
    }

    /// Makes the abort primitive fail.
    #[must_use]
    pub fn fail_abort(self) -> Self {
        *self.state.abort_error.write() =
            Some(PowerError::os_call("abort", 1116, "no shutdown in progress"));
        self
    }

    /// Behaves like the unsupported-platform stub.
    #[must_use]
    pub fn unsupported(self) -> Self {
        self.state.supported.store(false, Ordering::SeqCst);
        self
    }

    /// Adds latency to each power primitive.
    #[must_use]
    pub fn latency(self, ms: u64) -> Self {
        self.state.latency_ms.store(ms, Ordering::SeqCst);
        self
    }

    /// Returns the backend as a trait object sharing this mock's state.
    #[must_use]
    pub fn shared(&self) -> Arc<dyn PowerBackend> {
        Arc::new(self.clone())
    }

    /// Number of privilege checks.
    #[must_use]
    pub fn ensure_count(&self) -> u32 {
        self.state.ensure_count.load(Ordering::SeqCst)
    }

    /// Number of graceful calls.
    #[must_use]
    pub fn graceful_count(&self) -> u32 {
        self.state.graceful_count.load(Ordering::SeqCst)
    }

    /// Number of forced calls.
    #[must_use]
    pub fn forced_count(&self) -> u32 {
        self.state.forced_count.load(Ordering::SeqCst)
    }

    /// Number of power primitive calls of either kind.
    #[must_use]
    pub fn executed_count(&self) -> u32 {
        self.graceful_count() + self.forced_count()
    }

    /// Number of abort calls.
    #[must_use]
    pub fn abort_count(&self) -> u32 {
        self.state.abort_count.load(Ordering::SeqCst)
    }

    /// Arguments of the last graceful call.
    #[must_use]
    pub fn last_graceful(&self) -> Option<GracefulCall> {
        self.state.last_graceful.lock().clone()
    }

    /// Reboot flag of the last forced call.
    #[must_use]
    pub fn last_forced_reboot(&self) -> Option<bool> {
        *self.state.last_forced_reboot.lock()
    }

    fn unsupported_error(&self, operation: &'static str) -> Option<PowerError> {
        if self.state.supported.load(Ordering::SeqCst) {
            None
        } else {
            Some(PowerError::unsupported(Platform::Other, operation))
        }
    }

    async fn simulate_latency(&self) {
        let ms = self.state.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PowerBackend for MockBackend {
    fn platform(&self) -> Platform {
        if self.is_supported() {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_supported(&self) -> bool {
        self.state.supported.load(Ordering::SeqCst)
    }

    async fn ensure_privilege(&self) -> Result<()> {
        self.state.ensure_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.unsupported_error("privilege elevation") {
            return Err(err);
        }
        match self.state.privilege_error.read().clone() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    async fn initiate_graceful(
        &self,
        timeout: Duration,
        message: &str,
        reboot: bool,
    ) -> Result<()> {
        if let Some(err) = self.unsupported_error("graceful shutdown") {
            return Err(err);
        }
        self.simulate_latency().await;
        self.state.graceful_count.fetch_add(1, Ordering::SeqCst);
        *self.state.last_graceful.lock() = Some(GracefulCall {
            timeout,
            message: message.to_string(),
            reboot,
        });
        match self.state.os_error.read().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn exit_forced(&self, reboot: bool) -> Result<()> {
        if let Some(err) = self.unsupported_error("forced shutdown") {
            return Err(err);
        }
        self.simulate_latency().await;
        self.state.forced_count.fetch_add(1, Ordering::SeqCst);
        *self.state.last_forced_reboot.lock() = Some(reboot);
        match self.state.os_error.read().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn abort(&self) -> Result<()> {
        if let Some(err) = self.unsupported_error("shutdown abort") {
            return Err(err);
        }
        self.state.abort_count.fetch_add(1, Ordering::SeqCst);
        match self.state.abort_error.read().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
