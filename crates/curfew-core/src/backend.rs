//! Power backend trait.
//!
//! A backend is the small capability surface the executor needs from the
//! host: obtain the shutdown privilege, start a graceful countdown, force an
//! immediate power transition, and abort a pending countdown. One backend is
//! chosen when the scheduler is built; nothing above this trait branches on
//! platform.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Platform;

/// Host power primitives.
#[async_trait]
pub trait PowerBackend: Send + Sync {
    /// Returns the platform this backend drives.
    fn platform(&self) -> Platform;

    /// Short backend name for logs and status reports.
    fn name(&self) -> &'static str;

    /// Returns false for backends that refuse every operation.
    fn is_supported(&self) -> bool {
        true
    }

    /// Obtains the shutdown privilege.
    ///
    /// Idempotent: once it has succeeded, later calls return `Ok(())`
    /// without touching the OS.
    ///
    /// # Errors
    /// Returns `PowerError::Privilege` when elevation fails, or
    /// `PowerError::Unsupported` on platforms without a native path.
    async fn ensure_privilege(&self) -> Result<()>;

    /// Starts an OS-level countdown that ends in power-off or reboot.
    ///
    /// The countdown can be aborted with [`PowerBackend::abort`] until it
    /// expires.
    ///
    /// # Errors
    /// Returns `PowerError::OsCall` if the OS rejects the request.
    async fn initiate_graceful(&self, timeout: Duration, message: &str, reboot: bool)
    -> Result<()>;

    /// Powers off or reboots immediately, terminating applications.
    ///
    /// Only returns on failure in a real backend.
    ///
    /// # Errors
    /// Returns `PowerError::OsCall` if the OS rejects the request.
    async fn exit_forced(&self, reboot: bool) -> Result<()>;

    /// Aborts a graceful countdown started by this or another process.
    ///
    /// # Errors
    /// Returns `PowerError::OsCall` if no countdown is pending or the OS
    /// refuses.
    async fn abort(&self) -> Result<()>;
}
