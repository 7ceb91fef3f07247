//! Executor - maps an operation onto the backend's power primitives.
//!
//! Graceful kinds go through the abortable countdown primitive, forced kinds
//! through the immediate one. Privilege is always confirmed first; the OS
//! call is never attempted without it.

use std::sync::Arc;

use crate::backend::PowerBackend;
use crate::error::Result;
use crate::types::{Operation, Platform};

/// Runs operations against a [`PowerBackend`].
#[derive(Clone)]
pub struct Executor {
    backend: Arc<dyn PowerBackend>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("backend", &self.backend.name())
            .field("platform", &self.backend.platform())
            .finish()
    }
}

impl Executor {
    /// Creates an executor for the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn PowerBackend>) -> Self {
        Self { backend }
    }

    /// Returns the platform of the underlying backend.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.backend.platform()
    }

    /// Returns the backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns false when the backend refuses every operation.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Executes the operation.
    ///
    /// # Errors
    /// Propagates the privilege error unchanged if elevation fails, otherwise
    /// whatever the OS primitive returns.
    pub async fn run(&self, operation: &Operation) -> Result<()> {
        self.backend.ensure_privilege().await?;

        let reboot = operation.kind.is_reboot();
        if operation.kind.is_forced() {
            tracing::warn!(
                operation_id = %operation.id,
                kind = %operation.kind,
                requester = %operation.requested_by,
                "forcing immediate power transition"
            );
            self.backend.exit_forced(reboot).await
        } else {
            let timeout = operation.remaining();
            tracing::info!(
                operation_id = %operation.id,
                kind = %operation.kind,
                requester = %operation.requested_by,
                timeout = %humantime::format_duration(timeout),
                "initiating graceful power transition"
            );
            self.backend
                .initiate_graceful(timeout, &operation.reason_message, reboot)
                .await
        }
    }

    /// Aborts a pending OS-level countdown.
    ///
    /// # Errors
    /// Returns the backend's abort error.
    pub async fn abort(&self) -> Result<()> {
        self.backend.abort().await
    }
}
