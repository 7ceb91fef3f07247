//! Dry-run backend.
//!
//! Accepts every call and logs the OS action it stands in for. Useful for
//! staging environments and for exercising a deployment end to end without
//! powering anything off.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use curfew_core::{Platform, PowerBackend, Result};

/// Backend that logs instead of acting.
#[derive(Debug)]
pub struct DryRunBackend {
    platform: Platform,
    calls: AtomicU32,
}

impl DryRunBackend {
    /// Creates a dry-run backend for `platform`.
    #[must_use]
    pub const fn new(platform: Platform) -> Self {
        Self {
            platform,
            calls: AtomicU32::new(0),
        }
    }

    /// Number of power primitives "executed" so far.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PowerBackend for DryRunBackend {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn ensure_privilege(&self) -> Result<()> {
        tracing::debug!("dry-run: privilege check skipped");
        Ok(())
    }

    async fn initiate_graceful(
        &self,
        timeout: Duration,
        message: &str,
        reboot: bool,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            timeout = %humantime::format_duration(timeout),
            reboot,
            message,
            "dry-run: would initiate graceful {}",
            if reboot { "reboot" } else { "shutdown" }
        );
        Ok(())
    }

    async fn exit_forced(&self, reboot: bool) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            reboot,
            "dry-run: would force {} immediately",
            if reboot { "reboot" } else { "power-off" }
        );
        Ok(())
    }

    async fn abort(&self) -> Result<()> {
        tracing::info!("dry-run: would abort pending system shutdown");
        Ok(())
    }
}
