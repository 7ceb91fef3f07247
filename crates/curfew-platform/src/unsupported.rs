//! Stub backend for hosts without power management.

use std::time::Duration;

use async_trait::async_trait;

use curfew_core::{Platform, PowerBackend, PowerError, Result};

/// Backend that refuses every operation with `Unsupported`.
///
/// Also used when power management is disabled in configuration.
#[derive(Debug, Clone, Copy)]
pub struct StubBackend {
    platform: Platform,
}

impl StubBackend {
    /// Creates a stub reporting `platform` in its errors.
    #[must_use]
    pub const fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl PowerBackend for StubBackend {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_supported(&self) -> bool {
        false
    }

    async fn ensure_privilege(&self) -> Result<()> {
        Err(PowerError::unsupported(self.platform, "power management"))
    }

    async fn initiate_graceful(
        &self,
        _timeout: Duration,
        _message: &str,
        reboot: bool,
    ) -> Result<()> {
        let operation = if reboot { "reboot" } else { "shutdown" };
        Err(PowerError::unsupported(self.platform, operation))
    }

    async fn exit_forced(&self, reboot: bool) -> Result<()> {
        let operation = if reboot { "forced reboot" } else { "forced shutdown" };
        Err(PowerError::unsupported(self.platform, operation))
    }

    async fn abort(&self) -> Result<()> {
        Err(PowerError::unsupported(self.platform, "shutdown abort"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_refuses_everything() {
        let stub = StubBackend::new(Platform::Other);
        assert!(!stub.is_supported());

        let err = stub.ensure_privilege().await.unwrap_err();
        assert_eq!(err.to_string(), "power management is not supported on other");
        assert!(stub.initiate_graceful(Duration::ZERO, "m", true).await.is_err());
        assert!(stub.exit_forced(false).await.unwrap_err().is_permanent());
        assert!(stub.abort().await.is_err());
    }
}
