//! Platform detection and backend selection.
//!
//! Detection is compile-time: the host OS cannot change under a running
//! process. Selection falls back to the stub whenever no native backend
//! exists, unless the configuration explicitly demands one.

use std::sync::Arc;

use curfew_core::{BackendKind, PowerBackend, PowerConfig, PowerError, Platform, Result};

use crate::dry_run::DryRunBackend;
use crate::unsupported::StubBackend;

/// Returns the platform this binary was built for.
#[must_use]
pub const fn detect_platform() -> Platform {
    if cfg!(target_os = "linux") {
        Platform::Linux
    } else if cfg!(target_os = "macos") {
        Platform::MacOS
    } else if cfg!(target_os = "windows") {
        Platform::Windows
    } else {
        Platform::Other
    }
}

/// Returns true if a native backend exists for `platform` in this build.
#[must_use]
pub const fn has_native_backend(platform: Platform) -> bool {
    matches!(platform, Platform::Linux) && cfg!(target_os = "linux")
}

/// Constructs the backend named by `config`.
///
/// | `enabled` | `backend`  | Result                                   |
/// |-----------|------------|------------------------------------------|
/// | false     | any        | stub                                     |
/// | true      | `auto`     | native if available, stub otherwise      |
/// | true      | `native`   | native, or `Unsupported`                 |
/// | true      | `stub`     | stub                                     |
/// | true      | `dry-run`  | dry-run                                  |
///
/// # Errors
/// Returns `Unsupported` if a native backend is required but absent.
pub fn select_backend(config: &PowerConfig) -> Result<Arc<dyn PowerBackend>> {
    let platform = detect_platform();

    if !config.enabled {
        tracing::info!("power management disabled, using stub backend");
        return Ok(Arc::new(StubBackend::new(platform)));
    }

    let backend: Arc<dyn PowerBackend> = match config.backend {
        BackendKind::Auto if has_native_backend(platform) => native(config)?,
        BackendKind::Auto | BackendKind::Stub => Arc::new(StubBackend::new(platform)),
        BackendKind::Native => {
            if !has_native_backend(platform) {
                return Err(PowerError::unsupported(platform, "native power backend"));
            }
            native(config)?
        }
        BackendKind::DryRun => Arc::new(DryRunBackend::new(platform)),
    };

    tracing::debug!(
        requested = %config.backend,
        selected = backend.name(),
        %platform,
        "power backend selected"
    );
    Ok(backend)
}

#[cfg(target_os = "linux")]
#[allow(clippy::unnecessary_wraps)]
fn native(config: &PowerConfig) -> Result<Arc<dyn PowerBackend>> {
    Ok(Arc::new(crate::linux::LinuxBackend::new(&config.linux)))
}

#[cfg(not(target_os = "linux"))]
fn native(_config: &PowerConfig) -> Result<Arc<dyn PowerBackend>> {
    Err(PowerError::unsupported(detect_platform(), "native power backend"))
}
