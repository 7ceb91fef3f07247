//! # curfew-platform
//!
//! Power backends for the curfew scheduler.
//!
//! - **Linux**: `CAP_SYS_BOOT` elevation, `shutdown(8)` for graceful
//!   operations and aborts, `reboot(2)` for forced ones
//! - **Stub**: every operation fails with `Unsupported`
//! - **Dry-run**: logs the action it stands in for
//!
//! ## Example
//!
//! ```rust,ignore
//! use curfew_core::PowerConfig;
//! use curfew_platform::build_scheduler;
//!
//! let scheduler = build_scheduler(PowerConfig::load("/etc/curfew.toml")?)?;
//! scheduler.schedule_reboot(42, Duration::from_secs(300), false).await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
#![warn(missing_docs)]

pub mod detect;
pub mod dry_run;
pub mod unsupported;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "linux")]
pub mod privilege;

pub use detect::{detect_platform, has_native_backend, select_backend};
pub use dry_run::DryRunBackend;
pub use unsupported::StubBackend;

#[cfg(target_os = "linux")]
pub use linux::LinuxBackend;
#[cfg(target_os = "linux")]
pub use privilege::{CAP_SYS_BOOT, CapabilitySets, ShutdownPrivilege};

use curfew_core::{PowerConfig, Result, Scheduler};

/// Validates `config`, selects its backend, and builds a scheduler on it.
///
/// # Errors
/// Returns an error if the configuration is invalid or the requested
/// backend is unavailable.
pub fn build_scheduler(config: PowerConfig) -> Result<Scheduler> {
    config.validate()?;
    let backend = select_backend(&config)?;
    Scheduler::with_backend(backend, config)
}
