//! Curfew: deferred shutdown and reboot with a single cancellable slot.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use curfew::prelude::*;
//!
//! # async fn run() -> curfew::core::Result<()> {
//! curfew::telemetry::init("info");
//! let scheduler = build_scheduler(PowerConfig::default().with_backend(BackendKind::DryRun))?;
//! scheduler.schedule_shutdown(7, Duration::from_secs(600), false).await?;
//! println!("{:?}", scheduler.status());
//! scheduler.cancel().await?;
//! # Ok(())
//! # }
//! ```

pub use curfew_core as core;
pub use curfew_platform as platform;

/// Prelude module for common imports.
pub mod prelude {
    pub use curfew_core::{
        BackendKind, Operation, OperationId, OperationKind, Platform, PowerConfig, PowerError,
        PowerRequest, PrivilegeError, RequesterId, Scheduler, SchedulerEvent, StatusReport,
    };
    pub use curfew_platform::{build_scheduler, detect_platform, select_backend};
}

/// Logging setup.
pub mod telemetry {
    use tracing_subscriber::EnvFilter;

    /// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by
    /// `default_filter` when the variable is unset or invalid.
    ///
    /// Returns false if a global subscriber was already installed.
    pub fn init(default_filter: &str) -> bool {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    }
}
