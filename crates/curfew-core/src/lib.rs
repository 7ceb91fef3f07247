// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # curfew-core
//!
//! Deferred shutdown and reboot with a single cancellable slot.
//!
//! - [`Operation`]: immutable record of an accepted request
//! - [`PowerBackend`]: the host primitives (privilege, graceful, forced, abort)
//! - [`Executor`]: picks the graceful or forced primitive for an operation
//! - [`Scheduler`]: owns the slot, the delay timer and the cancel path
//! - [`PowerConfig`]: TOML configuration
//!
//! Backends live in `curfew-platform`; the scheduler itself never branches
//! on platform.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use curfew_core::{PowerConfig, Scheduler};
//!
//! let scheduler = Scheduler::with_backend(backend, PowerConfig::default())?;
//! scheduler.schedule_reboot(42, Duration::from_secs(300), false).await?;
//! assert!(scheduler.status().is_some());
//! scheduler.cancel().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod scheduler;
#[cfg(test)]
pub mod tests;
pub mod types;

pub use backend::PowerBackend;
pub use config::{BackendKind, LinuxConfig, MAX_REASON_LEN, PowerConfig};
pub use error::{PowerError, PrivilegeError, Result};
pub use executor::Executor;
pub use scheduler::{PowerRequest, Scheduler, SchedulerEvent, StatusReport};
pub use types::{Operation, OperationId, OperationKind, Platform, RequesterId};
