//! Error types for curfew-core.
//!
//! Every failure a caller can observe is a [`PowerError`]. Nothing in the
//! scheduler retries, panics, or exits the process on error.

use std::time::Duration;

use crate::types::{OperationKind, Platform};

/// Result type alias for power operations.
pub type Result<T> = std::result::Result<T, PowerError>;

/// Failure to obtain the privilege required to power off or reboot the host.
///
/// The three variants follow the order in which elevation is attempted:
/// read the process token, resolve the privilege, adjust the token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrivilegeError {
    /// The process security token could not be opened or read.
    #[error("cannot open process token: {0}")]
    TokenOpen(String),

    /// The shutdown privilege could not be resolved in the token.
    #[error("cannot resolve shutdown privilege: {0}")]
    PrivilegeLookup(String),

    /// The token could not be adjusted to enable the privilege.
    #[error("cannot adjust process token: {0}")]
    TokenAdjust(String),
}

impl PrivilegeError {
    /// Creates a token-open error.
    #[must_use]
    pub fn token_open(msg: impl Into<String>) -> Self {
        Self::TokenOpen(msg.into())
    }

    /// Creates a privilege-lookup error.
    #[must_use]
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::PrivilegeLookup(msg.into())
    }

    /// Creates a token-adjust error.
    #[must_use]
    pub fn adjust(msg: impl Into<String>) -> Self {
        Self::TokenAdjust(msg.into())
    }
}

/// Error type for scheduling and executing power operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PowerError {
    /// An operation already occupies the slot.
    #[error("a {pending} is already scheduled; cancel it first")]
    AlreadyScheduled {
        /// Kind of the operation holding the slot.
        pending: OperationKind,
    },

    /// Cancel was requested but the slot is empty.
    #[error("nothing is scheduled")]
    NothingScheduled,

    /// The shutdown privilege could not be obtained.
    #[error("privilege error: {0}")]
    Privilege(#[from] PrivilegeError),

    /// The OS power primitive failed.
    #[error("{primitive} failed (code {code}): {message}")]
    OsCall {
        /// Name of the primitive that failed.
        primitive: &'static str,
        /// Raw OS error code or process exit status.
        code: i32,
        /// Human-readable detail.
        message: String,
    },

    /// Power operations are not available on this platform.
    #[error("{operation} is not supported on {platform}")]
    Unsupported {
        /// Platform of the selected backend.
        platform: Platform,
        /// The operation that was refused.
        operation: &'static str,
    },

    /// The requested delay exceeds the configured maximum.
    #[error("delay {} exceeds the maximum of {}", human(.requested), human(.max))]
    InvalidDelay {
        /// Delay that was requested.
        requested: Duration,
        /// Configured upper bound.
        max: Duration,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

fn human(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

impl PowerError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an OS call error.
    #[must_use]
    pub fn os_call(primitive: &'static str, code: i32, msg: impl Into<String>) -> Self {
        Self::OsCall {
            primitive,
            code,
            message: msg.into(),
        }
    }

    /// Creates an OS call error from an I/O error.
    #[must_use]
    pub fn from_io(primitive: &'static str, err: &std::io::Error) -> Self {
        Self::os_call(primitive, err.raw_os_error().unwrap_or(-1), err.to_string())
    }

    /// Creates an unsupported-platform error.
    #[must_use]
    pub const fn unsupported(platform: Platform, operation: &'static str) -> Self {
        Self::Unsupported {
            platform,
            operation,
        }
    }

    /// Returns true if the caller can fix the condition and try again
    /// (cancel first, pick a shorter delay, ...).
    #[must_use]
    pub const fn is_caller_correctable(&self) -> bool {
        matches!(
            self,
            Self::AlreadyScheduled { .. } | Self::NothingScheduled | Self::InvalidDelay { .. }
        )
    }

    /// Returns true if the error ends the operation it was raised for.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Privilege(_) | Self::OsCall { .. })
    }

    /// Returns true if the condition holds for the lifetime of the process.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
