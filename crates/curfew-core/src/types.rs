//! Core types for deferred power operations.
//!
//! An [`Operation`] is built once when a request is accepted and never
//! changes afterwards; the scheduler hands out clones.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Unique identifier for an accepted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(uuid::Uuid);

impl OperationId {
    /// Creates a new random operation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of the (already authorized) caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterId(pub i64);

impl From<i64> for RequesterId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the host should do when the operation fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Graceful power-off with an abortable countdown.
    Shutdown,
    /// Graceful reboot with an abortable countdown.
    Reboot,
    /// Immediate power-off; applications are not asked.
    ForcedShutdown,
    /// Immediate reboot; applications are not asked.
    ForcedReboot,
}

impl OperationKind {
    /// Builds the kind from its two orthogonal axes.
    #[must_use]
    pub const fn new(reboot: bool, force: bool) -> Self {
        match (reboot, force) {
            (false, false) => Self::Shutdown,
            (true, false) => Self::Reboot,
            (false, true) => Self::ForcedShutdown,
            (true, true) => Self::ForcedReboot,
        }
    }

    /// Returns true for the forced (non-abortable) variants.
    #[must_use]
    pub const fn is_forced(&self) -> bool {
        matches!(self, Self::ForcedShutdown | Self::ForcedReboot)
    }

    /// Returns true if the host comes back up afterwards.
    #[must_use]
    pub const fn is_reboot(&self) -> bool {
        matches!(self, Self::Reboot | Self::ForcedReboot)
    }

    /// Returns the kind name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Reboot => "reboot",
            Self::ForcedShutdown => "forced shutdown",
            Self::ForcedReboot => "forced reboot",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Host platform a backend is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Linux (capabilities + `reboot(2)`).
    Linux,
    /// macOS.
    MacOS,
    /// Windows.
    Windows,
    /// Anything else.
    Other,
}

impl Platform {
    /// Returns the platform name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOS => "macos",
            Self::Windows => "windows",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An accepted power operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Correlation ID for logs.
    pub id: OperationId,
    /// What to do.
    pub kind: OperationKind,
    /// Who asked for it.
    pub requested_by: RequesterId,
    /// Message shown by the OS where supported.
    pub reason_message: String,
    /// Delay as originally requested.
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// When the request was accepted.
    pub created_at: SystemTime,
    /// When execution is attempted (`created_at + delay`).
    pub scheduled_at: SystemTime,
}

impl Operation {
    /// Creates an operation accepted now.
    #[must_use]
    pub fn new(
        kind: OperationKind,
        requested_by: RequesterId,
        delay: Duration,
        reason_message: impl Into<String>,
    ) -> Self {
        Self::accepted_at(kind, requested_by, delay, reason_message, SystemTime::now())
    }

    /// Creates an operation accepted at `created_at`.
    ///
    /// If `created_at + delay` is not representable the deadline is clamped to
    /// `created_at`, which keeps `scheduled_at >= created_at`.
    #[must_use]
    pub fn accepted_at(
        kind: OperationKind,
        requested_by: RequesterId,
        delay: Duration,
        reason_message: impl Into<String>,
        created_at: SystemTime,
    ) -> Self {
        let scheduled_at = created_at.checked_add(delay).unwrap_or(created_at);
        Self {
            id: OperationId::new(),
            kind,
            requested_by,
            reason_message: reason_message.into(),
            delay,
            created_at,
            scheduled_at,
        }
    }

    /// Time left until the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining_at(SystemTime::now())
    }

    /// Time left until the deadline as seen from `now`.
    #[must_use]
    pub fn remaining_at(&self, now: SystemTime) -> Duration {
        self.scheduled_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }

    /// Returns true if the operation runs as soon as it is accepted.
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        self.delay.is_zero()
    }
}
