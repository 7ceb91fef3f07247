//! Power management configuration.
//!
//! Loaded from TOML and validated at load time, with defaults for every key.
//!
//! ```toml
//! enabled = true
//! backend = "auto"
//! reason_message = "Remote power operation requested"
//! max_delay = "30days"
//!
//! [linux]
//! shutdown_command = "/sbin/shutdown"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PowerError, Result};

/// Longest reason message accepted, in characters.
pub const MAX_REASON_LEN: usize = 512;

/// Which backend the platform layer should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Native backend when the host has one, stub otherwise.
    #[default]
    Auto,
    /// Native backend; construction fails where none exists.
    Native,
    /// Every operation returns `Unsupported`.
    Stub,
    /// Log what would happen without touching the host.
    DryRun,
}

impl BackendKind {
    /// Returns the backend name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Native => "native",
            Self::Stub => "stub",
            Self::DryRun => "dry-run",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Master switch; `false` selects the stub backend.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Backend selection.
    #[serde(default)]
    pub backend: BackendKind,

    /// Default message handed to the OS.
    #[serde(default = "default_reason_message")]
    pub reason_message: String,

    /// Largest accepted delay.
    #[serde(default = "default_max_delay")]
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Capacity of the scheduler event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Linux backend settings.
    #[serde(default)]
    pub linux: LinuxConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_reason_message() -> String {
    "Remote power operation requested".to_string()
}

fn default_max_delay() -> Duration {
    Duration::from_secs(3650 * 24 * 60 * 60)
}

fn default_event_capacity() -> usize {
    16
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: BackendKind::default(),
            reason_message: default_reason_message(),
            max_delay: default_max_delay(),
            event_capacity: default_event_capacity(),
            linux: LinuxConfig::default(),
        }
    }
}

impl PowerConfig {
    /// Sets the backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the default reason message.
    #[must_use]
    pub fn with_reason_message(mut self, msg: impl Into<String>) -> Self {
        self.reason_message = msg.into();
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Disables power management.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        validate_reason_message(&self.reason_message)?;
        if self.max_delay.is_zero() {
            return Err(PowerError::config("max_delay must be greater than zero"));
        }
        if self.event_capacity == 0 {
            return Err(PowerError::config("event_capacity must be greater than zero"));
        }
        self.linux.validate()
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or the result is invalid.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PowerError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PowerError::config(format!("failed to read config: {e}")))?;
        Self::from_toml(&content)
    }
}

/// Checks a reason message against the OS limits.
///
/// # Errors
/// Returns an error if the message is blank or too long.
pub fn validate_reason_message(msg: &str) -> Result<()> {
    if msg.trim().is_empty() {
        return Err(PowerError::config("reason_message cannot be empty"));
    }
    if msg.chars().count() > MAX_REASON_LEN {
        return Err(PowerError::config(format!(
            "reason_message exceeds {MAX_REASON_LEN} characters"
        )));
    }
    Ok(())
}

/// Linux backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxConfig {
    /// `shutdown(8)` binary used for the graceful path and for aborts.
    #[serde(default = "default_shutdown_command")]
    pub shutdown_command: PathBuf,

    /// Flush filesystem buffers before a forced `reboot(2)`.
    #[serde(default = "default_sync_before_forced")]
    pub sync_before_forced: bool,

    /// File the capability sets are read from.
    #[serde(default = "default_status_path")]
    pub status_path: PathBuf,
}

fn default_shutdown_command() -> PathBuf {
    PathBuf::from("/sbin/shutdown")
}

fn default_sync_before_forced() -> bool {
    true
}

fn default_status_path() -> PathBuf {
    PathBuf::from("/proc/self/status")
}

impl Default for LinuxConfig {
    fn default() -> Self {
        Self {
            shutdown_command: default_shutdown_command(),
            sync_before_forced: default_sync_before_forced(),
            status_path: default_status_path(),
        }
    }
}

impl LinuxConfig {
    /// Validates the Linux settings.
    ///
    /// # Errors
    /// Returns an error if a path is empty.
    pub fn validate(&self) -> Result<()> {
        if self.shutdown_command.as_os_str().is_empty() {
            return Err(PowerError::config("linux.shutdown_command cannot be empty"));
        }
        if self.status_path.as_os_str().is_empty() {
            return Err(PowerError::config("linux.status_path cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PowerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.enabled);
        assert_eq!(config.backend, BackendKind::Auto);
        assert_eq!(config.event_capacity, 16);
        assert_eq!(config.linux.shutdown_command, PathBuf::from("/sbin/shutdown"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = PowerConfig::from_toml("").unwrap();
        assert_eq!(config, PowerConfig::default());
    }

    #[test]
    fn test_full_toml() {
        let config = PowerConfig::from_toml(
            r#"
            enabled = false
            backend = "dry-run"
            reason_message = "Patch window"
            max_delay = "2h"
            event_capacity = 4

            [linux]
            shutdown_command = "/usr/sbin/shutdown"
            sync_before_forced = false
            "#,
        )
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.backend, BackendKind::DryRun);
        assert_eq!(config.reason_message, "Patch window");
        assert_eq!(config.max_delay, Duration::from_secs(7200));
        assert_eq!(config.event_capacity, 4);
        assert!(!config.linux.sync_before_forced);
        assert_eq!(config.linux.status_path, PathBuf::from("/proc/self/status"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = PowerConfig::from_toml(r#"backend = "systemd""#).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn test_blank_reason_rejected() {
        let config = PowerConfig::default().with_reason_message("   ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_long_reason_rejected() {
        let msg = "x".repeat(MAX_REASON_LEN + 1);
        assert!(validate_reason_message(&msg).is_err());
        assert!(validate_reason_message(&msg[..MAX_REASON_LEN]).is_ok());
    }

    #[test]
    fn test_zero_max_delay_rejected() {
        let config = PowerConfig::default().with_max_delay(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_delay"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend = \"stub\"").unwrap();
        let config = PowerConfig::load(file.path()).unwrap();
        assert_eq!(config.backend, BackendKind::Stub);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PowerConfig::load("/nonexistent/curfew.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
