//! Linux power backend.
//!
//! # Primitive mapping
//!
//! | Operation         | Linux                                             |
//! |-------------------|---------------------------------------------------|
//! | privilege         | `CAP_SYS_BOOT` via [`ShutdownPrivilege`]          |
//! | graceful          | `shutdown {-P,-r} {now,+MIN} <message>`           |
//! | abort             | `shutdown -c`                                     |
//! | forced            | `sync(2)` then `reboot(2)`                        |
//!
//! `shutdown(8)` counts down in whole minutes, so the remaining time is
//! rounded up. The forced path never returns on success.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::reboot::RebootMode;
use tokio::process::Command;

use curfew_core::{LinuxConfig, Platform, PowerBackend, PowerError, Result};

use crate::privilege::ShutdownPrivilege;

/// Native Linux backend.
#[derive(Debug)]
pub struct LinuxBackend {
    shutdown_command: PathBuf,
    sync_before_forced: bool,
    privilege: Arc<ShutdownPrivilege>,
}

impl LinuxBackend {
    /// Creates a backend from the `[linux]` configuration table.
    #[must_use]
    pub fn new(config: &LinuxConfig) -> Self {
        Self {
            shutdown_command: config.shutdown_command.clone(),
            sync_before_forced: config.sync_before_forced,
            privilege: Arc::new(ShutdownPrivilege::new(config.status_path.clone())),
        }
    }

    /// Returns the privilege adapter.
    #[must_use]
    pub fn privilege(&self) -> &ShutdownPrivilege {
        &self.privilege
    }

    async fn run_shutdown(&self, args: &[String]) -> Result<()> {
        tracing::debug!(command = %self.shutdown_command.display(), ?args, "running shutdown");

        let output = Command::new(&self.shutdown_command)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| PowerError::from_io("shutdown", &e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("{} exited with {}", self.shutdown_command.display(), output.status),
            detail => detail.to_string(),
        };
        Err(PowerError::os_call(
            "shutdown",
            output.status.code().unwrap_or(-1),
            message,
        ))
    }
}

/// Builds the `shutdown(8)` arguments for a graceful operation.
#[must_use]
pub fn graceful_args(timeout: Duration, message: &str, reboot: bool) -> Vec<String> {
    vec![
        if reboot { "-r" } else { "-P" }.to_string(),
        countdown(timeout),
        message.to_string(),
    ]
}

/// Formats a countdown the way `shutdown(8)` accepts it.
#[must_use]
pub fn countdown(timeout: Duration) -> String {
    let minutes = timeout.as_nanos().div_ceil(60_000_000_000);
    if minutes == 0 {
        "now".to_string()
    } else {
        format!("+{minutes}")
    }
}

/// Flushes and halts the host. Runs on a blocking thread.
fn force(privilege: &ShutdownPrivilege, sync: bool, reboot: bool) -> Result<()> {
    privilege.apply_to_current_thread()?;
    if sync {
        nix::unistd::sync();
    }

    let mode = if reboot {
        RebootMode::RB_AUTOBOOT
    } else {
        RebootMode::RB_POWER_OFF
    };
    match nix::sys::reboot::reboot(mode) {
        Ok(never) => match never {},
        Err(errno) => Err(PowerError::os_call("reboot", errno as i32, errno.desc())),
    }
}

#[async_trait]
impl PowerBackend for LinuxBackend {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn name(&self) -> &'static str {
        "linux"
    }

    async fn ensure_privilege(&self) -> Result<()> {
        self.privilege.ensure().map_err(PowerError::from)
    }

    async fn initiate_graceful(
        &self,
        timeout: Duration,
        message: &str,
        reboot: bool,
    ) -> Result<()> {
        self.run_shutdown(&graceful_args(timeout, message, reboot))
            .await
    }

    async fn exit_forced(&self, reboot: bool) -> Result<()> {
        let privilege = Arc::clone(&self.privilege);
        let sync = self.sync_before_forced;
        tokio::task::spawn_blocking(move || force(&privilege, sync, reboot))
            .await
            .map_err(|e| PowerError::os_call("reboot", -1, e.to_string()))?
    }

    async fn abort(&self) -> Result<()> {
        self.run_shutdown(&["-c".to_string()]).await
    }
}
