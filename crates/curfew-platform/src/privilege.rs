//! Shutdown privilege on Linux.
//!
//! The process "token" is the capability triple in `/proc/self/status`
//! (`CapInh`, `CapPrm`, `CapEff`) and the privilege is `CAP_SYS_BOOT`.
//!
//! Acquisition is split in two:
//!
//! - [`ShutdownPrivilege::ensure`] only checks that the capability is
//!   effective or permitted and caches the answer. It changes no thread.
//! - [`ShutdownPrivilege::apply_to_current_thread`] raises the capability
//!   into the effective set with `capset(2)`. Capabilities are per-thread,
//!   so this runs on the blocking thread that calls `reboot(2)` and nowhere
//!   else.
//!
//! The graceful path never raises anything: `shutdown(8)` is a separate
//! program, and `execve(2)` drops effective capabilities that are not
//! ambient. There the check only confirms the process is entitled to power
//! the host off.

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use curfew_core::PrivilegeError;

/// Capability number of `CAP_SYS_BOOT`.
pub const CAP_SYS_BOOT: u32 = 22;

const LINUX_CAPABILITY_VERSION_3: u32 = 0x2008_0522;

/// The three capability sets of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySets {
    /// `CapInh`.
    pub inheritable: u64,
    /// `CapPrm`.
    pub permitted: u64,
    /// `CapEff`.
    pub effective: u64,
}

impl CapabilitySets {
    /// Parses the capability lines of a `/proc/<pid>/status` file.
    ///
    /// # Errors
    /// Returns `PrivilegeLookup` if a line is missing or not hexadecimal.
    pub fn parse(status: &str) -> Result<Self, PrivilegeError> {
        Ok(Self {
            inheritable: field(status, "CapInh:")?,
            permitted: field(status, "CapPrm:")?,
            effective: field(status, "CapEff:")?,
        })
    }

    /// Returns true if `cap` is in the effective set.
    #[must_use]
    pub const fn has_effective(&self, cap: u32) -> bool {
        self.effective & (1 << cap) != 0
    }

    /// Returns true if `cap` is in the permitted set.
    #[must_use]
    pub const fn has_permitted(&self, cap: u32) -> bool {
        self.permitted & (1 << cap) != 0
    }

    /// Returns a copy with `cap` added to the effective set.
    #[must_use]
    pub const fn with_effective(mut self, cap: u32) -> Self {
        self.effective |= 1 << cap;
        self
    }
}

fn field(status: &str, key: &str) -> Result<u64, PrivilegeError> {
    // Format: "CapEff:\t000001ffffffffff"
    let value = status
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .ok_or_else(|| PrivilegeError::lookup(format!("{} not found", key.trim_end_matches(':'))))?;
    u64::from_str_radix(value.trim(), 16).map_err(|e| {
        PrivilegeError::lookup(format!(
            "{} is not a capability mask: {e}",
            key.trim_end_matches(':')
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Elevation {
    /// Not yet confirmed.
    Pending,
    /// Already effective without adjustment (e.g. root).
    Held,
    /// Permitted but not effective; these sets raise it.
    Permitted(CapabilitySets),
}

/// Cached acquisition of `CAP_SYS_BOOT`.
#[derive(Debug)]
pub struct ShutdownPrivilege {
    status_path: PathBuf,
    state: Mutex<Elevation>,
}

impl ShutdownPrivilege {
    /// Creates an adapter reading capabilities from `status_path`.
    #[must_use]
    pub fn new(status_path: impl Into<PathBuf>) -> Self {
        Self {
            status_path: status_path.into(),
            state: Mutex::new(Elevation::Pending),
        }
    }

    /// Returns the capability source.
    #[must_use]
    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    /// Returns true once [`ShutdownPrivilege::ensure`] has succeeded.
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        !matches!(*self.state.lock(), Elevation::Pending)
    }

    /// Confirms `CAP_SYS_BOOT` is available to the process. Later calls are
    /// no-ops once this succeeds; failures are not cached.
    ///
    /// # Errors
    /// - `TokenOpen` if the status file cannot be read
    /// - `PrivilegeLookup` if the capability lines are missing or malformed
    /// - `TokenAdjust` if the capability is not permitted
    pub fn ensure(&self) -> Result<(), PrivilegeError> {
        let mut state = self.state.lock();
        if !matches!(*state, Elevation::Pending) {
            return Ok(());
        }

        let status = std::fs::read_to_string(&self.status_path).map_err(|e| {
            PrivilegeError::token_open(format!("{}: {e}", self.status_path.display()))
        })?;
        let caps = CapabilitySets::parse(&status)?;

        *state = if caps.has_effective(CAP_SYS_BOOT) {
            Elevation::Held
        } else if caps.has_permitted(CAP_SYS_BOOT) {
            Elevation::Permitted(caps.with_effective(CAP_SYS_BOOT))
        } else {
            return Err(PrivilegeError::adjust(
                "CAP_SYS_BOOT is not in the permitted set (run as root or grant cap_sys_boot)",
            ));
        };

        tracing::info!(path = %self.status_path.display(), "shutdown privilege acquired");
        Ok(())
    }

    /// Makes `CAP_SYS_BOOT` effective on the calling thread.
    ///
    /// # Errors
    /// Returns `TokenAdjust` if [`ShutdownPrivilege::ensure`] has not
    /// succeeded or `capset` fails.
    pub fn apply_to_current_thread(&self) -> Result<(), PrivilegeError> {
        let state = *self.state.lock();
        match state {
            Elevation::Permitted(sets) => {
                capset(&sets).map_err(|e| PrivilegeError::adjust(format!("capset: {e}")))
            }
            Elevation::Held => Ok(()),
            Elevation::Pending => Err(PrivilegeError::adjust("privilege not acquired")),
        }
    }
}

#[repr(C)]
struct CapUserHeader {
    version: u32,
    pid: libc::c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CapUserData {
    effective: u32,
    permitted: u32,
    inheritable: u32,
}

/// Sets the calling thread's capabilities.
#[allow(unsafe_code)]
fn capset(sets: &CapabilitySets) -> io::Result<()> {
    let mut header = CapUserHeader {
        version: LINUX_CAPABILITY_VERSION_3,
        pid: 0,
    };
    // Version 3 splits each 64-bit set into low and high words.
    let data = [
        CapUserData {
            effective: sets.effective as u32,
            permitted: sets.permitted as u32,
            inheritable: sets.inheritable as u32,
        },
        CapUserData {
            effective: (sets.effective >> 32) as u32,
            permitted: (sets.permitted >> 32) as u32,
            inheritable: (sets.inheritable >> 32) as u32,
        },
    ];

    // SAFETY: header and data match the kernel's `__user_cap_header_struct`
    // and `__user_cap_data_struct[2]` layout for version 3, and both outlive
    // the call.
    let rc = unsafe {
        libc::syscall(
            libc::SYS_capset,
            std::ptr::addr_of_mut!(header),
            data.as_ptr(),
        )
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROOT_STATUS: &str = "Name:\tcurfew\nUmask:\t0022\nState:\tR (running)\n\
        CapInh:\t0000000000000000\nCapPrm:\t000001ffffffffff\n\
        CapEff:\t000001ffffffffff\nCapBnd:\t000001ffffffffff\n";

    const PERMITTED_ONLY_STATUS: &str = "Name:\tcurfew\nCapInh:\t0000000000000000\n\
        CapPrm:\t0000000000400000\nCapEff:\t0000000000000000\n";

    const UNPRIVILEGED_STATUS: &str = "Name:\tcurfew\nCapInh:\t0000000000000000\n\
        CapPrm:\t0000000000000000\nCapEff:\t0000000000000000\n";

    fn fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_root_caps() {
        let caps = CapabilitySets::parse(ROOT_STATUS).unwrap();
        assert_eq!(caps.inheritable, 0);
        assert_eq!(caps.permitted, 0x1ff_ffff_ffff);
        assert!(caps.has_effective(CAP_SYS_BOOT));
        assert!(caps.has_permitted(CAP_SYS_BOOT));
    }

    #[test]
    fn test_parse_missing_line() {
        let err = CapabilitySets::parse("Name:\tcurfew\nCapInh:\t0\nCapPrm:\t0\n").unwrap_err();
        assert!(matches!(err, PrivilegeError::PrivilegeLookup(_)));
        assert!(err.to_string().contains("CapEff"));
    }

    #[test]
    fn test_parse_garbage_mask() {
        let err = CapabilitySets::parse("CapInh:\t0\nCapPrm:\tzz\nCapEff:\t0\n").unwrap_err();
        assert!(matches!(err, PrivilegeError::PrivilegeLookup(_)));
    }

    #[test]
    fn test_with_effective() {
        let caps = CapabilitySets {
            permitted: 1 << CAP_SYS_BOOT,
            ..CapabilitySets::default()
        };
        assert!(!caps.has_effective(CAP_SYS_BOOT));
        assert!(caps.with_effective(CAP_SYS_BOOT).has_effective(CAP_SYS_BOOT));
    }

    #[test]
    fn test_ensure_missing_file_is_token_open() {
        let privilege = ShutdownPrivilege::new("/nonexistent/status");
        let err = privilege.ensure().unwrap_err();
        assert!(matches!(err, PrivilegeError::TokenOpen(_)));
        assert!(!privilege.is_acquired());
    }

    #[test]
    fn test_ensure_not_permitted_is_token_adjust() {
        let file = fixture(UNPRIVILEGED_STATUS);
        let privilege = ShutdownPrivilege::new(file.path());
        let err = privilege.ensure().unwrap_err();
        assert!(matches!(err, PrivilegeError::TokenAdjust(_)));
        assert!(err.to_string().contains("CAP_SYS_BOOT"));
        assert!(!privilege.is_acquired());

        // Failures are not cached.
        assert!(privilege.ensure().is_err());
    }

    #[test]
    fn test_ensure_caches_success() {
        let file = fixture(ROOT_STATUS);
        let privilege = ShutdownPrivilege::new(file.path().to_path_buf());
        privilege.ensure().unwrap();
        assert!(privilege.is_acquired());

        // The source is not consulted again.
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
        privilege.ensure().unwrap();
        assert!(privilege.apply_to_current_thread().is_ok());
    }

    fn current_thread_caps() -> CapabilitySets {
        let status = std::fs::read_to_string("/proc/thread-self/status").unwrap();
        CapabilitySets::parse(&status).unwrap()
    }

    #[test]
    fn test_ensure_permitted_leaves_thread_untouched() {
        let file = fixture(PERMITTED_ONLY_STATUS);
        let privilege = ShutdownPrivilege::new(file.path());
        assert_eq!(privilege.status_path(), file.path());

        let before = current_thread_caps();
        privilege.ensure().unwrap();
        assert!(privilege.is_acquired());
        assert_eq!(current_thread_caps(), before);
    }

    #[test]
    fn test_apply_before_ensure_fails() {
        let privilege = ShutdownPrivilege::new("/proc/self/status");
        assert!(privilege.apply_to_current_thread().is_err());
    }
}
