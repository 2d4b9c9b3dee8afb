//! Limits applied inside the child before `exec`
//!
//! Everything here runs between `fork` and `exec`, so it must stay
//! async-signal-safe: no allocation, no locks, no logging.

use nix::sys::resource::{Resource, setrlimit};
use nix::unistd::{Pid, setpgid};

use crate::types::ResourceLimits;

/// Put the child in its own process group and apply its rlimits
pub(crate) fn apply_in_child(limits: &ChildLimits) -> std::io::Result<()> {
    setpgid(Pid::from_raw(0), Pid::from_raw(0))?;

    if let Some(secs) = limits.cpu_seconds {
        // SIGXCPU at the soft limit, SIGKILL one second later
        setrlimit(Resource::RLIMIT_CPU, secs, secs.saturating_add(1))?;
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    if let Some(bytes) = limits.memory_bytes {
        setrlimit(Resource::RLIMIT_AS, bytes, bytes)?;
    }

    if let Some(files) = limits.open_files {
        setrlimit(Resource::RLIMIT_NOFILE, files, files)?;
    }

    setrlimit(Resource::RLIMIT_CORE, 0, 0)?;

    Ok(())
}

/// Plain-integer form of [`ResourceLimits`] computed before forking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChildLimits {
    pub cpu_seconds: Option<u64>,
    pub memory_bytes: Option<u64>,
    pub open_files: Option<u64>,
}

impl From<&ResourceLimits> for ChildLimits {
    fn from(limits: &ResourceLimits) -> Self {
        Self {
            cpu_seconds: limits.cpu_seconds(),
            memory_bytes: limits.memory_bytes(),
            open_files: limits.max_open_files,
        }
    }
}
