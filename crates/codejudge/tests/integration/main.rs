//! Integration tests for codejudge
//!
//! Most tests drive the full pipeline with the `/bin/sh` recipes in
//! `tests/fixtures/configs/shell.toml` and run anywhere with a POSIX shell.
//! Tests against the real toolchains (python3, node, g++, javac) need those
//! installed and only run with:
//!   cargo test -p codejudge --features integration-tests

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use codejudge::{Config, Runner};
use tempfile::TempDir;

mod concurrency;
mod execution;
#[cfg(feature = "integration-tests")]
mod toolchains;
mod workspace_lifecycle;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Helper to get fixture config path
pub(crate) fn fixture_config(name: &str) -> String {
    format!("{FIXTURES_PATH}/configs/{name}")
}

/// A runner whose workspaces all land in a private directory
pub(crate) struct TestEnv {
    pub runner: Runner,
    root: TempDir,
    scratch: TempDir,
}

impl TestEnv {
    /// Runner over the shell recipes
    pub fn shell() -> Self {
        Self::shell_with(|_| {})
    }

    /// Runner over the shell recipes with adjusted config
    pub fn shell_with(adjust: impl FnOnce(&mut Config)) -> Self {
        let scratch = TempDir::new().expect("Failed to create scratch dir");
        let path = fixture_config("shell.toml");
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
            .replace("@SCRATCH@", &scratch.path().to_string_lossy());
        let config = Config::parse_toml(&text).expect("shell fixture should be valid");
        Self::from_config(config, scratch, adjust)
    }

    /// Runner over the embedded default languages
    #[cfg(feature = "integration-tests")]
    pub fn defaults() -> Self {
        let scratch = TempDir::new().expect("Failed to create scratch dir");
        Self::from_config(Config::default(), scratch, |_| {})
    }

    fn from_config(mut config: Config, scratch: TempDir, adjust: impl FnOnce(&mut Config)) -> Self {
        let root = TempDir::new().expect("Failed to create workspace root");
        config.workspace_root = Some(root.path().to_path_buf());
        adjust(&mut config);
        Self {
            runner: Runner::new(config),
            root,
            scratch,
        }
    }

    /// Path to a file that survives the execution
    pub fn scratch_file(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }

    /// Panics if any workspace is left under the root
    pub fn assert_no_workspaces(&self) {
        let leftovers: Vec<_> = fs::read_dir(self.root.path())
            .expect("workspace root should exist")
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .collect();
        assert!(leftovers.is_empty(), "workspaces left behind: {leftovers:?}");
    }
}

/// Whether a pid refers to a live, non-zombie process
pub(crate) fn process_alive(pid: u32) -> bool {
    let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // state is the first field after the parenthesised command name
    let state = stat
        .rfind(')')
        .and_then(|i| stat[i + 1..].trim_start().chars().next());
    !matches!(state, Some('Z' | 'X') | None)
}

/// Wait up to `timeout` for a process to go away
pub(crate) fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    !process_alive(pid)
}

/// Read a pid written by a test program
pub(crate) fn read_pid(path: &Path) -> u32 {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read pid file {}: {e}", path.display()))
        .trim()
        .parse()
        .expect("pid file should hold a number")
}

/// SIGKILL a process the sandbox could not reach
pub(crate) fn kill_pid(pid: u32) {
    if let Ok(raw) = i32::try_from(pid) {
        let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(raw), nix::sys::signal::Signal::SIGKILL);
    }
}
