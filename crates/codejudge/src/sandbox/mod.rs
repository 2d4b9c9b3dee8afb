//! Resource-limited child processes
//!
//! Spawns compiler and program processes with limits applied inside the
//! child between `fork` and `exec`, so the harness process itself is never
//! constrained. Each child leads its own process group; the whole group is
//! killed when the wall clock runs out and again after the child exits, so
//! forked grandchildren never outlive a call. A descendant that leaves the
//! group with `setsid` can survive, but its copies of the output pipes are
//! abandoned shortly after the child is reaped.

use thiserror::Error;

pub use crate::sandbox::command::SandboxCommand;
pub use crate::sandbox::process::{ProcessOutput, run_limited};

mod command;
mod limits;
mod process;

/// Errors that occur while spawning or supervising a child process
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("command is empty")]
    EmptyCommand,

    #[error("failed to spawn process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("failed to wait for process: {0}")]
    WaitFailed(#[source] std::io::Error),

    #[error("failed to capture process output: {0}")]
    CaptureFailed(#[source] std::io::Error),

    #[error("invalid resource limit: {0}")]
    InvalidLimit(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
