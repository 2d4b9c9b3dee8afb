//! Process spawning and output capture

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};

use crate::sandbox::SandboxError;
use crate::sandbox::command::SandboxCommand;
use crate::sandbox::limits::{ChildLimits, apply_in_child};

/// Everything observed about one finished child process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code if the process exited normally
    pub exit_code: Option<i32>,

    /// Signal number if the process was killed by a signal
    pub signal: Option<i32>,

    /// Whether the wall clock limit ran out and the group was killed
    pub timed_out: bool,

    /// Wall clock time in seconds
    pub wall_time: f64,

    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,

    /// Whether stdout went over the output cap
    pub stdout_truncated: bool,

    /// Whether stderr went over the output cap
    pub stderr_truncated: bool,
}

impl ProcessOutput {
    /// Exited on its own with status 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Killed by the kernel for running over RLIMIT_CPU
    ///
    /// The soft limit delivers SIGXCPU and the hard limit SIGKILL. The
    /// harness only sends SIGKILL itself on wall clock timeout, which is
    /// already reported through `timed_out`.
    #[must_use]
    pub fn cpu_limit_exceeded(&self) -> bool {
        matches!(self.signal, Some(sig) if sig == Signal::SIGXCPU as i32 || sig == Signal::SIGKILL as i32)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Short human-readable description of how the process ended
    pub fn describe_exit(&self) -> String {
        if self.timed_out {
            return format!("killed after {:.1}s wall time", self.wall_time);
        }
        match (self.exit_code, self.signal) {
            (Some(code), _) => format!("exited with code {code}"),
            (None, Some(sig)) => match Signal::try_from(sig) {
                Ok(signal) => format!("killed by signal {sig} ({})", signal.as_str()),
                Err(_) => format!("killed by signal {sig}"),
            },
            (None, None) => "terminated abnormally".to_owned(),
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code(),
            signal: status.signal(),
            ..Default::default()
        }
    }
}

/// How long the pipe readers may keep going once the child has been reaped
///
/// Only a descendant that escaped the process group can still hold the
/// pipes open by then.
const PIPE_GRACE: Duration = Duration::from_millis(250);

/// Bytes read from one output pipe
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Run a command with its resource limits and wall clock timeout
///
/// The child becomes leader of a new process group and receives its rlimits
/// in a pre-exec hook. On timeout the whole group gets SIGKILL. After the
/// child is reaped the group is killed again so no stray descendant keeps
/// running or holds the output pipes open. The pipes are then read for at
/// most 250 ms longer, keeping whatever was captured.
#[instrument(skip(command), fields(program = command.args().first().map(String::as_str).unwrap_or("")))]
pub async fn run_limited(command: SandboxCommand) -> Result<ProcessOutput, SandboxError> {
    let limits = command.resource_limits().clone();
    let child_limits = ChildLimits::from(&limits);
    let wall_limit = limits
        .wall_time_limit
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .map_err(|_| SandboxError::InvalidLimit(format!("wall_time_limit = {secs}")))
        })
        .transpose()?;
    let output_cap = limits.output_bytes().unwrap_or(usize::MAX);

    let mut cmd = command.build()?;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // SAFETY: the hook only calls setpgid and setrlimit, which are
    // async-signal-safe, and touches no heap memory.
    unsafe {
        cmd.pre_exec(move || apply_in_child(&child_limits));
    }

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(SandboxError::SpawnFailed)?;
    let group = child
        .id()
        .and_then(|id| i32::try_from(id).ok())
        .map(Pid::from_raw);

    debug!(pid = ?group, ?wall_limit, "process spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut stdout_captured = Captured::default();
    let mut stderr_captured = Captured::default();
    let (reaped_tx, reaped_rx) = oneshot::channel::<()>();

    let wait = async {
        let status = match wall_limit {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => Some(status.map_err(SandboxError::WaitFailed)?),
                Err(_) => None,
            },
            None => Some(child.wait().await.map_err(SandboxError::WaitFailed)?),
        };

        let (status, timed_out) = match status {
            Some(status) => (status, false),
            None => {
                debug!("wall time limit exceeded, killing process group");
                kill_group(group);
                (child.wait().await.map_err(SandboxError::WaitFailed)?, true)
            }
        };

        kill_group(group);
        let _ = reaped_tx.send(());
        Ok::<_, SandboxError>((status, timed_out))
    };

    let capture = async {
        let reads = async {
            tokio::try_join!(
                read_capped(stdout, output_cap, &mut stdout_captured),
                read_capped(stderr, output_cap, &mut stderr_captured),
            )
        };
        let grace = async {
            // a dropped sender means the wait failed and try_join bails anyway
            let _ = reaped_rx.await;
            tokio::time::sleep(PIPE_GRACE).await;
        };

        tokio::select! {
            result = reads => result.map(|_| ()),
            () = grace => {
                warn!("output pipes still open after the process exited, abandoning them");
                Ok(())
            }
        }
    };

    let ((status, timed_out), ()) = tokio::try_join!(wait, capture)?;

    let output = ProcessOutput {
        timed_out,
        wall_time: start.elapsed().as_secs_f64(),
        stdout: stdout_captured.bytes,
        stderr: stderr_captured.bytes,
        stdout_truncated: stdout_captured.truncated,
        stderr_truncated: stderr_captured.truncated,
        ..ProcessOutput::from_status(status)
    };

    debug!(
        exit_code = ?output.exit_code,
        signal = ?output.signal,
        timed_out,
        wall_time = output.wall_time,
        "process finished"
    );

    Ok(output)
}

/// SIGKILL every process in the group led by `group`
fn kill_group(group: Option<Pid>) {
    let Some(group) = group else {
        return;
    };
    match killpg(group, Signal::SIGKILL) {
        Ok(()) => debug!(%group, "killed process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(%group, error = %e, "failed to kill process group"),
    }
}

/// Read a pipe to EOF into `out`, keeping at most `cap` bytes
///
/// Bytes land in `out` as they arrive, so a read abandoned part way keeps
/// what it had.
async fn read_capped<R>(reader: Option<R>, cap: usize, out: &mut Captured) -> Result<(), SandboxError>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(());
    };

    let mut chunk = [0u8; 8192];
    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(SandboxError::CaptureFailed)?;
        if n == 0 {
            return Ok(());
        }
        let room = cap.saturating_sub(out.bytes.len());
        out.bytes.extend_from_slice(&chunk[..n.min(room)]);
        if n > room {
            out.truncated = true;
        }
    }
}
