//! Execution step for code running
//!
//! Runs the compiled artifact or interpreted source with the JSON input as
//! its only extra argument.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::{Config, Language};
use crate::runner::RunnerError;
use crate::sandbox::{ProcessOutput, SandboxCommand, run_limited};
use crate::workspace::Workspace;

/// Run a program in its workspace and return its stdout
#[instrument(skip(workspace, config, language, input), fields(language = %language.name))]
pub async fn execute(
    workspace: &Workspace,
    config: &Config,
    language: &Language,
    source: &Path,
    artifact: Option<&Path>,
    input: &Value,
) -> Result<String, RunnerError> {
    let limits = config.run_limits(language);
    let max_output = limits.max_output;

    let source = source.to_string_lossy();
    let binary = artifact.map_or_else(|| source.clone(), |path| path.to_string_lossy());
    let run_cmd = Language::expand_command(&language.run.command, &source, &binary);
    let input_arg = serde_json::to_string(input).map_err(RunnerError::Input)?;

    debug!(?run_cmd, "executing program");

    let command = SandboxCommand::new()
        .command(run_cmd)
        .arg(input_arg)
        .working_dir(workspace.path())
        .env("PATH", &language.run.path)
        .envs(language.run.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .limits(limits);

    let output = run_limited(command).await?;

    debug!(
        exit_code = ?output.exit_code,
        signal = ?output.signal,
        timed_out = output.timed_out,
        wall_time = output.wall_time,
        "execution complete"
    );

    if output.timed_out || output.cpu_limit_exceeded() {
        return Err(RunnerError::Timeout);
    }
    if !output.is_success() {
        return Err(RunnerError::RuntimeFailed(runtime_diagnostics(&output)));
    }
    if output.stdout_truncated {
        return Err(RunnerError::MalformedOutput(format!(
            "output exceeded {} KB",
            max_output.unwrap_or_default()
        )));
    }

    Ok(output.stdout_lossy())
}

/// Program stderr verbatim, or the exit status if stderr is empty
fn runtime_diagnostics(output: &ProcessOutput) -> String {
    if output.stderr.is_empty() {
        format!("process {}", output.describe_exit())
    } else {
        output.stderr_lossy()
    }
}
