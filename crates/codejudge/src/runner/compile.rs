//! Compilation step for code execution
//!
//! Handles compiling source code using language-specific compilers.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::config::language::DEFAULT_SANDBOX_PATH;
use crate::config::{Config, Language};
use crate::runner::RunnerError;
use crate::sandbox::{ProcessOutput, SandboxCommand, run_limited};
use crate::workspace::Workspace;

/// Compile the materialized source in a workspace
///
/// Returns the artifact path, or `None` for interpreted languages (no-op).
#[instrument(skip(workspace, config, language), fields(language = %language.name))]
pub async fn compile(
    workspace: &Workspace,
    config: &Config,
    language: &Language,
    source: &Path,
) -> Result<Option<PathBuf>, RunnerError> {
    let Some(ref compile_config) = language.compile else {
        return Ok(None);
    };

    let artifact = workspace.file_path(&compile_config.output_name)?;
    let limits = config.compile_limits_for(language);
    let wall_limit = limits.wall_time_limit;

    let expanded_cmd = Language::expand_command(
        &compile_config.command,
        &source.to_string_lossy(),
        &artifact.to_string_lossy(),
    );

    debug!(?expanded_cmd, "compiling");

    let command = SandboxCommand::new()
        .command(expanded_cmd)
        .working_dir(workspace.path())
        .env("PATH", DEFAULT_SANDBOX_PATH)
        .envs(compile_config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .limits(limits);

    let output = run_limited(command).await?;

    debug!(
        exit_code = ?output.exit_code,
        signal = ?output.signal,
        timed_out = output.timed_out,
        wall_time = output.wall_time,
        "compilation complete"
    );

    if output.timed_out {
        return Err(RunnerError::CompileTimeout(wall_limit.unwrap_or(output.wall_time)));
    }
    if !output.is_success() {
        return Err(RunnerError::CompileFailed(compiler_diagnostics(&output)));
    }

    Ok(Some(artifact))
}

/// Compiler stderr verbatim, falling back to stdout, then to the exit status
fn compiler_diagnostics(output: &ProcessOutput) -> String {
    if !output.stderr.is_empty() {
        output.stderr_lossy()
    } else if !output.stdout.is_empty() {
        output.stdout_lossy()
    } else {
        format!("compiler {}", output.describe_exit())
    }
}
