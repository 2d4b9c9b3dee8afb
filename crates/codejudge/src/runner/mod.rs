//! Code runner for codejudge
//!
//! Drives one submission through materialize, compile, execute and decode
//! inside a throwaway workspace, and turns every failure into an
//! [`ExecutionOutcome`].

use std::sync::{Arc, LazyLock};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub use crate::runner::compile::compile;
pub use crate::runner::decode::decode_result;
pub use crate::runner::execute::execute as run_program;
pub use crate::runner::materialize::{materialize, render_source};

mod compile;
mod decode;
mod execute;
mod judge;
mod materialize;

use crate::{
    config::{Config, ConfigError},
    sandbox::SandboxError,
    types::{ExecutionOutcome, FailureKind, TestCase, TestReport},
    workspace::Workspace,
};

static DEFAULT_RUNNER: LazyLock<Runner> = LazyLock::new(Runner::with_defaults);

/// Errors raised by a pipeline stage
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    CompileFailed(String),

    #[error("compilation timed out after {0}s")]
    CompileTimeout(f64),

    #[error("{0}")]
    RuntimeFailed(String),

    #[error("execution timed out")]
    Timeout,

    #[error("{0}")]
    MalformedOutput(String),

    #[error("failed to encode input: {0}")]
    Input(#[source] serde_json::Error),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("execution task failed: {0}")]
    TaskFailed(String),
}

impl RunnerError {
    /// The failure category reported to callers
    pub fn kind(&self) -> FailureKind {
        match self {
            RunnerError::CompileFailed(_) | RunnerError::CompileTimeout(_) => {
                FailureKind::CompileError
            }
            RunnerError::RuntimeFailed(_) => FailureKind::RuntimeError,
            RunnerError::Timeout => FailureKind::Timeout,
            RunnerError::MalformedOutput(_) => FailureKind::MalformedOutput,
            RunnerError::Config(_)
            | RunnerError::Input(_)
            | RunnerError::Sandbox(_)
            | RunnerError::TaskFailed(_) => FailureKind::InternalError,
        }
    }
}

impl From<RunnerError> for ExecutionOutcome {
    fn from(err: RunnerError) -> Self {
        let kind = err.kind();
        let message = match err {
            RunnerError::CompileFailed(stderr) | RunnerError::RuntimeFailed(stderr) => stderr,
            other => other.to_string(),
        };
        ExecutionOutcome::Failure { kind, message }
    }
}

/// High-level runner for code execution
///
/// Cheap to clone; the configuration is shared read-only between clones and
/// between concurrent executions.
#[derive(Debug, Clone)]
pub struct Runner {
    config: Arc<Config>,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `code` written in `language` against one input
    ///
    /// Never fails: every problem, including a panic in the pipeline, comes
    /// back as [`ExecutionOutcome::Failure`]. The workspace is gone by the
    /// time this returns.
    #[instrument(skip(self, code, input))]
    pub async fn execute(&self, code: &str, language: &str, input: &Value) -> ExecutionOutcome {
        let config = Arc::clone(&self.config);
        let code = code.to_owned();
        let language = language.to_owned();
        let input = input.clone();

        let task = tokio::spawn(async move { run_pipeline(&config, &code, &language, &input).await });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "execution task did not complete");
                Err(RunnerError::TaskFailed(e.to_string()))
            }
        };

        match result {
            Ok(value) => ExecutionOutcome::Success { value },
            Err(err) => {
                debug!(kind = %err.kind(), "execution failed");
                err.into()
            }
        }
    }

    /// Run `code` against every test case in order
    pub async fn judge(&self, code: &str, language: &str, cases: &[TestCase]) -> Vec<TestReport> {
        judge::judge(self, code, language, cases).await
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Execute with the embedded default configuration
pub async fn execute(code: &str, language: &str, input: &Value) -> ExecutionOutcome {
    DEFAULT_RUNNER.execute(code, language, input).await
}

/// Judge with the embedded default configuration
pub async fn judge(code: &str, language: &str, cases: &[TestCase]) -> Vec<TestReport> {
    DEFAULT_RUNNER.judge(code, language, cases).await
}

async fn run_pipeline(
    config: &Config,
    code: &str,
    language_id: &str,
    input: &Value,
) -> Result<Value, RunnerError> {
    let language = config.get_language(language_id)?;
    let workspace = Workspace::create(config.workspace_root.as_deref())?;

    let result = async {
        let source = materialize(&workspace, language, code).await?;
        let artifact = compile(&workspace, config, language, &source).await?;
        let stdout =
            run_program(&workspace, config, language, &source, artifact.as_deref(), input).await?;
        decode_result(&stdout)
    }
    .await;

    workspace.close();
    result
}
