use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU time limit in seconds (rounded up to whole seconds for RLIMIT_CPU)
    #[serde(default)]
    pub time_limit: Option<f64>,

    /// Wall clock time limit in seconds
    #[serde(default)]
    pub wall_time_limit: Option<f64>,

    /// Address space limit in kilobytes
    #[serde(default)]
    pub memory_limit: Option<u64>,

    /// Maximum open file descriptors
    #[serde(default)]
    pub max_open_files: Option<u64>,

    /// Maximum captured size of each of stdout and stderr in kilobytes
    #[serde(default)]
    pub max_output: Option<u64>,
}

impl ResourceLimits {
    /// 1 megabyte in kilobytes
    pub const MB: u64 = 1024;

    /// Limits with every field unset (nothing enforced)
    pub fn unlimited() -> Self {
        Self {
            time_limit: None,
            wall_time_limit: None,
            memory_limit: None,
            max_open_files: None,
            max_output: None,
        }
    }

    /// Set the CPU time limit in seconds
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// Set the wall clock time limit in seconds
    pub fn with_wall_time_limit(mut self, seconds: f64) -> Self {
        self.wall_time_limit = Some(seconds);
        self
    }

    /// Set the memory limit in kilobytes
    pub fn with_memory_limit(mut self, kb: u64) -> Self {
        self.memory_limit = Some(kb);
        self
    }

    /// Set the open file descriptor limit
    pub fn with_max_open_files(mut self, count: u64) -> Self {
        self.max_open_files = Some(count);
        self
    }

    /// Set the maximum captured output size in kilobytes
    pub fn with_max_output(mut self, kb: u64) -> Self {
        self.max_output = Some(kb);
        self
    }

    /// Apply overrides from another ResourceLimits, preferring values from `overrides`
    pub fn with_overrides(&self, overrides: &ResourceLimits) -> ResourceLimits {
        ResourceLimits {
            time_limit: overrides.time_limit.or(self.time_limit),
            wall_time_limit: overrides.wall_time_limit.or(self.wall_time_limit),
            memory_limit: overrides.memory_limit.or(self.memory_limit),
            max_open_files: overrides.max_open_files.or(self.max_open_files),
            max_output: overrides.max_output.or(self.max_output),
        }
    }

    /// CPU limit as whole seconds, never below one
    pub(crate) fn cpu_seconds(&self) -> Option<u64> {
        self.time_limit.map(|secs| (secs.ceil() as u64).max(1))
    }

    /// Memory limit in bytes
    pub(crate) fn memory_bytes(&self) -> Option<u64> {
        self.memory_limit.map(|kb| kb.saturating_mul(1024))
    }

    /// Output cap in bytes
    pub(crate) fn output_bytes(&self) -> Option<usize> {
        self.max_output
            .map(|kb| usize::try_from(kb.saturating_mul(1024)).unwrap_or(usize::MAX))
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            time_limit: Some(1.0),
            wall_time_limit: Some(5.0),
            memory_limit: Some(50 * Self::MB),
            max_open_files: Some(10),
            max_output: Some(8 * Self::MB),
        }
    }
}

/// Classification of a failed execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The compiler rejected the program or ran out of time
    CompileError,
    /// The program exited with a non-zero status or crashed
    RuntimeError,
    /// The wall clock or CPU budget ran out
    Timeout,
    /// The program exited cleanly but did not print `{"result": ...}`
    MalformedOutput,
    /// Something went wrong in the harness itself
    InternalError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::CompileError => "compile error",
            FailureKind::RuntimeError => "runtime error",
            FailureKind::Timeout => "timeout",
            FailureKind::MalformedOutput => "malformed output",
            FailureKind::InternalError => "internal error",
        };
        f.write_str(name)
    }
}

/// Result of executing one submission against one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The program returned a value
    Success { value: Value },
    /// The program could not produce a value
    Failure { kind: FailureKind, message: String },
}

impl ExecutionOutcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ExecutionOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    /// Failure kind, or `None` on success
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionOutcome::Success { .. } => None,
            ExecutionOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Returned value, or `None` on failure
    pub fn value(&self) -> Option<&Value> {
        match self {
            ExecutionOutcome::Success { value } => Some(value),
            ExecutionOutcome::Failure { .. } => None,
        }
    }
}

/// Verdict for one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestVerdict {
    Passed,
    Failed { actual: Value, expected: Value },
    Errored { kind: FailureKind, message: String },
}

impl TestVerdict {
    /// Judge an outcome against the expected value
    pub fn assemble(outcome: ExecutionOutcome, expected: &Value) -> Self {
        match outcome {
            ExecutionOutcome::Success { value } => {
                if crate::compare::values_equal(&value, expected) {
                    TestVerdict::Passed
                } else {
                    TestVerdict::Failed {
                        actual: value,
                        expected: expected.clone(),
                    }
                }
            }
            ExecutionOutcome::Failure { kind, message } => TestVerdict::Errored { kind, message },
        }
    }

    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, TestVerdict::Passed)
    }
}

/// One input and the value the submission should return for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default = "empty_input", alias = "input_data")]
    pub input: Value,
    #[serde(alias = "expected_output")]
    pub expected: Value,
}

fn empty_input() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Verdict for one test case along with the case itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub input: Value,
    pub expected: Value,
    pub verdict: TestVerdict,
}
