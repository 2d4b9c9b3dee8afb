//! A library for judging untrusted code submissions.
//!
//! codejudge takes a snippet of code, wraps it in a language-specific
//! template, compiles it when the language needs it, runs it once per input
//! with child-only resource limits, and decodes the single JSON result the
//! program prints.
//!
//! # Features
//!
//! - **Multi-language**: Python, JavaScript, C++ and Java recipes ship in the
//!   embedded configuration; more can be added in TOML.
//! - **Resource limits**: CPU time, address space, open files and a wall
//!   clock, applied to the child between fork and exec.
//! - **Clean teardown**: every run gets its own temporary workspace and
//!   process group, and both are gone when the call returns.
//! - **Structured outcomes**: every failure is returned as data with a
//!   [`FailureKind`], never as a panic.
//!
//! ```no_run
//! # async fn demo() {
//! use serde_json::json;
//!
//! let outcome = codejudge::execute("return input_data", "python3", &json!({"a": 1})).await;
//! assert!(outcome.is_success());
//! # }
//! ```

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Language};
pub use runner::{Runner, RunnerError, execute, judge};
pub use sandbox::SandboxError;
pub use types::{
    ExecutionOutcome, FailureKind, ResourceLimits, TestCase, TestReport, TestVerdict,
};
pub use workspace::Workspace;

pub mod compare;
pub mod config;
pub mod runner;
pub mod sandbox;
pub mod types;
pub mod workspace;
