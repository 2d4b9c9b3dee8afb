//! Command builder for sandboxed processes

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::process::Command;

use crate::sandbox::SandboxError;
use crate::types::ResourceLimits;

/// Builder for a resource-limited child process
///
/// The environment is cleared; only variables set through [`env`](Self::env)
/// reach the child.
#[derive(Debug, Clone)]
pub struct SandboxCommand {
    /// Program followed by its arguments
    command: Vec<String>,
    /// Working directory of the child
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
    limits: ResourceLimits,
}

impl SandboxCommand {
    /// Create a new builder with no command and no limits
    pub fn new() -> Self {
        Self {
            command: Vec::new(),
            working_dir: None,
            env: HashMap::new(),
            limits: ResourceLimits::unlimited(),
        }
    }

    /// Set the command to run (program first)
    pub fn command(mut self, cmd: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command = cmd.into_iter().map(Into::into).collect();
        self
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.push(arg.into());
        self
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables
    pub fn envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set resource limits
    pub fn limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Program and arguments
    pub fn args(&self) -> &[String] {
        &self.command
    }

    /// Resource limits that will be applied to the child
    pub fn resource_limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Build the tokio command (without limits; see `run_limited`)
    pub(crate) fn build(&self) -> Result<Command, SandboxError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(SandboxError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args).env_clear().envs(&self.env);
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }
}

impl Default for SandboxCommand {
    fn default() -> Self {
        Self::new()
    }
}
