use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub use crate::config::language::{
    CODE_PLACEHOLDER, CompileConfig, DEFAULT_SANDBOX_PATH, FileExtension, Language, RunConfig,
    SOURCE_STEM, WrapperConfig,
};
use crate::types::ResourceLimits;

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Provides the default language registry; library users can also write it
/// out as a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../codejudge.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for codejudge
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Parent directory for per-execution workspaces (system temp dir if unset)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Resource limits applied to every program run
    #[serde(default, deserialize_with = "run_limits_over_builtin")]
    pub default_limits: ResourceLimits,

    /// Resource limits applied to every compiler run
    #[serde(
        default = "default_compile_limits",
        deserialize_with = "compile_limits_over_builtin"
    )]
    pub compile_limits: ResourceLimits,

    /// Language configurations keyed by language ID
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            workspace_root: None,
            default_limits: ResourceLimits::default(),
            compile_limits: default_compile_limits(),
            languages: HashMap::new(),
        }
    }

    /// Look up a language recipe by ID or by one of its aliases
    pub fn get_language(&self, id: &str) -> Result<&Language, ConfigError> {
        self.languages
            .get(id)
            .or_else(|| {
                self.languages
                    .values()
                    .find(|lang| lang.aliases.iter().any(|alias| alias == id))
            })
            .ok_or_else(|| ConfigError::UnsupportedLanguage(id.to_string()))
    }

    /// Registered language IDs in sorted order
    pub fn language_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.languages.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Limits for running a program of `language`
    pub fn run_limits(&self, language: &Language) -> ResourceLimits {
        match language.run.limits {
            Some(ref overrides) => self.default_limits.with_overrides(overrides),
            None => self.default_limits.clone(),
        }
    }

    /// Limits for compiling a program of `language`
    pub fn compile_limits_for(&self, language: &Language) -> ResourceLimits {
        match language.compile.as_ref().and_then(|c| c.limits.as_ref()) {
            Some(overrides) => self.compile_limits.with_overrides(overrides),
            None => self.compile_limits.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

/// Compilers get a wall clock budget but no CPU, memory or fd ceiling
fn default_compile_limits() -> ResourceLimits {
    ResourceLimits {
        wall_time_limit: Some(10.0),
        max_output: Some(ResourceLimits::MB),
        ..ResourceLimits::unlimited()
    }
}

/// Fields missing from `[default_limits]` keep their built-in values
fn run_limits_over_builtin<'de, D>(deserializer: D) -> Result<ResourceLimits, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = ResourceLimits::deserialize(deserializer)?;
    Ok(ResourceLimits::default().with_overrides(&overrides))
}

/// Fields missing from `[compile_limits]` keep their built-in values
fn compile_limits_over_builtin<'de, D>(deserializer: D) -> Result<ResourceLimits, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = ResourceLimits::deserialize(deserializer)?;
    Ok(default_compile_limits().with_overrides(&overrides))
}
