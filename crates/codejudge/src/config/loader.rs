//! Configuration file loading for codejudge
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{CODE_PLACEHOLDER, Config, ConfigError};
use crate::types::ResourceLimits;

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        validate_limits("default_limits", &self.default_limits)?;
        validate_limits("compile_limits", &self.compile_limits)?;

        for (id, lang) in &self.languages {
            if lang.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty name"
                )));
            }
            if lang.extension.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty extension"
                )));
            }
            if lang.run.command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty run command"
                )));
            }
            if let Some(ref compile) = lang.compile {
                if compile.command.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has empty compile command"
                    )));
                }
                if compile.output_name.is_empty() || compile.output_name.contains('/') {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has invalid output name '{}'",
                        compile.output_name
                    )));
                }
            }
            if let Some(ref limits) = lang.run.limits {
                validate_limits(&format!("languages.{id}.run.limits"), limits)?;
            }
            if let Some(limits) = lang.compile.as_ref().and_then(|c| c.limits.as_ref()) {
                validate_limits(&format!("languages.{id}.compile.limits"), limits)?;
            }
            for alias in &lang.aliases {
                let taken = self.languages.contains_key(alias)
                    || self
                        .languages
                        .iter()
                        .any(|(other, l)| other != id && l.aliases.contains(alias));
                if alias.is_empty() || taken {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has alias '{alias}' that is empty or already in use"
                    )));
                }
            }
            let markers = lang.wrapper.placeholder_count();
            if markers != 1 {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' wrapper must contain exactly one {CODE_PLACEHOLDER} marker, found {markers}"
                )));
            }
        }

        Ok(())
    }
}

/// Time limits must be positive and finite; counts must be non-zero
fn validate_limits(scope: &str, limits: &ResourceLimits) -> Result<(), ConfigError> {
    for (field, seconds) in [
        ("time_limit", limits.time_limit),
        ("wall_time_limit", limits.wall_time_limit),
    ] {
        if let Some(seconds) = seconds.filter(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(ConfigError::Invalid(format!(
                "{scope}.{field} must be a positive number of seconds, got {seconds}"
            )));
        }
    }
    for (field, value) in [
        ("memory_limit", limits.memory_limit),
        ("max_open_files", limits.max_open_files),
        ("max_output", limits.max_output),
    ] {
        if value == Some(0) {
            return Err(ConfigError::Invalid(format!("{scope}.{field} must not be zero")));
        }
    }
    Ok(())
}
