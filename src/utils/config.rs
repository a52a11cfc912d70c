// src/utils/config.rs
//! Configuration loading
//!
//! Settings come from an optional `method-hooks.toml` file layered under
//! environment variables prefixed with `METHOD_HOOKS__`, e.g.
//! `METHOD_HOOKS__TIME_BOX__CANCEL_POLICY=abort`.

use crate::interception::plan::InterceptionSpec;
use crate::interception::time_box::CancelPolicy;
use crate::utils::errors::{HookError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_FILE: &str = "method-hooks";
const ENV_PREFIX: &str = "METHOD_HOOKS";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub time_box: TimeBoxSettings,
    pub logging: LoggingSettings,

    /// Declarative interceptions applied with `InterceptionRegistrar::apply_plan`
    pub interceptions: Vec<InterceptionSpec>,
}

impl HooksConfig {
    /// Load from `method-hooks.{toml,yaml,json}` in the working directory (if
    /// present) and the environment
    pub fn load() -> Result<Self> {
        Self::build(File::with_name(DEFAULT_FILE).required(false), ENV_PREFIX)
    }

    /// Load from an explicit file; the file must exist
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true), ENV_PREFIX)
    }

    fn build<S>(file: S, env_prefix: &str) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: HooksConfig = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(env_prefix).prefix_separator("__").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.time_box.default_limit()?;
        for spec in &self.interceptions {
            if spec.operations.is_empty() {
                return Err(HookError::ConfigError(format!(
                    "{} interception lists no operations",
                    spec.kind
                )));
            }
        }
        Ok(())
    }
}

/// Defaults for time-boxed operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBoxSettings {
    /// Limit used by plan entries that omit `limit_secs`
    pub default_limit_secs: f64,

    /// What happens to the abandoned call after expiry
    pub cancel_policy: CancelPolicy,
}

impl Default for TimeBoxSettings {
    fn default() -> Self {
        Self {
            default_limit_secs: 1.0,
            cancel_policy: CancelPolicy::Cooperative,
        }
    }
}

impl TimeBoxSettings {
    pub fn default_limit(&self) -> Result<Duration> {
        limit_from_secs(self.default_limit_secs)
    }
}

/// Converts fractional seconds into a usable limit
pub fn limit_from_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(HookError::ConfigError(format!(
            "time limit must be a positive number of seconds, got {}",
            secs
        )));
    }

    Duration::try_from_secs_f64(secs)
        .map_err(|e| HookError::ConfigError(format!("invalid time limit {}: {}", secs, e)))
}

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging settings consumed by `observability::init_tracing`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::InterceptionKind;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = HooksConfig::default();
        assert_eq!(config.time_box.default_limit().unwrap(), Duration::from_secs(1));
        assert_eq!(config.time_box.cancel_policy, CancelPolicy::Cooperative);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.interceptions.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[time_box]
default_limit_secs = 0.25
cancel_policy = "abort"

[logging]
filter = "method_hooks=debug"
format = "json"

[[interceptions]]
kind = "time_box"
operations = ["fetch", "store"]
limit_secs = 0.1
handler = "cached"

[[interceptions]]
kind = "rescue"
operations = ["fetch"]
handler = "empty"
"#,
        );

        let config = HooksConfig::from_file(file.path()).unwrap();

        assert_eq!(config.time_box.default_limit().unwrap(), Duration::from_millis(250));
        assert_eq!(config.time_box.cancel_policy, CancelPolicy::Abort);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.interceptions.len(), 2);
        assert_eq!(config.interceptions[0].kind, InterceptionKind::TimeBox);
        assert_eq!(config.interceptions[0].operations, vec!["fetch", "store"]);
        assert_eq!(config.interceptions[1].handler.as_deref(), Some("empty"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(HooksConfig::from_file("/nonexistent/method-hooks.toml").is_err());
    }

    #[test]
    fn test_rejects_bad_limits() {
        assert!(limit_from_secs(0.0).is_err());
        assert!(limit_from_secs(-1.5).is_err());
        assert!(limit_from_secs(f64::NAN).is_err());
        assert_eq!(limit_from_secs(0.5).unwrap(), Duration::from_millis(500));

        let file = write_config("[time_box]\ndefault_limit_secs = 0\n");
        assert!(matches!(
            HooksConfig::from_file(file.path()),
            Err(HookError::ConfigError(_))
        ));
    }

    #[test]
    fn test_environment_overrides_file() {
        // Private prefix; the process environment is shared with other tests
        let prefix = "METHOD_HOOKS_ENV_TEST";
        std::env::set_var(format!("{prefix}__TIME_BOX__CANCEL_POLICY"), "abort");
        std::env::set_var(format!("{prefix}__TIME_BOX__DEFAULT_LIMIT_SECS"), "0.5");

        let file = write_config("[time_box]\ndefault_limit_secs = 2.0\ncancel_policy = \"cooperative\"\n\n[logging]\nformat = \"json\"\n");
        let config = HooksConfig::build(File::from(file.path()).required(true), prefix).unwrap();

        assert_eq!(config.time_box.cancel_policy, CancelPolicy::Abort);
        assert_eq!(config.time_box.default_limit().unwrap(), Duration::from_millis(500));
        assert_eq!(config.logging.format, LogFormat::Json);

        std::env::remove_var(format!("{prefix}__TIME_BOX__CANCEL_POLICY"));
        std::env::remove_var(format!("{prefix}__TIME_BOX__DEFAULT_LIMIT_SECS"));
        assert_eq!(ENV_PREFIX, "METHOD_HOOKS");
    }

    #[test]
    fn test_rejects_empty_operations() {
        let file = write_config("[[interceptions]]\nkind = \"after\"\noperations = []\nhandler = \"x\"\n");
        assert!(HooksConfig::from_file(file.path()).is_err());
    }
}
