//! Configuration management for livecheck
//!
//! This module handles loading and validating configuration from environment
//! variables, TOML files, and command-line arguments. A `Config` is immutable
//! for the duration of one run; validation happens once, before any probe is
//! admitted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::probe::outcome::StatusFilter;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Probe engine configuration
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Probe engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Rate limit (probe admissions per second)
    pub rate_limit: u32,

    /// Maximum number of concurrent in-flight probes
    pub max_concurrent: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,

    /// Status class filter, e.g. `2xx,3xx`
    pub only: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            rate_limit: 10,
            max_concurrent: 50,
            request_timeout_secs: 10,
            user_agent: format!("livecheck/{}", env!("CARGO_PKG_VERSION")),
            only: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base name for output artifacts
    pub base: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base: PathBuf::from("status"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A variable that is set but does not parse is a configuration error,
    /// not a silent fallback to the default.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(rate) = env_parse::<u32>("LIVECHECK_RATE_LIMIT")? {
            config.probe.rate_limit = rate;
        }

        if let Some(max) = env_parse::<usize>("LIVECHECK_MAX_CONCURRENT")? {
            config.probe.max_concurrent = max;
        }

        if let Some(timeout) = env_parse::<u64>("LIVECHECK_REQUEST_TIMEOUT")? {
            config.probe.request_timeout_secs = timeout;
        }

        if let Ok(user_agent) = std::env::var("LIVECHECK_USER_AGENT") {
            config.probe.user_agent = user_agent;
        }

        if let Ok(base) = std::env::var("LIVECHECK_OUTPUT") {
            config.output.base = base.into();
        }

        if let Ok(level) = std::env::var("LIVECHECK_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("LIVECHECK_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Called once before probing begins; a run never starts with a
    /// partially applied configuration.
    pub fn validate(&self) -> Result<()> {
        if self.probe.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.probe.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be greater than 0");
        }

        if self.probe.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        // Surface filter parse errors here rather than mid-run.
        self.status_filter()?;

        Ok(())
    }

    /// Get the request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.request_timeout_secs)
    }

    /// Get the pacing period between probe admissions
    pub fn admission_period(&self) -> Duration {
        Duration::from_secs(1) / self.probe.rate_limit.max(1)
    }

    /// Parse the configured status-class filter, if any
    pub fn status_filter(&self) -> Result<Option<StatusFilter>> {
        match &self.probe.only {
            Some(only) => {
                let filter = only
                    .parse::<StatusFilter>()
                    .with_context(|| format!("Invalid status filter: {only:?}"))?;
                Ok(Some(filter))
            }
            None => Ok(None),
        }
    }
}

/// Read and parse an environment variable, erroring on a malformed value
fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => {
            let parsed = value
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("Invalid value for {name}: {value:?}"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe.rate_limit, 10);
        assert_eq!(config.probe.max_concurrent, 50);
        assert_eq!(config.output.base, PathBuf::from("status"));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let mut config = Config::default();
        config.probe.rate_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut config = Config::default();
        config.probe.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_filter_is_rejected() {
        let mut config = Config::default();
        config.probe.only = Some(String::from("2xx,bogus"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_filter_parses() {
        let mut config = Config::default();
        config.probe.only = Some(String::from("2xx,3xx"));
        let filter = config.status_filter().unwrap().unwrap();
        assert!(filter.matches(200));
        assert!(filter.matches(301));
        assert!(!filter.matches(404));
    }

    #[test]
    fn test_admission_period() {
        let mut config = Config::default();
        config.probe.rate_limit = 4;
        assert_eq!(config.admission_period(), Duration::from_millis(250));
    }

    #[test]
    fn test_env_parse_rejects_malformed_values() {
        // Unique variable names keep this test independent of any other
        // test reading the process environment.
        std::env::set_var("LIVECHECK_TEST_BAD_RATE", "abc");
        let result = env_parse::<u32>("LIVECHECK_TEST_BAD_RATE");
        assert!(result.is_err());
        std::env::remove_var("LIVECHECK_TEST_BAD_RATE");

        std::env::set_var("LIVECHECK_TEST_GOOD_RATE", "25");
        let parsed = env_parse::<u32>("LIVECHECK_TEST_GOOD_RATE").unwrap();
        assert_eq!(parsed, Some(25));
        std::env::remove_var("LIVECHECK_TEST_GOOD_RATE");

        assert_eq!(env_parse::<u32>("LIVECHECK_TEST_UNSET").unwrap(), None);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            [probe]
            rate_limit = 5
            max_concurrent = 8
            request_timeout_secs = 3
            user_agent = "livecheck-test"
            only = "2xx"

            [output]
            base = "live"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.probe.rate_limit, 5);
        assert_eq!(config.probe.max_concurrent, 8);
        assert_eq!(config.output.base, PathBuf::from("live"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_partial_toml() {
        let config: Config = toml::from_str("[probe]\nrate_limit = 2\n").unwrap();
        assert_eq!(config.probe.rate_limit, 2);
        assert_eq!(config.probe.max_concurrent, 50);
        assert_eq!(config.logging.level, "info");
    }
}
