use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RunError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Include the memory-dump collector.
    #[serde(default = "default_true")]
    pub capture_memory: bool,

    /// Include the browser-history collector.
    #[serde(default = "default_true")]
    pub capture_browser: bool,

    /// Run the dependency supervisor before capture.
    #[serde(default)]
    pub install_tools: bool,

    /// Overall run deadline in seconds.
    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: u64,

    /// Row cap for the process report.
    #[serde(default = "default_max_processes")]
    pub max_processes: usize,

    /// Row cap for the network report.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Worker pool size for capture tasks. 1 means strictly sequential,
    /// which is the default; exclusive tasks never share the pool.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_true() -> bool {
    true
}

fn default_execution_timeout_secs() -> u64 {
    600
}

fn default_max_processes() -> usize {
    100
}

fn default_max_connections() -> usize {
    50
}

fn default_max_workers() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture_memory: true,
            capture_browser: true,
            install_tools: false,
            execution_timeout_secs: default_execution_timeout_secs(),
            max_processes: default_max_processes(),
            max_connections: default_max_connections(),
            max_workers: default_max_workers(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.execution_timeout_secs == 0 {
            return Err(RunError::Config(
                "execution_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.max_workers == 0 {
            return Err(RunError::Config("max_workers must be at least 1".into()));
        }
        if self.max_processes == 0 || self.max_connections == 0 {
            return Err(RunError::Config(
                "row caps (max_processes, max_connections) must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter directive, e.g. "info" or "bitprobe_core=debug".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also mirror log lines to stdout.
    #[serde(default = "default_true")]
    pub stdout: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert!(config.capture_memory);
        assert!(config.capture_browser);
        assert!(!config.install_tools);
        assert_eq!(config.execution_timeout(), Duration::from_secs(600));
        assert_eq!(config.max_processes, 100);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.max_workers, 1);
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let config = Config {
            execution_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_field_defaults() {
        let config: Config = toml::from_str("install_tools = true\nmax_processes = 10\n").unwrap();
        assert!(config.install_tools);
        assert_eq!(config.max_processes, 10);
        assert_eq!(config.max_connections, 50);
        assert!(config.capture_memory);
    }
}
