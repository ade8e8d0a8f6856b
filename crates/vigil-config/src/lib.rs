//! Shared configuration for the vigil supervisor client.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional configuration file (`--config-path` or `VIGIL_CONFIG_PATH`), then
//! `VIGIL_*` environment variables, and finally command-line flags.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_LONG_TIMEOUT_MS, DEFAULT_MONIT_HOST, DEFAULT_MONIT_USER,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SHORT_TIMEOUT_MS, DEFAULT_STOP_TIMEOUT_MS,
    default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for talking to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "VIGIL")]
pub struct Config {
    /// `host[:port]` of the supervisor's HTTP interface.
    #[serde(default = "defaults::default_monit_host_string")]
    #[ortho_config(default = defaults::default_monit_host_string())]
    pub monit_host: String,
    /// Username for HTTP basic authentication.
    #[serde(default = "defaults::default_monit_user_string")]
    #[ortho_config(default = defaults::default_monit_user_string())]
    pub monit_user: String,
    /// Password for HTTP basic authentication.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub monit_password: String,
    /// Request timeout for calls expected to return quickly (start, status).
    #[serde(default = "defaults::default_short_timeout_ms")]
    #[ortho_config(default = defaults::DEFAULT_SHORT_TIMEOUT_MS)]
    pub short_timeout_ms: u64,
    /// Request timeout for calls that may run supervisor-side scripts
    /// (stop, unmonitor).
    #[serde(default = "defaults::default_long_timeout_ms")]
    #[ortho_config(default = defaults::DEFAULT_LONG_TIMEOUT_MS)]
    pub long_timeout_ms: u64,
    /// Delay between status polls while waiting for a stop to settle.
    #[serde(default = "defaults::default_poll_interval_ms")]
    #[ortho_config(default = defaults::DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,
    /// Upper bound on the time spent waiting for a stop to settle.
    #[serde(default = "defaults::default_stop_timeout_ms")]
    #[ortho_config(default = defaults::DEFAULT_STOP_TIMEOUT_MS)]
    pub stop_timeout_ms: u64,
    /// `tracing` filter directive applied by the binaries.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the log stream.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monit_host: defaults::default_monit_host_string(),
            monit_user: defaults::default_monit_user_string(),
            monit_password: String::new(),
            short_timeout_ms: DEFAULT_SHORT_TIMEOUT_MS,
            long_timeout_ms: DEFAULT_LONG_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            log_filter: defaults::default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Supervisor `host[:port]`.
    #[must_use]
    pub fn monit_host(&self) -> &str {
        self.monit_host.as_str()
    }

    /// Basic-auth username.
    #[must_use]
    pub fn monit_user(&self) -> &str {
        self.monit_user.as_str()
    }

    /// Basic-auth password.
    #[must_use]
    pub fn monit_password(&self) -> &str {
        self.monit_password.as_str()
    }

    /// Timeout budget of the responsive transport.
    #[must_use]
    pub const fn short_timeout(&self) -> Duration {
        Duration::from_millis(self.short_timeout_ms)
    }

    /// Timeout budget of the patient transport.
    #[must_use]
    pub const fn long_timeout(&self) -> Duration {
        Duration::from_millis(self.long_timeout_ms)
    }

    /// Interval between stop-completion polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Ceiling on the stop-completion wait.
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Rejects values that would make the client unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the host is blank or a timeout budget or
    /// the poll interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monit_host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        let budgets = [
            ("short_timeout_ms", self.short_timeout_ms),
            ("long_timeout_ms", self.long_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("stop_timeout_ms", self.stop_timeout_ms),
        ];
        for (field, value) in budgets {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout { field });
            }
        }
        Ok(())
    }
}

/// Semantic configuration errors detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `monit_host` is empty or whitespace.
    #[error("monit_host must not be empty")]
    EmptyHost,
    /// A timeout budget or the poll interval was configured as zero.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// Name of the offending setting.
        field: &'static str,
    },
}
