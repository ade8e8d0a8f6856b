use crate::logging::LogFormat;

/// Address of the supervisor's HTTP interface on a stock agent host.
pub const DEFAULT_MONIT_HOST: &str = "127.0.0.1:2822";

/// Basic-auth user provisioned for the agent.
pub const DEFAULT_MONIT_USER: &str = "vcap";

/// Request budget for start and status calls.
pub const DEFAULT_SHORT_TIMEOUT_MS: u64 = 5_000;

/// Request budget for stop and unmonitor calls, which may run stop scripts.
pub const DEFAULT_LONG_TIMEOUT_MS: u64 = 300_000;

/// Delay between stop-completion polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Ceiling on the stop-completion wait.
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 300_000;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

pub(crate) fn default_monit_host_string() -> String {
    DEFAULT_MONIT_HOST.to_owned()
}

pub(crate) fn default_monit_user_string() -> String {
    DEFAULT_MONIT_USER.to_owned()
}

pub(crate) const fn default_short_timeout_ms() -> u64 {
    DEFAULT_SHORT_TIMEOUT_MS
}

pub(crate) const fn default_long_timeout_ms() -> u64 {
    DEFAULT_LONG_TIMEOUT_MS
}

pub(crate) const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

pub(crate) const fn default_stop_timeout_ms() -> u64 {
    DEFAULT_STOP_TIMEOUT_MS
}
