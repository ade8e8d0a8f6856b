//! CLI argument definitions for `vigil`.
//!
//! Shared by the runtime parser and the build script that renders the manual
//! page, so this file must not reference other crate modules.

use clap::{Parser, Subcommand, ValueEnum};

/// Output format selection for command results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    #[default]
    Auto,
    /// Always render human-readable output.
    Human,
    /// Always emit JSON.
    Json,
}

/// Controls services supervised by a local Monit daemon.
///
/// Configuration flags (`--monit-host`, `--log-filter`, ...) must precede the
/// subcommand.
#[derive(Parser, Debug)]
#[command(name = "vigil", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Controls how results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub(crate) output: OutputFormat,
    /// Operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations exposed by the supervisor client.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Asks the supervisor to start a service.
    Start {
        /// Service name as configured in the supervisor.
        name: String,
    },
    /// Unmonitors and stops a service, waiting for it to settle.
    Stop {
        /// Service name as configured in the supervisor.
        name: String,
    },
    /// Stops the supervisor from watching a service.
    Unmonitor {
        /// Service name as configured in the supervisor.
        name: String,
    },
    /// Prints every service and group the supervisor knows about.
    Status,
    /// Lists the members of a service group.
    Group {
        /// Group name, e.g. `vcap`.
        name: String,
    },
}
