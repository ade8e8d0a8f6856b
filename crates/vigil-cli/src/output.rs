//! Rendering of command results.

use std::io::Write;

use serde::Serialize;
use vigil_monit::{Action, Status};

use crate::cli::OutputFormat;
use crate::errors::AppError;

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ResolvedOutputFormat {
    Human,
    Json,
}

pub(crate) const fn resolve(format: OutputFormat, stdout_is_terminal: bool) -> ResolvedOutputFormat {
    match format {
        OutputFormat::Auto if stdout_is_terminal => ResolvedOutputFormat::Human,
        OutputFormat::Auto | OutputFormat::Json => ResolvedOutputFormat::Json,
        OutputFormat::Human => ResolvedOutputFormat::Human,
    }
}

/// Result of one CLI command.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum CommandOutput {
    Completed {
        action: &'static str,
        service: String,
    },
    Status(Status),
    Group {
        group: String,
        services: Vec<String>,
    },
}

impl CommandOutput {
    pub(crate) fn completed(action: Action, service: &str) -> Self {
        Self::Completed {
            action: action.as_str(),
            service: service.to_owned(),
        }
    }
}

pub(crate) fn write_output<W: Write>(
    stdout: &mut W,
    output: &CommandOutput,
    format: ResolvedOutputFormat,
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Json => {
            serde_json::to_writer(&mut *stdout, output).map_err(AppError::SerialiseOutput)?;
            writeln!(stdout).map_err(AppError::WriteOutput)?;
        }
        ResolvedOutputFormat::Human => {
            stdout
                .write_all(render_human(output).as_bytes())
                .map_err(AppError::WriteOutput)?;
        }
    }
    stdout.flush().map_err(AppError::WriteOutput)
}

fn render_human(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Completed { action, service } => {
            format!("{}: {service}\n", past_tense(action))
        }
        CommandOutput::Status(status) => render_status(status),
        CommandOutput::Group { services, .. } => services
            .iter()
            .map(|service| format!("{service}\n"))
            .collect(),
    }
}

fn past_tense(action: &str) -> &str {
    match action {
        "start" => "started",
        "stop" => "stopped",
        "unmonitor" => "unmonitored",
        other => other,
    }
}

fn render_status(status: &Status) -> String {
    let width = status
        .services()
        .map(|service| service.name().len())
        .max()
        .unwrap_or(0);
    let mut rendered = String::new();
    for service in status.services() {
        let line = format!("{:<width$}  {}", service.name(), service.state());
        rendered.push_str(line.trim_end());
        if !service.status_message().is_empty() {
            rendered.push_str(" (");
            rendered.push_str(service.status_message());
            rendered.push(')');
        }
        rendered.push('\n');
    }
    for group in status.groups() {
        rendered.push_str(&format!(
            "group {}: {}\n",
            group.name(),
            group.member_names().join(", ")
        ));
    }
    rendered
}
