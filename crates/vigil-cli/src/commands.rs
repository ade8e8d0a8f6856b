//! Maps parsed commands onto supervisor client calls.

use std::sync::Arc;

use tracing::info;
use vigil_config::Config;
use vigil_monit::{
    Action, CallOptions, Credentials, MonitClient, MonitError, PollSettings, ReqwestTransport,
};

use crate::cli::CliCommand;
use crate::errors::AppError;
use crate::output::CommandOutput;

/// Builds a client whose transports honour the configured timeouts.
pub(crate) fn build_client(config: &Config) -> Result<MonitClient, AppError> {
    let responsive = ReqwestTransport::new(config.short_timeout()).map_err(AppError::Transport)?;
    let patient = ReqwestTransport::new(config.long_timeout()).map_err(AppError::Transport)?;
    let credentials = Credentials::new(config.monit_user(), config.monit_password());
    let client = MonitClient::new(
        config.monit_host(),
        credentials,
        Arc::new(responsive),
        Arc::new(patient),
    )?
    .with_poll_settings(PollSettings::new(
        config.poll_interval(),
        config.stop_timeout(),
    ));
    Ok(client)
}

pub(crate) fn execute(
    client: &MonitClient,
    command: &CliCommand,
    options: &CallOptions,
) -> Result<CommandOutput, MonitError> {
    match command {
        CliCommand::Start { name } => {
            client.start_service(name, options)?;
            info!(target: "vigil_cli", service = %name, "start requested");
            Ok(CommandOutput::completed(Action::Start, name))
        }
        CliCommand::Stop { name } => {
            client.stop_service(name, options)?;
            info!(target: "vigil_cli", service = %name, "service stopped");
            Ok(CommandOutput::completed(Action::Stop, name))
        }
        CliCommand::Unmonitor { name } => {
            client.unmonitor_service(name, options)?;
            Ok(CommandOutput::completed(Action::Unmonitor, name))
        }
        CliCommand::Status => client.status(options).map(CommandOutput::Status),
        CliCommand::Group { name } => {
            let services = client.services_in_group(name, options)?;
            Ok(CommandOutput::Group {
                group: name.clone(),
                services,
            })
        }
    }
}
