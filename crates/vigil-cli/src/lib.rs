//! Command-line runtime for the vigil supervisor client.
//!
//! The runtime splits configuration flags from the command, loads layered
//! configuration, installs telemetry, and drives one supervisor operation.
//! Configuration loading, IO streams and the cancellation token can be
//! substituted so tests run the whole flow against a fake supervisor.

use std::ffi::OsString;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use vigil_monit::{CallOptions, CancelToken};

mod cli;
mod commands;
mod config;
mod errors;
mod output;
mod signals;
mod telemetry;

#[cfg(test)]
mod tests;

use cli::Cli;
pub use cli::OutputFormat;
use config::{ConfigLoader, OrthoConfigLoader, command_arguments, split_config_arguments};
use errors::AppError;
use output::write_output;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
    stdout_is_terminal: bool,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal: io::stdout().is_terminal(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_terminal_status(
        stdout: &'a mut W,
        stderr: &'a mut E,
        stdout_is_terminal: bool,
    ) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal,
        }
    }

    pub(crate) const fn stdout_is_terminal(&self) -> bool {
        self.stdout_is_terminal
    }
}

struct CliRunner<'a, 'io, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'io, W, E>,
    loader: &'a L,
    cancel: CancelToken,
}

impl<'a, 'io, W, E, L> CliRunner<'a, 'io, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    const fn new(io: &'a mut IoStreams<'io, W, E>, loader: &'a L, cancel: CancelToken) -> Self {
        Self { io, loader, cancel }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        match self.try_run(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(AppError::CliUsage(error)) if !error.use_stderr() => {
                // `--help` and `--version` arrive as clap errors.
                let _ = write!(self.io.stdout, "{error}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }

    fn try_run<I>(&mut self, args: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let arguments: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&arguments);
        let cli = Cli::try_parse_from(command_arguments(&arguments, &split))
            .map_err(AppError::CliUsage)?;
        let config = self.loader.load(&split.config_arguments)?;
        telemetry::initialise(&config)?;

        let client = commands::build_client(&config)?;
        let options = CallOptions::new().with_cancel_token(self.cancel.clone());
        let result = commands::execute(&client, &cli.command, &options)?;

        let format = output::resolve(cli.output, self.io.stdout_is_terminal());
        write_output(&mut *self.io.stdout, &result, format)
    }
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// `SIGINT` and `SIGTERM` cancel the running operation; failures are
/// reported on `stderr` with a non-zero exit code.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    let cancel = CancelToken::new();
    if let Err(error) = signals::install(&cancel) {
        let _ = writeln!(io.stderr, "{}", AppError::Signals(error));
        return ExitCode::FAILURE;
    }
    run_with_loader(args, &mut io, &OrthoConfigLoader, cancel)
}

/// Runs the CLI with a custom configuration loader and cancellation token.
#[must_use]
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
    cancel: CancelToken,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader, cancel).run(args)
}
