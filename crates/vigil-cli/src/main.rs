//! Entrypoint for the `vigil` binary.
//!
//! Delegates to [`vigil_cli::run`], which loads configuration, performs one
//! supervisor operation and renders the result.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    vigil_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
