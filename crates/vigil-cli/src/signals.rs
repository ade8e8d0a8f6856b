//! Maps termination signals onto the cancellation token.

use std::io;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::flag;
use vigil_monit::CancelToken;

/// Routes `SIGINT` and `SIGTERM` to `token`.
///
/// The first signal cancels the in-flight operation cooperatively; a second
/// one terminates the process immediately.
pub(crate) fn install(token: &CancelToken) -> io::Result<()> {
    for signal in [SIGINT, SIGTERM] {
        flag::register_conditional_shutdown(signal, 1, token.flag())?;
        flag::register(signal, token.flag())?;
    }
    Ok(())
}
