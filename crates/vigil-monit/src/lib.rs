//! Blocking client for the Monit process supervisor's HTTP API.
//!
//! [`MonitClient`] starts, stops, and unmonitors named services and fetches
//! [`Status`] snapshots. Stopping waits for the supervisor to report a
//! terminal state for the service, polling at a fixed interval under a
//! ceiling and the caller's [`CallOptions`].
//!
//! Requests travel through the [`HttpTransport`] seam so that callers can
//! inject their own HTTP stack; [`ReqwestTransport`] is the default.

mod charset;
mod client;
mod error;
mod options;
pub mod status;
mod stop;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use charset::normalise;
pub use client::{Credentials, InvalidHost, MonitClient};
pub use error::{Action, DecodeError, ErrorKind, FailureCause, MonitError, TransportError};
pub use options::{CallOptions, CancelToken};
pub use status::{
    DerivedState, FailureFlags, PendingAction, Service, ServiceGroup, Status, decode,
};
pub use stop::{DEFAULT_POLL_INTERVAL, DEFAULT_STOP_CEILING, PollSettings, StopOutcome};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};

#[cfg(test)]
mod tests;
