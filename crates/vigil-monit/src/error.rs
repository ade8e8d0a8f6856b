//! Error types surfaced by the supervisor client.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Operation a [`MonitError`] was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `action=start`.
    Start,
    /// `action=stop` together with the completion wait.
    Stop,
    /// `action=unmonitor`.
    Unmonitor,
    /// Full status query.
    Status,
    /// Group membership listing.
    Group,
}

impl Action {
    /// Lower-case name, matching the form value sent on the wire for the
    /// service actions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Unmonitor => "unmonitor",
            Self::Status => "status",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Coarse classification of a failure, for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, DNS, or socket-level failure.
    Transport,
    /// The supervisor answered with something other than 200.
    HttpStatus,
    /// The status document could not be decoded.
    Decode,
    /// The service was absent from the polled snapshot.
    ServiceNotFound,
    /// The service settled into an error state after a stop.
    StopFailed,
    /// A deadline or the stop ceiling was exceeded.
    Timeout,
    /// The caller's cancellation token fired.
    Canceled,
}

/// Failure returned by every public client operation.
#[derive(Debug, Error)]
pub enum MonitError {
    /// An operation failed; names the action, the target, and the cause.
    #[error("{}", describe_operation(*action, service.as_deref(), source))]
    Operation {
        /// Operation that failed.
        action: Action,
        /// Target service or group, absent for status queries.
        service: Option<String>,
        /// Underlying cause.
        #[source]
        source: FailureCause,
    },
}

fn describe_operation(action: Action, service: Option<&str>, source: &FailureCause) -> String {
    match service {
        Some(name) => format!("failed to {action} '{name}': {source}"),
        None => format!("failed to query {action}: {source}"),
    }
}

impl MonitError {
    pub(crate) fn operation(
        action: Action,
        service: Option<&str>,
        source: impl Into<FailureCause>,
    ) -> Self {
        Self::Operation {
            action,
            service: service.map(str::to_owned),
            source: source.into(),
        }
    }

    /// Operation that failed.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::Operation { action, .. } => *action,
        }
    }

    /// Service or group the operation targeted, if any.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Operation { service, .. } => service.as_deref(),
        }
    }

    /// Underlying cause.
    #[must_use]
    pub const fn cause(&self) -> &FailureCause {
        match self {
            Self::Operation { source, .. } => source,
        }
    }

    /// Classification of the underlying cause.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.cause().kind()
    }
}

/// Root cause of a [`MonitError`].
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The request never produced an HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The supervisor rejected the request.
    #[error("supervisor responded {status_line}: {body}")]
    HttpStatus {
        /// Status code and reason phrase, e.g. `503 Service Unavailable`.
        status_line: String,
        /// Response body. Bytes that are not valid UTF-8 are replaced with
        /// `U+FFFD`; valid UTF-8 is kept verbatim.
        body: String,
    },
    /// The status document was unusable.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The service is not present in the supervisor's status.
    #[error("service '{service}' not found in supervisor status")]
    ServiceNotFound {
        /// Name that was looked up.
        service: String,
    },
    /// The service reported an error state once the stop settled.
    #[error("service '{service}' failed to stop: {message}")]
    StopFailed {
        /// Service that failed.
        service: String,
        /// Supervisor's status message, verbatim.
        message: String,
    },
    /// The caller's deadline passed.
    #[error("deadline exceeded")]
    Timeout,
    /// The stop did not settle within the configured ceiling.
    #[error("stop did not settle within {} ms", timeout.as_millis())]
    StopTimeout {
        /// Configured ceiling.
        timeout: Duration,
    },
    /// The caller canceled the operation.
    #[error("operation canceled")]
    Canceled,
}

impl FailureCause {
    /// Classification of this cause.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::Decode(_) => ErrorKind::Decode,
            Self::ServiceNotFound { .. } => ErrorKind::ServiceNotFound,
            Self::StopFailed { .. } => ErrorKind::StopFailed,
            Self::Timeout | Self::StopTimeout { .. } => ErrorKind::Timeout,
            Self::Canceled => ErrorKind::Canceled,
        }
    }
}

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Failure below the HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request exceeded its timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Target URL.
        url: String,
        /// Underlying error.
        #[source]
        source: BoxedSource,
    },
    /// The connection could not be established.
    #[error("failed to connect to {url}")]
    Connect {
        /// Target URL.
        url: String,
        /// Underlying error.
        #[source]
        source: BoxedSource,
    },
    /// Any other I/O or protocol failure.
    #[error("request to {url} failed")]
    Other {
        /// Target URL.
        url: String,
        /// Underlying error.
        #[source]
        source: BoxedSource,
    },
    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client")]
    Build {
        /// Underlying error.
        #[source]
        source: BoxedSource,
    },
}

/// Failure decoding a status document.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The XML declaration names an encoding with no known mapping.
    #[error("unsupported document encoding '{label}'")]
    UnsupportedEncoding {
        /// Label as written in the declaration.
        label: String,
    },
    /// The bytes are not valid in the document's encoding.
    #[error("document is not valid {encoding}")]
    InvalidEncoding {
        /// Canonical name of the encoding.
        encoding: &'static str,
    },
    /// The document does not match the expected schema.
    #[error("malformed status document")]
    Malformed {
        /// Parser error.
        #[source]
        source: quick_xml::DeError,
    },
    /// Two services share a name.
    #[error("duplicate service '{name}' in status document")]
    DuplicateService {
        /// Repeated name.
        name: String,
    },
    /// Two groups share a name.
    #[error("duplicate service group '{name}' in status document")]
    DuplicateGroup {
        /// Repeated name.
        name: String,
    },
}
