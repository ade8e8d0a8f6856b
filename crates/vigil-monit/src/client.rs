//! Service controller over the supervisor's HTTP API.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::{Action, FailureCause, MonitError};
use crate::options::CallOptions;
use crate::status::{self, Status};
use crate::stop::{PollSettings, StopOutcome, wait_for_stop};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};

const CLIENT_TARGET: &str = "vigil_monit::client";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const STATUS_PATH: &str = "_status2";
const STATUS_QUERY: &str = "format=xml";

/// The supervisor host could not be turned into a base URL.
#[derive(Debug, Error)]
#[error("invalid supervisor host '{host}'")]
pub struct InvalidHost {
    host: String,
    #[source]
    source: Option<url::ParseError>,
}

impl InvalidHost {
    /// Host as supplied.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Pairs a username with its password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn authorization(&self) -> String {
        let pair = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client for one supervisor instance.
///
/// Immutable after construction and safe to share across threads for
/// operations on different services. Start and status requests use the
/// responsive transport; stop and unmonitor use the patient one because they
/// block while the supervisor runs service scripts.
#[derive(Clone)]
pub struct MonitClient {
    base: Url,
    credentials: Credentials,
    responsive: Arc<dyn HttpTransport>,
    patient: Arc<dyn HttpTransport>,
    polling: PollSettings,
}

impl fmt::Debug for MonitClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MonitClient")
            .field("base", &self.base.as_str())
            .field("credentials", &self.credentials)
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

impl MonitClient {
    /// Builds a client for `host` (`host[:port]`).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHost`] when `host` does not form a valid `http://`
    /// authority.
    pub fn new(
        host: &str,
        credentials: Credentials,
        responsive: Arc<dyn HttpTransport>,
        patient: Arc<dyn HttpTransport>,
    ) -> Result<Self, InvalidHost> {
        let base = base_url(host)?;
        Ok(Self {
            base,
            credentials,
            responsive,
            patient,
            polling: PollSettings::default(),
        })
    }

    /// Replaces the stop-completion cadence and ceiling.
    #[must_use]
    pub const fn with_poll_settings(mut self, polling: PollSettings) -> Self {
        self.polling = polling;
        self
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Stop-completion settings.
    #[must_use]
    pub const fn poll_settings(&self) -> PollSettings {
        self.polling
    }

    /// Asks the supervisor to start `name`. Does not wait for it to run.
    ///
    /// # Errors
    ///
    /// Returns [`MonitError`] naming [`Action::Start`] on any failure.
    pub fn start_service(&self, name: &str, options: &CallOptions) -> Result<(), MonitError> {
        self.post_action(self.responsive.as_ref(), name, Action::Start, options)
            .map_err(|cause| MonitError::operation(Action::Start, Some(name), cause))
    }

    /// Asks the supervisor to stop watching `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitError`] naming [`Action::Unmonitor`] on any failure.
    pub fn unmonitor_service(&self, name: &str, options: &CallOptions) -> Result<(), MonitError> {
        self.post_action(self.patient.as_ref(), name, Action::Unmonitor, options)
            .map_err(|cause| MonitError::operation(Action::Unmonitor, Some(name), cause))
    }

    /// Unmonitors and stops `name`, then waits for it to settle.
    ///
    /// # Errors
    ///
    /// A failed unmonitor is returned as is, naming [`Action::Unmonitor`], and
    /// the stop is not sent. Every later failure names [`Action::Stop`]:
    /// rejected stop requests, status query failures while waiting, a service
    /// that vanished (`ServiceNotFound`) or settled with a failure
    /// (`StopFailed`), and exhausted budgets.
    pub fn stop_service(&self, name: &str, options: &CallOptions) -> Result<(), MonitError> {
        self.unmonitor_service(name, options)?;
        self.stop_and_wait(name, options)
            .map_err(|cause| MonitError::operation(Action::Stop, Some(name), cause))
    }

    fn stop_and_wait(&self, name: &str, options: &CallOptions) -> Result<(), FailureCause> {
        self.post_action(self.patient.as_ref(), name, Action::Stop, options)?;
        let outcome = wait_for_stop(
            name,
            |bounded| self.fetch_status(bounded),
            &self.polling,
            options,
        )?;
        debug!(target: CLIENT_TARGET, service = name, ?outcome, "stop settled");
        match outcome {
            StopOutcome::Stopped => Ok(()),
            StopOutcome::Errored { message } => Err(FailureCause::StopFailed {
                service: name.to_owned(),
                message,
            }),
            StopOutcome::NotFound => Err(FailureCause::ServiceNotFound {
                service: name.to_owned(),
            }),
        }
    }

    /// Names of the members of `group`, in document order.
    ///
    /// An absent group yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`MonitError`] naming [`Action::Group`] when the status query
    /// fails.
    pub fn services_in_group(
        &self,
        group: &str,
        options: &CallOptions,
    ) -> Result<Vec<String>, MonitError> {
        let status = self
            .fetch_status(options)
            .map_err(|cause| MonitError::operation(Action::Group, Some(group), cause))?;
        Ok(status
            .service_names_in_group(group)
            .into_iter()
            .map(str::to_owned)
            .collect())
    }

    /// Fetches one full status snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MonitError`] naming [`Action::Status`] when the query fails
    /// or the document cannot be decoded.
    pub fn status(&self, options: &CallOptions) -> Result<Status, MonitError> {
        self.fetch_status(options)
            .map_err(|cause| MonitError::operation(Action::Status, None, cause))
    }

    fn fetch_status(&self, options: &CallOptions) -> Result<Status, FailureCause> {
        let mut url = self.base.clone();
        url.set_path(STATUS_PATH);
        url.set_query(Some(STATUS_QUERY));
        let response = self.send(self.responsive.as_ref(), Method::Get, url, Vec::new(), options)?;
        Ok(status::decode(&response.body)?)
    }

    fn post_action(
        &self,
        transport: &dyn HttpTransport,
        name: &str,
        action: Action,
        options: &CallOptions,
    ) -> Result<(), FailureCause> {
        let url = self.service_url(name);
        let body = format!("action={}", action.as_str()).into_bytes();
        self.send(transport, Method::Post, url, body, options)
            .map(drop)
    }

    fn service_url(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear().push(name);
        }
        url
    }

    fn send(
        &self,
        transport: &dyn HttpTransport,
        method: Method,
        url: Url,
        body: Vec<u8>,
        options: &CallOptions,
    ) -> Result<HttpResponse, FailureCause> {
        options.check()?;
        let request = HttpRequest {
            method,
            url,
            headers: vec![
                (String::from("Authorization"), self.credentials.authorization()),
                (String::from("Content-Type"), String::from(FORM_CONTENT_TYPE)),
            ],
            body,
            timeout: options.remaining(),
        };
        debug!(
            target: CLIENT_TARGET,
            method = request.method.as_str(),
            url = %request.url,
            body = %String::from_utf8_lossy(&request.body),
            "sending supervisor request"
        );
        let response = transport.execute(&request).map_err(|error| {
            debug!(target: CLIENT_TARGET, url = %request.url, %error, "supervisor request failed");
            // The request timeout is the remaining budget, so an expiry or a
            // cancellation during the round-trip is reported as such.
            match options.check() {
                Err(cause) => cause,
                Ok(()) => FailureCause::Transport(error),
            }
        })?;
        debug!(
            target: CLIENT_TARGET,
            url = %request.url,
            status = response.status,
            "supervisor responded"
        );
        if response.is_success() {
            Ok(response)
        } else {
            Err(FailureCause::HttpStatus {
                status_line: response.status_line(),
                body: response.body_text(),
            })
        }
    }
}

fn base_url(host: &str) -> Result<Url, InvalidHost> {
    let trimmed = host.trim();
    let invalid = |source| InvalidHost {
        host: host.to_owned(),
        source,
    };
    if trimmed.is_empty() || trimmed.contains(['/', '?', '#', '@']) {
        return Err(invalid(None));
    }
    let url = Url::parse(&format!("http://{trimmed}/")).map_err(|error| invalid(Some(error)))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(None));
    }
    Ok(url)
}
