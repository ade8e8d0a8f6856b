//! HTTP round-trip seam.
//!
//! The client never builds sockets itself: every request goes through an
//! [`HttpTransport`]. Production code uses [`ReqwestTransport`]; tests inject
//! mocks or point a real transport at an in-process fake supervisor.

use std::time::Duration;

use url::Url;

use crate::error::TransportError;

/// HTTP method used by the supervisor API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
}

impl Method {
    /// Upper-case method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A fully formed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// Header name/value pairs in send order.
    pub headers: Vec<(String, String)>,
    /// Request body; empty for `GET`.
    pub body: Vec<u8>,
    /// Remaining caller budget; transports must not wait longer than this.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// First header value matching `name` case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as received from the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase, e.g. `Service Unavailable`.
    pub reason: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Builds a response with no headers.
    #[must_use]
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `200 OK` with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, "OK", body)
    }

    /// Status code and reason phrase, e.g. `503 Service Unavailable`.
    #[must_use]
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }

    /// True for `200`, the only status the supervisor uses for success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Body as UTF-8, with invalid sequences replaced by `U+FFFD`.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First header value matching `name` case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Performs one HTTP round-trip.
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response was obtained.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Builds a transport whose requests never outlive `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] when the TLS or resolver backend
    /// cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|error| TransportError::Build {
                source: Box::new(error),
            })?;
        Ok(Self { client, timeout })
    }

    /// Per-instance timeout budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        if let Some(remaining) = request.timeout {
            builder = builder.timeout(remaining.min(self.timeout));
        }

        let url = request.url.as_str();
        let response = builder.send().map_err(|error| classify(url, error))?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().map_err(|error| classify(url, error))?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body: body.to_vec(),
        })
    }
}

fn classify(target: &str, error: reqwest::Error) -> TransportError {
    let url = target.to_owned();
    if error.is_timeout() {
        TransportError::Timeout {
            url,
            source: Box::new(error),
        }
    } else if error.is_connect() {
        TransportError::Connect {
            url,
            source: Box::new(error),
        }
    } else {
        TransportError::Other {
            url,
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HttpResponse::new(503, "Service Unavailable", ""), "503 Service Unavailable")]
    #[case(HttpResponse::new(599, "", ""), "599")]
    #[case(HttpResponse::ok(""), "200 OK")]
    fn status_line_joins_code_and_reason(#[case] response: HttpResponse, #[case] expected: &str) {
        assert_eq!(response.status_line(), expected);
    }

    #[test]
    fn only_200_is_success() {
        assert!(HttpResponse::ok("").is_success());
        assert!(!HttpResponse::new(204, "No Content", "").is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut response = HttpResponse::ok("");
        response
            .headers
            .push((String::from("Content-Type"), String::from("text/xml")));
        assert_eq!(response.header("content-type"), Some("text/xml"));
        assert_eq!(response.header("x-missing"), None);
    }
}
