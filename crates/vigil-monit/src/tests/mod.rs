//! Controller tests against mocked transports.

mod controller;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use mockall::{Sequence, mock};

use crate::test_support::{service_xml, status_document};
use crate::{
    Credentials, HttpRequest, HttpResponse, HttpTransport, Method, MonitClient, PollSettings,
    TransportError,
};

mock! {
    Transport {}
    impl HttpTransport for Transport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
    }
}

const HOST: &str = "agent.example.com";
const SERVICE_URL: &str = "http://agent.example.com/test-service";
const STATUS_URL: &str = "http://agent.example.com/_status2?format=xml";
const EXPECTED_AUTHORIZATION: &str = "Basic ZmFrZS11c2VyOmZha2UtcGFzcw==";

fn client(responsive: MockTransport, patient: MockTransport) -> MonitClient {
    MonitClient::new(
        HOST,
        Credentials::new("fake-user", "fake-pass"),
        Arc::new(responsive),
        Arc::new(patient),
    )
    .expect("host is valid")
    .with_poll_settings(PollSettings::new(
        Duration::from_millis(1),
        Duration::from_secs(5),
    ))
}

fn is_action(request: &HttpRequest, action: &str) -> bool {
    request.method == Method::Post
        && request.url.as_str() == SERVICE_URL
        && request.body == format!("action={action}").into_bytes()
}

fn is_status_query(request: &HttpRequest) -> bool {
    request.method == Method::Get && request.url.as_str() == STATUS_URL
}

fn expect_action(transport: &mut MockTransport, sequence: &mut Sequence, action: &'static str) {
    transport
        .expect_execute()
        .withf(move |request| is_action(request, action))
        .times(1)
        .in_sequence(sequence)
        .returning(|_| Ok(HttpResponse::ok("")));
}

fn expect_status(transport: &mut MockTransport, sequence: &mut Sequence, body: String) {
    transport
        .expect_execute()
        .withf(is_status_query)
        .times(1)
        .in_sequence(sequence)
        .return_once(move |_| Ok(HttpResponse::ok(body)));
}

fn single_service(monitor: u32, status: u32, pending: u32, message: &str) -> String {
    status_document(
        &[service_xml("test-service", monitor, status, pending, message)],
        &[("vcap", &["test-service"])],
    )
}

fn connection_refused() -> TransportError {
    TransportError::Connect {
        url: String::from(SERVICE_URL),
        source: Box::new(io::Error::from(io::ErrorKind::ConnectionRefused)),
    }
}
