use std::time::{Duration, Instant};

use mockall::Sequence;
use rstest::rstest;

use super::*;
use crate::{Action, CallOptions, CancelToken, DerivedState, ErrorKind, FailureCause};

const STATUS_FIXTURE: &[u8] = include_bytes!("../../tests/fixtures/status.xml");

#[test]
fn start_posts_once_on_the_responsive_transport() {
    let mut responsive = MockTransport::new();
    responsive
        .expect_execute()
        .withf(|request| {
            is_action(request, "start")
                && request.header("authorization") == Some(EXPECTED_AUTHORIZATION)
                && request.header("content-type") == Some("application/x-www-form-urlencoded")
        })
        .times(1)
        .returning(|_| Ok(HttpResponse::ok("")));
    let mut patient = MockTransport::new();
    patient.expect_execute().never();

    client(responsive, patient)
        .start_service("test-service", &CallOptions::new())
        .expect("start succeeds");
}

#[test]
fn unmonitor_posts_once_on_the_patient_transport() {
    let mut responsive = MockTransport::new();
    responsive.expect_execute().never();
    let mut patient = MockTransport::new();
    let mut sequence = Sequence::new();
    expect_action(&mut patient, &mut sequence, "unmonitor");

    client(responsive, patient)
        .unmonitor_service("test-service", &CallOptions::new())
        .expect("unmonitor succeeds");
}

#[rstest]
#[case::start(Action::Start)]
#[case::unmonitor(Action::Unmonitor)]
fn rejected_actions_carry_the_status_line_and_body(#[case] action: Action) {
    let reject = |transport: &mut MockTransport| {
        transport.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                503,
                "Service Unavailable",
                "monit is busy\n",
            ))
        });
    };
    let mut responsive = MockTransport::new();
    let mut patient = MockTransport::new();
    match action {
        Action::Start => reject(&mut responsive),
        _ => reject(&mut patient),
    }
    let subject = client(responsive, patient);
    let options = CallOptions::new();

    let error = match action {
        Action::Start => subject.start_service("test-service", &options),
        _ => subject.unmonitor_service("test-service", &options),
    }
    .expect_err("non-200 is a failure");

    assert_eq!(error.action(), action);
    assert_eq!(error.service(), Some("test-service"));
    assert!(matches!(
        error.cause(),
        FailureCause::HttpStatus { status_line, body }
            if status_line == "503 Service Unavailable" && body == "monit is busy\n"
    ));
}

#[test]
fn non_utf8_rejection_bodies_are_replaced_not_dropped() {
    let mut responsive = MockTransport::new();
    responsive.expect_execute().times(1).returning(|_| {
        Ok(HttpResponse::new(
            500,
            "Internal Server Error",
            vec![b'b', b'a', b'd', 0xff],
        ))
    });

    let error = client(responsive, MockTransport::new())
        .start_service("test-service", &CallOptions::new())
        .expect_err("non-200 is a failure");

    assert!(matches!(
        error.cause(),
        FailureCause::HttpStatus { status_line, body }
            if status_line == "500 Internal Server Error" && body == "bad\u{fffd}"
    ));
}

#[test]
fn transport_failures_are_classified() {
    let mut responsive = MockTransport::new();
    responsive
        .expect_execute()
        .times(1)
        .returning(|_| Err(connection_refused()));

    let error = client(responsive, MockTransport::new())
        .start_service("test-service", &CallOptions::new())
        .expect_err("transport failure");
    assert_eq!(error.kind(), ErrorKind::Transport);
}

#[test]
fn status_is_fetched_on_the_responsive_transport() {
    let mut responsive = MockTransport::new();
    responsive
        .expect_execute()
        .withf(|request| {
            is_status_query(request)
                && request.body.is_empty()
                && request.header("authorization") == Some(EXPECTED_AUTHORIZATION)
        })
        .times(1)
        .returning(|_| Ok(HttpResponse::ok(STATUS_FIXTURE)));
    let mut patient = MockTransport::new();
    patient.expect_execute().never();

    let status = client(responsive, patient)
        .status(&CallOptions::new())
        .expect("status decodes");
    let dummy = status.service("dummy").expect("dummy present");
    assert_eq!(dummy.state(), DerivedState::Running);
    assert_eq!(status.services_in_group("vcap").len(), 1);
}

#[rstest]
#[case::member_group("vcap", vec![String::from("dummy")])]
#[case::absent_group("missing", Vec::new())]
fn group_listing_reads_a_fresh_snapshot(#[case] group: &str, #[case] expected: Vec<String>) {
    let mut responsive = MockTransport::new();
    responsive
        .expect_execute()
        .withf(is_status_query)
        .times(1)
        .returning(|_| Ok(HttpResponse::ok(STATUS_FIXTURE)));

    let names = client(responsive, MockTransport::new())
        .services_in_group(group, &CallOptions::new())
        .expect("group listing");
    assert_eq!(names, expected);
}

#[test]
fn undecodable_status_is_a_decode_failure() {
    let mut responsive = MockTransport::new();
    responsive
        .expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::ok("<monit><services>")));

    let error = client(responsive, MockTransport::new())
        .status(&CallOptions::new())
        .expect_err("malformed document");
    assert_eq!(error.action(), Action::Status);
    assert_eq!(error.service(), None);
    assert_eq!(error.kind(), ErrorKind::Decode);
}

#[test]
fn canceled_calls_send_nothing() {
    let mut responsive = MockTransport::new();
    responsive.expect_execute().never();
    let mut patient = MockTransport::new();
    patient.expect_execute().never();
    let token = CancelToken::new();
    token.cancel();
    let options = CallOptions::new().with_cancel_token(token);
    let subject = client(responsive, patient);

    for error in [
        subject.start_service("test-service", &options).expect_err("canceled"),
        subject.stop_service("test-service", &options).expect_err("canceled"),
        subject.status(&options).expect_err("canceled"),
    ] {
        assert_eq!(error.kind(), ErrorKind::Canceled);
    }
}

#[test]
fn elapsed_deadline_sends_nothing() {
    let mut responsive = MockTransport::new();
    responsive.expect_execute().never();

    let error = client(responsive, MockTransport::new())
        .start_service("test-service", &CallOptions::new().with_deadline(Instant::now()))
        .expect_err("deadline passed");
    assert_eq!(error.kind(), ErrorKind::Timeout);
}

#[test]
fn requests_carry_the_remaining_budget() {
    let mut responsive = MockTransport::new();
    responsive
        .expect_execute()
        .withf(|request| {
            request
                .timeout
                .is_some_and(|budget| budget <= Duration::from_secs(30))
        })
        .times(1)
        .returning(|_| Ok(HttpResponse::ok("")));

    client(responsive, MockTransport::new())
        .start_service(
            "test-service",
            &CallOptions::new().with_timeout(Duration::from_secs(30)),
        )
        .expect("start succeeds");
}

#[test]
fn service_names_are_percent_encoded_as_one_segment() {
    let mut responsive = MockTransport::new();
    responsive
        .expect_execute()
        .withf(|request| request.url.as_str() == "http://agent.example.com/web%20server%2F1")
        .times(1)
        .returning(|_| Ok(HttpResponse::ok("")));

    client(responsive, MockTransport::new())
        .start_service("web server/1", &CallOptions::new())
        .expect("start succeeds");
}
