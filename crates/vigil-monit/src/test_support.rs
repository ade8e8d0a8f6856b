//! In-process fake supervisor for tests.
//!
//! [`FakeMonit`] listens on an ephemeral loopback port, speaks just enough
//! HTTP/1.1 for one request per connection, records every request, and
//! answers through a caller-supplied responder.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// A request as seen by the fake supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Method token.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Query string, if any.
    pub query: Option<String>,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Body as text.
    pub body: String,
}

impl RecordedRequest {
    /// First header value matching `name` case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of `key` in an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.body.split('&').find_map(|pair| {
            let (candidate, value) = pair.split_once('=')?;
            (candidate == key).then_some(value)
        })
    }

    /// True for the status endpoint.
    #[must_use]
    pub fn is_status_query(&self) -> bool {
        self.method == "GET" && self.path == "/_status2"
    }
}

/// A canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub reason: String,
    /// Body.
    pub body: Vec<u8>,
}

impl FakeResponse {
    /// `200 OK` carrying `body`.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, "OK", body)
    }

    /// Arbitrary status line and body.
    #[must_use]
    pub fn with_status(status: u16, reason: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: reason.to_owned(),
            body: body.into(),
        }
    }
}

type Responder = Box<dyn FnMut(&RecordedRequest) -> FakeResponse + Send>;

/// Fake supervisor bound to `127.0.0.1` on an ephemeral port.
pub struct FakeMonit {
    port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeMonit {
    /// Starts a server answering every request through `responder`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the listener cannot be bound.
    pub fn spawn<R>(responder: R) -> io::Result<Self>
    where
        R: FnMut(&RecordedRequest) -> FakeResponse + Send + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_requests = Arc::clone(&requests);
        let worker_shutdown = Arc::clone(&shutdown);
        let boxed: Responder = Box::new(responder);
        let handle =
            thread::spawn(move || serve(&listener, boxed, &worker_requests, &worker_shutdown));
        Ok(Self {
            port,
            requests,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Accepts every action and answers status queries with `documents` in
    /// turn, repeating the last one once the script runs out.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the listener cannot be bound.
    pub fn scripted(documents: Vec<String>) -> io::Result<Self> {
        let mut served = 0_usize;
        Self::spawn(move |request| {
            if !request.is_status_query() {
                return FakeResponse::ok("");
            }
            let index = served.min(documents.len().saturating_sub(1));
            served = served.saturating_add(1);
            FakeResponse::ok(documents.get(index).cloned().unwrap_or_default())
        })
    }

    /// Listening port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` authority to hand to a client.
    #[must_use]
    pub fn host(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for FakeMonit {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    listener: &TcpListener,
    mut responder: Responder,
    requests: &Mutex<Vec<RecordedRequest>>,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                // A client that hangs up mid-request is not the server's problem.
                let _ = handle_connection(stream, &mut responder, requests);
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(_) => return,
        }
    }
}

fn handle_connection(
    stream: TcpStream,
    responder: &mut Responder,
    requests: &Mutex<Vec<RecordedRequest>>,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let request = read_request(&mut reader)?;
    let response = responder(&request);
    requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request);
    write_response(stream, &response)
}

fn read_request(reader: &mut impl BufRead) -> io::Result<RecordedRequest> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let target = parts.next().unwrap_or_default();
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
        None => (target.to_owned(), None),
    };

    let mut headers = Vec::new();
    loop {
        let mut raw = String::new();
        if reader.read_line(&mut raw)? == 0 {
            break;
        }
        let header = raw.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.push((name.trim().to_owned(), value.trim().to_owned()));
        }
    }

    let length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body)?;

    Ok(RecordedRequest {
        method,
        path,
        query,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn write_response(mut stream: TcpStream, response: &FakeResponse) -> io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.reason,
        response.body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

/// Renders one `<service>` element; an empty `message` is omitted.
#[must_use]
pub fn service_xml(name: &str, monitor: u32, status: u32, pending: u32, message: &str) -> String {
    let message_xml = if message.is_empty() {
        String::new()
    } else {
        format!("<status_message><![CDATA[{message}]]></status_message>")
    };
    format!(
        "<service name=\"{name}\"><monitor>{monitor}</monitor><status>{status}</status>\
         {message_xml}<pendingaction>{pending}</pendingaction></service>"
    )
}

/// Renders a complete status document from service elements and groups.
#[must_use]
pub fn status_document(services: &[String], groups: &[(&str, &[&str])]) -> String {
    let rendered_groups: String = groups
        .iter()
        .map(|(name, members)| {
            let member_xml: String = members
                .iter()
                .map(|member| format!("<service>{member}</service>"))
                .collect();
            format!("<servicegroup name=\"{name}\">{member_xml}</servicegroup>")
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><monit><services>{}</services>\
         <servicegroups>{rendered_groups}</servicegroups></monit>",
        services.concat()
    )
}
