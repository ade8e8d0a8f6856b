//! Test support utilities for CLI behavioural coverage.
//!
//! Wraps a fake supervisor, captured output and a static configuration
//! loader so step definitions stay focused on their assertions.

use std::ffi::OsString;
use std::net::TcpListener;
use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use rstest::fixture;
use vigil_config::Config;
use vigil_monit::CancelToken;
use vigil_monit::test_support::{FakeMonit, FakeResponse, service_xml, status_document};

use crate::errors::AppError;
use crate::{ConfigLoader, IoStreams, run_with_loader};

pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Configuration pointing at `host` with timings short enough for tests.
pub(super) fn test_config(host: String) -> Config {
    Config {
        monit_host: host,
        monit_user: String::from("fake-user"),
        monit_password: String::from("fake-pass"),
        short_timeout_ms: 2_000,
        long_timeout_ms: 2_000,
        poll_interval_ms: 5,
        stop_timeout_ms: 2_000,
        ..Config::default()
    }
}

/// One service entry with the given monitor flag, status and pending codes.
pub(super) fn document(name: &str, monitor: u32, status: u32, pending: u32, message: &str) -> String {
    status_document(
        &[service_xml(name, monitor, status, pending, message)],
        &[("vcap", &[name])],
    )
}

pub(super) struct TestWorld {
    pub config: Config,
    pub monit: Option<FakeMonit>,
    pub cancel: CancelToken,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
    pub requests: Vec<String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self {
            config: test_config(String::from("127.0.0.1:2812")),
            monit: None,
            cancel: CancelToken::new(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
            requests: Vec::new(),
        }
    }
}

impl TestWorld {
    pub fn serve_documents(&mut self, documents: Vec<String>) -> Result<()> {
        let monit = FakeMonit::scripted(documents).context("start fake supervisor")?;
        self.attach(monit);
        Ok(())
    }

    pub fn serve_rejections(&mut self) -> Result<()> {
        let monit = FakeMonit::spawn(|_| {
            FakeResponse::with_status(503, "Service Unavailable", "supervisor is busy")
        })
        .context("start fake supervisor")?;
        self.attach(monit);
        Ok(())
    }

    pub fn point_at_closed_port(&mut self) -> Result<()> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind probe listener")?;
        let port = listener.local_addr().context("probe address")?.port();
        drop(listener);
        self.config = test_config(format!("127.0.0.1:{port}"));
        Ok(())
    }

    fn attach(&mut self, monit: FakeMonit) {
        self.config = test_config(monit.host());
        self.monit = Some(monit);
    }

    pub fn run(&mut self, command: &str) {
        self.stdout.clear();
        self.stderr.clear();
        self.requests.clear();
        let args = Self::build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let mut io = IoStreams::with_terminal_status(&mut self.stdout, &mut self.stderr, false);
        let exit = run_with_loader(args, &mut io, &loader, self.cancel.clone());
        self.exit_code = Some(exit);
        if let Some(monit) = self.monit.take() {
            self.requests = monit
                .requests()
                .iter()
                .map(|request| {
                    if request.is_status_query() {
                        String::from("status")
                    } else {
                        request.form_value("action").unwrap_or("?").to_owned()
                    }
                })
                .collect();
        }
    }

    fn build_args(command: &str) -> Vec<OsString> {
        let mut args = vec![OsString::from("vigil")];
        args.extend(
            command
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .map(OsString::from),
        );
        args
    }

    pub fn stdout_text(&self) -> Result<String> {
        String::from_utf8(self.stdout.clone()).context("stdout is not utf-8")
    }

    pub fn stderr_text(&self) -> Result<String> {
        String::from_utf8(self.stderr.clone()).context("stderr is not utf-8")
    }

    pub fn assert_exit(&self, expected: ExitCode) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == expected,
            "expected exit code {expected:?}, got {exit:?}; stderr: {}",
            self.stderr_text()?
        );
        Ok(())
    }
}

#[fixture]
pub(super) fn world() -> std::cell::RefCell<TestWorld> {
    std::cell::RefCell::new(TestWorld::default())
}
