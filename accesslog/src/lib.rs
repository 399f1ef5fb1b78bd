// Creditline
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Per-day structured access log for HTTP requests.
//!
//! Every request served by the application is recorded as one JSON object per line in a file
//! named `api_YYYY-MM-DD.log`, and a short colorized summary is echoed on the console.  The
//! `AccessLog` is constructed explicitly by the application and handed to the `log_requests`
//! middleware as router state.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use colored::{Color, Colorize};
use creditline_core::clocks::Clock;
use derive_getters::Getters;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use time::{Date, OffsetDateTime};

mod middleware;
pub use middleware::log_requests;
pub mod viewer;

/// Errors that prevent the access log from being set up.
#[derive(Debug, thiserror::Error)]
pub enum AccessLogError {
    /// The directory that holds the log files could not be created.
    #[error("Failed to create logs directory {0}: {1}")]
    CreateDir(String, io::Error),

    /// The log file for the current day could not be opened.
    #[error("Failed to open log file {0}: {1}")]
    OpenFile(String, io::Error),
}

/// Result type for this crate.
pub type AccessLogResult<T> = Result<T, AccessLogError>;

/// Details about a single served request.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct LogEntry {
    /// Time at which the request started.
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,

    /// HTTP method of the request.
    method: String,

    /// Path of the request, without the query string.
    path: String,

    /// Status code of the response, or zero for entries that only carry an error.
    status_code: u16,

    /// Time it took to serve the request.
    response_time_ms: u64,

    /// Value of the `User-Agent` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,

    /// Address of the peer that sent the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_addr: Option<String>,

    /// Value of the `X-Request-Id` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,

    /// Description of an internal failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    /// Payload of the request, only recorded for small bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_body: Option<String>,

    /// Number of bytes in the response payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_size: Option<u64>,
}

impl LogEntry {
    /// Creates a new entry with the mandatory fields and no optional details.
    pub fn new<M, P>(
        timestamp: OffsetDateTime,
        method: M,
        path: P,
        status_code: u16,
        response_time_ms: u64,
    ) -> Self
    where
        M: Into<String>,
        P: Into<String>,
    {
        Self {
            timestamp,
            method: method.into(),
            path: path.into(),
            status_code,
            response_time_ms,
            user_agent: None,
            remote_addr: None,
            request_id: None,
            error: None,
            request_body: None,
            response_size: None,
        }
    }

    /// Sets the user agent of the request.
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Sets the address of the peer that sent the request.
    pub fn with_remote_addr(mut self, remote_addr: Option<String>) -> Self {
        self.remote_addr = remote_addr;
        self
    }

    /// Sets the caller-provided identifier of the request.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the error message.  Empty messages are not recorded.
    pub fn with_error<S: Into<String>>(mut self, error: S) -> Self {
        let error = error.into();
        self.error = if error.is_empty() { None } else { Some(error) };
        self
    }

    /// Sets the captured request payload.  Empty payloads are not recorded.
    pub fn with_request_body(mut self, request_body: Option<String>) -> Self {
        self.request_body = request_body.filter(|body| !body.is_empty());
        self
    }

    /// Sets the size of the response payload.  Zero sizes are not recorded.
    pub fn with_response_size(mut self, response_size: Option<u64>) -> Self {
        self.response_size = response_size.filter(|size| *size > 0);
        self
    }
}

/// Returns the color used to render a status code on the console.
pub fn status_color(status_code: u16) -> Color {
    match status_code {
        200..=299 => Color::Green,
        300..=399 => Color::Yellow,
        400..=499 => Color::Red,
        500.. => Color::Magenta,
        _ => Color::White,
    }
}

/// Formats `ts` as `YYYY-MM-DD HH:MM:SS` for console output.
pub fn format_console_timestamp(ts: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

/// Formats the one-line console summary of `entry`.
pub(crate) fn console_line(entry: &LogEntry) -> String {
    let outcome = format!("- {} ({}ms)", entry.status_code, entry.response_time_ms);
    format!(
        "{} [{}] {} {}",
        format_console_timestamp(entry.timestamp),
        entry.method,
        entry.path,
        outcome.color(status_color(entry.status_code))
    )
}

/// Computes the name of the log file for the given `date`.
pub fn log_file_name(date: Date) -> String {
    format!("api_{:04}-{:02}-{:02}.log", date.year(), u8::from(date.month()), date.day())
}

/// Destination of the structured request log.
///
/// The sink is released when the log is closed or dropped, after which all logging calls become
/// no-ops.
pub struct AccessLog {
    /// Where JSON lines are written to, or `None` if the log is disabled or closed.
    sink: Mutex<Option<Box<dyn Write + Send>>>,

    /// Whether to echo a summary of every entry on the console.
    echo: bool,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AccessLog {
    /// Opens the log file for the current day under `dir`, creating the directory if needed.
    ///
    /// The file is opened in append mode so that restarts on the same day keep previous entries.
    pub fn open_daily(dir: &Path, clock: Arc<dyn Clock + Send + Sync>) -> AccessLogResult<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| AccessLogError::CreateDir(dir.display().to_string(), e))?;

        let path: PathBuf = dir.join(log_file_name(clock.now_utc().date()));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AccessLogError::OpenFile(path.display().to_string(), e))?;
        log::info!("API logging initialized: {}", path.display());

        Ok(Self { sink: Mutex::new(Some(Box::new(file))), echo: true, clock })
    }

    /// Creates a log that writes JSON lines to an arbitrary `sink` without console echo.
    pub fn with_sink(sink: Box<dyn Write + Send>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { sink: Mutex::new(Some(sink)), echo: false, clock }
    }

    /// Creates a log that discards all entries.
    pub fn disabled(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { sink: Mutex::new(None), echo: false, clock }
    }

    /// Returns the current time according to the clock of this log.
    pub fn now_utc(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Locks the sink, recovering it if a previous writer panicked.
    fn lock_sink(&self) -> MutexGuard<'_, Option<Box<dyn Write + Send>>> {
        match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Records `entry` as one JSON line and echoes a summary on the console.
    ///
    /// Failures to write are reported via the `log` facade and otherwise ignored.
    pub fn log_request(&self, entry: &LogEntry) {
        let mut sink = self.lock_sink();
        let Some(writer) = sink.as_mut() else {
            return;
        };

        let mut line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize log entry: {}", e);
                return;
            }
        };
        line.push('\n');
        if let Err(e) = writer.write_all(line.as_bytes()) {
            warn!("Failed to write to log file: {}", e);
            return;
        }
        drop(sink);

        if self.echo {
            println!("{}", console_line(entry));
        }
    }

    /// Records an internal failure that happened while serving `method` on `path`.
    pub fn log_error(&self, method: &str, path: &str, message: &str) {
        let entry = LogEntry::new(self.clock.now_utc(), method, path, 0, 0).with_error(message);
        self.log_request(&entry);
    }

    /// Flushes and releases the sink.  Calling this more than once is harmless.
    pub fn close(&self) {
        if let Some(mut writer) = self.lock_sink().take() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush log file: {}", e);
            }
        }
    }
}

impl Drop for AccessLog {
    fn drop(&mut self) {
        self.close();
    }
}

/// Test utilities to inspect what an `AccessLog` writes.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// A sink that keeps everything written to it in memory and that can be inspected while the
    /// log still owns it.
    #[derive(Clone, Default)]
    pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

    impl MemorySink {
        /// Returns all lines written so far.
        pub fn lines(&self) -> Vec<String> {
            let data = self.0.lock().unwrap();
            String::from_utf8(data.clone()).unwrap().lines().map(str::to_owned).collect()
        }
    }

    impl Write for MemorySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use creditline_core::clocks::testutils::FixedClock;
    use time::macros::{date, datetime};

    fn test_clock() -> Arc<FixedClock> {
        Arc::from(FixedClock::new(datetime!(2024-03-05 13:14:15 UTC)))
    }

    #[test]
    fn test_log_entry_omits_empty_optionals() {
        let entry = LogEntry::new(datetime!(2024-03-05 13:14:15 UTC), "GET", "/api/items", 200, 3)
            .with_user_agent(None)
            .with_request_body(Some(String::new()))
            .with_response_size(Some(0))
            .with_error("");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            r#"{"timestamp":"2024-03-05T13:14:15Z","method":"GET","path":"/api/items","status_code":200,"response_time_ms":3}"#,
            json
        );
    }

    #[test]
    fn test_log_entry_includes_present_optionals() {
        let entry = LogEntry::new(datetime!(2024-03-05 13:14:15 UTC), "POST", "/api/banks", 201, 7)
            .with_user_agent(Some("curl/8".to_owned()))
            .with_remote_addr(Some("127.0.0.1:5555".to_owned()))
            .with_request_id(Some("abc-123".to_owned()))
            .with_request_body(Some(r#"{"name":"B"}"#.to_owned()))
            .with_response_size(Some(42));
        let value: serde_json::Value = serde_json::to_value(&entry).unwrap();
        assert_eq!("curl/8", value["user_agent"]);
        assert_eq!("127.0.0.1:5555", value["remote_addr"]);
        assert_eq!("abc-123", value["request_id"]);
        assert_eq!(r#"{"name":"B"}"#, value["request_body"]);
        assert_eq!(42, value["response_size"]);
        assert!(value.get("error").is_none());

        let parsed: LogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry, parsed);
    }

    #[test]
    fn test_status_color() {
        assert_eq!(Color::White, status_color(0));
        assert_eq!(Color::White, status_color(101));
        assert_eq!(Color::Green, status_color(200));
        assert_eq!(Color::Green, status_color(201));
        assert_eq!(Color::Yellow, status_color(304));
        assert_eq!(Color::Red, status_color(400));
        assert_eq!(Color::Red, status_color(404));
        assert_eq!(Color::Magenta, status_color(500));
        assert_eq!(Color::Magenta, status_color(503));
    }

    #[test]
    fn test_console_line() {
        colored::control::set_override(false);
        let timestamp = datetime!(2024-03-05 09:08:07 UTC);
        let entry = LogEntry::new(timestamp, "DELETE", "/api/clients/3", 404, 12);
        let line = console_line(&entry);
        assert_eq!("2024-03-05 09:08:07 [DELETE] /api/clients/3 - 404 (12ms)", line);
    }

    #[test]
    fn test_log_file_name() {
        assert_eq!("api_2024-03-05.log", log_file_name(date!(2024 - 03 - 05)));
        assert_eq!("api_1999-12-31.log", log_file_name(date!(1999 - 12 - 31)));
    }

    #[test]
    fn test_log_request_writes_one_line_per_entry() {
        let sink = MemorySink::default();
        let log = AccessLog::with_sink(Box::new(sink.clone()), test_clock());

        log.log_request(&LogEntry::new(log.now_utc(), "GET", "/health", 200, 0));
        log.log_request(&LogEntry::new(log.now_utc(), "GET", "/api/banks", 500, 1));

        let lines = sink.lines();
        assert_eq!(2, lines.len());
        let first: LogEntry = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!("/health", first.path());
        let second: LogEntry = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(500, *second.status_code());
    }

    #[test]
    fn test_log_error_builds_minimal_entry() {
        let sink = MemorySink::default();
        let log = AccessLog::with_sink(Box::new(sink.clone()), test_clock());

        log.log_error("PUT", "/api/credits/4", "pgsql error 08006: connection failure");

        let lines = sink.lines();
        assert_eq!(1, lines.len());
        let entry: LogEntry = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(
            LogEntry::new(datetime!(2024-03-05 13:14:15 UTC), "PUT", "/api/credits/4", 0, 0)
                .with_error("pgsql error 08006: connection failure"),
            entry
        );
    }

    #[test]
    fn test_disabled_log_is_a_no_op() {
        let log = AccessLog::disabled(test_clock());
        log.log_request(&LogEntry::new(log.now_utc(), "GET", "/health", 200, 0));
        log.log_error("GET", "/health", "ignored");
        log.close();
    }

    #[test]
    fn test_close_stops_logging() {
        let sink = MemorySink::default();
        let log = AccessLog::with_sink(Box::new(sink.clone()), test_clock());

        log.log_request(&LogEntry::new(log.now_utc(), "GET", "/health", 200, 0));
        log.close();
        log.log_request(&LogEntry::new(log.now_utc(), "GET", "/health", 200, 0));
        log.close();

        assert_eq!(1, sink.lines().len());
    }

    #[test]
    fn test_open_daily_creates_dir_and_appends() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("logs");

        {
            let log = AccessLog::open_daily(&dir, test_clock()).unwrap();
            log.log_request(&LogEntry::new(log.now_utc(), "GET", "/health", 200, 1));
        }
        {
            let log = AccessLog::open_daily(&dir, test_clock()).unwrap();
            log.log_request(&LogEntry::new(log.now_utc(), "GET", "/api/items", 200, 2));
            log.close();
        }

        let contents = fs::read_to_string(dir.join("api_2024-03-05.log")).unwrap();
        let paths = contents
            .lines()
            .map(|line| serde_json::from_str::<LogEntry>(line).unwrap().path().clone())
            .collect::<Vec<String>>();
        assert_eq!(vec!["/health".to_owned(), "/api/items".to_owned()], paths);
    }

    #[test]
    fn test_open_daily_fails_when_dir_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        match AccessLog::open_daily(&file, test_clock()) {
            Err(AccessLogError::CreateDir(path, _)) => assert!(path.contains("not-a-dir")),
            Err(e) => panic!("Unexpected error {}", e),
            Ok(_) => panic!("Must have failed"),
        }
    }
}
