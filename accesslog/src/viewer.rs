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

//! Analysis of previously written access log files.

use crate::{LogEntry, format_console_timestamp, status_color};
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum number of paths reported by `compute_stats`.
const TOP_PATHS: usize = 10;

/// Errors while locating or reading log files.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The directory does not contain any log file.
    #[error("No log files found in {0}")]
    NoLogFiles(String),

    /// Generic I/O failure while accessing a path.
    #[error("{0}: {1}")]
    Io(String, io::Error),
}

/// Result type for this module.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Finds the newest `api_*.log` file in `dir`.
///
/// Log files carry their date in ISO format so the lexicographically last name is the newest.
pub fn find_latest_log_file(dir: &Path) -> ViewerResult<PathBuf> {
    let mut latest: Option<String> = None;
    let entries = fs::read_dir(dir).map_err(|e| ViewerError::Io(dir.display().to_string(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ViewerError::Io(dir.display().to_string(), e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.starts_with("api_") || !name.ends_with(".log") {
            continue;
        }
        if latest.as_ref().is_none_or(|current| name > *current) {
            latest = Some(name);
        }
    }
    match latest {
        Some(name) => Ok(dir.join(name)),
        None => Err(ViewerError::NoLogFiles(dir.display().to_string())),
    }
}

/// Parses all entries in the contents of a log file, skipping blank and malformed lines.
pub fn parse_entries(contents: &str) -> Vec<LogEntry> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

/// Reads all entries from the log file at `path`.
pub fn read_entries(path: &Path) -> ViewerResult<Vec<LogEntry>> {
    let contents =
        fs::read_to_string(path).map_err(|e| ViewerError::Io(path.display().to_string(), e))?;
    Ok(parse_entries(&contents))
}

/// Returns the last `n` entries.
pub fn latest(entries: &[LogEntry], n: usize) -> &[LogEntry] {
    &entries[entries.len().saturating_sub(n)..]
}

/// Returns the entries that represent failed requests or internal errors.
pub fn errors(entries: &[LogEntry]) -> Vec<&LogEntry> {
    entries.iter().filter(|e| e.status_code >= 400 || e.error.is_some()).collect()
}

/// Returns the entries whose path contains `needle`.
pub fn filter_by_path<'a>(entries: &'a [LogEntry], needle: &str) -> Vec<&'a LogEntry> {
    entries.iter().filter(|e| e.path.contains(needle)).collect()
}

/// Aggregated statistics over a collection of entries.
#[derive(Debug, PartialEq)]
pub struct Stats {
    /// Number of entries analyzed.
    pub total: usize,

    /// Number of entries per status code.
    pub by_status: BTreeMap<u16, usize>,

    /// Number of entries per method.
    pub by_method: BTreeMap<String, usize>,

    /// Most requested paths, most popular first.
    pub top_paths: Vec<(String, usize)>,

    /// Mean response time, truncated to whole milliseconds.
    pub avg_response_time_ms: u64,
}

/// Computes statistics over `entries`, or returns `None` if there are none.
pub fn compute_stats(entries: &[LogEntry]) -> Option<Stats> {
    if entries.is_empty() {
        return None;
    }

    let mut by_status = BTreeMap::default();
    let mut by_method = BTreeMap::default();
    let mut by_path: BTreeMap<String, usize> = BTreeMap::default();
    let mut total_ms: u64 = 0;
    for entry in entries {
        *by_status.entry(entry.status_code).or_insert(0) += 1;
        *by_method.entry(entry.method.clone()).or_insert(0) += 1;
        *by_path.entry(entry.path.clone()).or_insert(0) += 1;
        total_ms = total_ms.saturating_add(entry.response_time_ms);
    }

    let mut top_paths: Vec<(String, usize)> = by_path.into_iter().collect();
    top_paths.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_paths.truncate(TOP_PATHS);

    let total = entries.len();
    Some(Stats {
        total,
        by_status,
        by_method,
        top_paths,
        avg_response_time_ms: total_ms / total as u64,
    })
}

/// Formats a detailed line for `entry`, plus an error line if it carries one.
pub fn format_entry(entry: &LogEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} [{}] {} {} ({}ms)",
        format_console_timestamp(entry.timestamp),
        entry.method,
        entry.path,
        entry.status_code.to_string().color(status_color(entry.status_code)),
        entry.response_time_ms
    )];
    if let Some(error) = &entry.error {
        lines.push(format!("  Error: {}", error));
    }
    lines
}

/// Formats a compact line for an error `entry`, plus its error message if it has one.
pub fn format_error_entry(entry: &LogEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} [{}] {} - {}",
        format_console_timestamp(entry.timestamp),
        entry.method,
        entry.path,
        entry.status_code
    )];
    if let Some(error) = &entry.error {
        lines.push(format!("  Error: {}", error));
    }
    lines
}

/// Computes `count` as a percentage of `total`.
fn percentage(count: usize, total: usize) -> f64 {
    count as f64 / total as f64 * 100.0
}

/// Formats the statistics report.
pub fn format_stats(stats: &Stats) -> Vec<String> {
    let mut lines = vec![
        format!("API Request Statistics ({} total requests)", stats.total),
        "=".repeat(50),
        String::new(),
        "Status Code Distribution:".to_owned(),
    ];
    for (status, count) in &stats.by_status {
        lines.push(format!("  {}: {} ({:.1}%)", status, count, percentage(*count, stats.total)));
    }

    lines.push(String::new());
    lines.push("Method Distribution:".to_owned());
    for (method, count) in &stats.by_method {
        lines.push(format!("  {}: {} ({:.1}%)", method, count, percentage(*count, stats.total)));
    }

    lines.push(String::new());
    lines.push("Top Endpoints:".to_owned());
    for (path, count) in &stats.top_paths {
        lines.push(format!("  {}: {} ({:.1}%)", path, count, percentage(*count, stats.total)));
    }

    lines.push(String::new());
    lines.push(format!("Average Response Time: {}ms", stats.avg_response_time_ms));
    lines
}
