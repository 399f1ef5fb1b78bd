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

//! Command-line viewer for the API access logs.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use clap::{Parser, Subcommand};
use creditline_accesslog::viewer::{self, ViewerResult};
use std::path::PathBuf;
use std::process;

/// Inspects the most recent API access log.
#[derive(Parser, Debug)]
#[command(name = "view-logs", version, about, long_about = None)]
struct Cli {
    /// Directory that contains the `api_*.log` files.
    #[arg(long, default_value = "logs")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Show the latest entries.
    Latest {
        /// Number of entries to show.
        #[arg(default_value_t = 10)]
        count: usize,
    },

    /// Show only failed requests and internal errors.
    Errors,

    /// Show request statistics.
    Stats,

    /// Show entries whose path contains a substring.
    Filter {
        /// Substring to look for in the request paths.
        path: String,
    },
}

/// Prints all `lines` to stdout.
fn print_lines<I: IntoIterator<Item = String>>(lines: I) {
    for line in lines {
        println!("{}", line);
    }
}

/// Executes the subcommand requested in `cli`.
fn run(cli: Cli) -> ViewerResult<()> {
    let path = viewer::find_latest_log_file(&cli.dir)?;
    let entries = viewer::read_entries(&path)?;

    match cli.command {
        Command::Latest { count } => {
            println!("Latest {} log entries:", count);
            println!("{}", "-".repeat(80));
            for entry in viewer::latest(&entries, count) {
                print_lines(viewer::format_entry(entry));
            }
        }

        Command::Errors => {
            println!("Error entries:");
            println!("{}", "-".repeat(80));
            for entry in viewer::errors(&entries) {
                print_lines(viewer::format_error_entry(entry));
            }
        }

        Command::Stats => match viewer::compute_stats(&entries) {
            Some(stats) => print_lines(viewer::format_stats(&stats)),
            None => println!("No log entries found"),
        },

        Command::Filter { path } => {
            println!("Entries for path containing '{}':", path);
            println!("{}", "-".repeat(80));
            for entry in viewer::filter_by_path(&entries, &path) {
                print_lines(viewer::format_entry(entry));
            }
        }
    }

    Ok(())
}

/// Program's entry point.
fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("view-logs: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["view-logs", "latest"]).unwrap();
        assert_eq!(PathBuf::from("logs"), cli.dir);
        match cli.command {
            Command::Latest { count } => assert_eq!(10, count),
            c => panic!("Unexpected command {:?}", c),
        }
    }

    #[test]
    fn test_cli_filter_requires_path() {
        Cli::try_parse_from(["view-logs", "filter"]).unwrap_err();

        let cli = Cli::try_parse_from(["view-logs", "--dir", "/tmp/x", "filter", "/api"]).unwrap();
        assert_eq!(PathBuf::from("/tmp/x"), cli.dir);
        match cli.command {
            Command::Filter { path } => assert_eq!("/api", path),
            c => panic!("Unexpected command {:?}", c),
        }
    }

    #[test]
    fn test_run_fails_without_logs() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli { dir: dir.path().to_owned(), command: Command::Stats };
        run(cli).unwrap_err();
    }
}
