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

//! REST service to manage items, clients, banks and the credits that link them.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

#[cfg(feature = "postgres")]
use {
    creditline_accesslog::AccessLog,
    creditline_core::clocks::{Clock, SystemClock},
    creditline_core::db::Db,
    creditline_core::db::postgres::{PostgresDb, PostgresOptions},
    creditline_core::env::get_optional_var,
    db::init_schema,
    driver::Driver,
    log::{info, warn},
    std::error::Error,
    std::net::{Ipv4Addr, SocketAddr},
    std::path::{Path, PathBuf},
    std::sync::Arc,
};

pub mod db;
pub mod driver;
pub mod model;
mod rest;

/// Port to listen on when `PORT` is not set.
#[cfg(feature = "postgres")]
const DEFAULT_PORT: u16 = 8080;

/// Directory to write the access logs to when `LOGS_DIR` is not set.
#[cfg(feature = "postgres")]
const DEFAULT_LOGS_DIR: &str = "logs";

/// Runtime configuration of the service.
#[cfg(feature = "postgres")]
#[derive(Debug)]
pub struct Config {
    /// Port to listen on.  The service binds to all interfaces.
    pub port: u16,

    /// Directory where the daily access logs are written.
    pub logs_dir: PathBuf,

    /// Options to connect to the database.
    pub db_opts: PostgresOptions,
}

#[cfg(feature = "postgres")]
impl Config {
    /// Loads the configuration from `PORT`, `LOGS_DIR` and the `DATABASE_*` variables.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: get_optional_var::<u16>("", "PORT")?.unwrap_or(DEFAULT_PORT),
            logs_dir: get_optional_var::<PathBuf>("", "LOGS_DIR")?
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIR)),
            db_opts: PostgresOptions::from_env("DATABASE")?,
        })
    }
}

/// Waits until the process is asked to terminate.
#[cfg(feature = "postgres")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for termination signals: {}", e);
        futures::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Runs the service on top of an already-connected `db` until a termination signal arrives.
#[cfg(feature = "postgres")]
async fn run(
    db: Arc<dyn Db + Send + Sync>,
    port: u16,
    logs_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    init_schema(&mut db.ex().await?).await?;

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock::default());
    let access_log = Arc::new(AccessLog::open_daily(logs_dir, clock.clone())?);

    let driver = Driver::new(db, clock);
    let app = rest::app(driver, access_log.clone());

    let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    access_log.close();
    Ok(result?)
}

/// Instantiates all resources to serve the application as described by `config`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
#[cfg(feature = "postgres")]
pub async fn serve(config: Config) -> Result<(), Box<dyn Error>> {
    let db: Arc<dyn Db + Send + Sync> = Arc::new(PostgresDb::connect(config.db_opts).await?);
    let result = run(db.clone(), config.port, &config.logs_dir).await;
    db.close().await;
    result
}
