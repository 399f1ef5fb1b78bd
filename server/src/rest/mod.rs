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

//! Entry point to the REST server.

use crate::driver::Driver;
use axum::Router;
use creditline_accesslog::{AccessLog, log_requests};
use creditline_core::rest::{RestError, RestResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod bank_credits_get;
mod bank_delete;
mod bank_get;
mod bank_put;
mod banks_get;
mod banks_post;
mod client_credits_get;
mod client_delete;
mod client_get;
mod client_put;
mod clients_get;
mod clients_post;
mod credit_delete;
mod credit_get;
mod credit_put;
mod credits_get;
mod credits_post;
mod health_get;
mod item_get;
mod items_get;
mod items_post;
#[cfg(test)]
mod testutils;

/// Body returned by the APIs that delete entities.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct MessageResponse {
    /// Human-readable description of the outcome.
    pub(crate) message: String,
}

impl MessageResponse {
    /// Creates a new response carrying `message`.
    pub(crate) fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }
}

/// Parses the textual identifier `id` taken from a request path.
///
/// `message` is returned to the caller as is if the identifier is not numeric.
pub(crate) fn parse_id(id: &str, message: &'static str) -> RestResult<i64> {
    id.parse::<i64>().map_err(|_| RestError::InvalidRequest(message.to_owned()))
}

/// Creates the router for the application.
///
/// All requests, including those that do not match any route, are recorded in `access_log`.
pub(crate) fn app(driver: Driver, access_log: Arc<AccessLog>) -> Router {
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;

    // Nested routes must name their parameters like their parents, so the relationship lists
    // receive the owner's identifier as `:id` too.
    Router::new()
        .route("/health", get(health_get::handler))
        .route("/api/items", get(items_get::handler).post(items_post::handler))
        .route("/api/items/:id", get(item_get::handler))
        .route("/api/clients", get(clients_get::handler).post(clients_post::handler))
        .route(
            "/api/clients/:id",
            get(client_get::handler).put(client_put::handler).delete(client_delete::handler),
        )
        .route("/api/clients/:id/credits", get(client_credits_get::handler))
        .route("/api/banks", get(banks_get::handler).post(banks_post::handler))
        .route(
            "/api/banks/:id",
            get(bank_get::handler).put(bank_put::handler).delete(bank_delete::handler),
        )
        .route("/api/banks/:id/credits", get(bank_credits_get::handler))
        .route("/api/credits", get(credits_get::handler).post(credits_post::handler))
        .route(
            "/api/credits/:id",
            get(credit_get::handler).put(credit_put::handler).delete(credit_delete::handler),
        )
        .with_state(driver)
        .layer(from_fn_with_state(access_log, log_requests))
}
