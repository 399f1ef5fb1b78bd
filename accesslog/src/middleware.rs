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

//! Middleware that records every request in the access log.

use crate::{AccessLog, LogEntry};
use axum::body::{Body, HttpBody};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::http::header::{AsHeaderName, USER_AGENT};
use axum::middleware::Next;
use axum::response::Response;
use creditline_core::rest::{ErrorDetail, get_unique_header};
use log::warn;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Largest request payload, exclusive, that is copied into the log.
const MAX_CAPTURED_BODY_SIZE: u64 = 10 * 1024;

/// Name of the header that carries a caller-provided request identifier.
const REQUEST_ID: &str = "x-request-id";

/// Gets the single value of the header `name` as a string, ignoring malformed values.
fn header_string<K: AsHeaderName + Copy>(headers: &HeaderMap, name: K) -> Option<String> {
    get_unique_header(headers, name)
        .ok()
        .flatten()
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Returns the exact size of `body` if known and non-zero.
fn exact_size<B: HttpBody>(body: &B) -> Option<u64> {
    body.size_hint().exact().filter(|size| *size > 0)
}

/// Reads the payload of `request` if it is small enough to be logged and returns a new request
/// that carries the same payload for the handler.
async fn capture_body(request: Request) -> (Request, Option<String>) {
    match exact_size(request.body()) {
        Some(size) if size < MAX_CAPTURED_BODY_SIZE => (),
        _ => return (request, None),
    }

    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, MAX_CAPTURED_BODY_SIZE as usize).await {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            (Request::from_parts(parts, Body::from(bytes)), Some(text))
        }
        Err(e) => {
            warn!("Failed to read request body for logging: {}", e);
            (Request::from_parts(parts, Body::empty()), None)
        }
    }
}

/// Axum middleware that records the outcome of every request in the `AccessLog` given as state.
///
/// Internal error details attached to the response as `ErrorDetail` extensions are removed from
/// the response and recorded as separate error entries.
pub async fn log_requests(
    State(log): State<Arc<AccessLog>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let timestamp = log.now_utc();

    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let user_agent = header_string(request.headers(), &USER_AGENT);
    let request_id = header_string(request.headers(), REQUEST_ID);
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    let (request, request_body) = capture_body(request).await;

    let mut response = next.run(request).await;

    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    if let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() {
        log.log_error(&method, &path, &detail);
    }

    let entry = LogEntry::new(timestamp, method, path, response.status().as_u16(), elapsed_ms)
        .with_user_agent(user_agent)
        .with_remote_addr(remote_addr)
        .with_request_id(request_id)
        .with_request_body(request_body)
        .with_response_size(exact_size(response.body()));
    log.log_request(&entry);

    response
}
