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

//! API to create a new item.

use crate::driver::Driver;
use crate::model::{Item, ItemRequest};
use axum::extract::State;
use axum::{Json, http};
use creditline_core::rest::{JsonBody, RestError};

/// API handler.  Items report malformed payloads with a shorter message than other entities.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    body: Result<JsonBody<ItemRequest>, RestError>,
) -> Result<(http::StatusCode, Json<Item>), RestError> {
    let JsonBody(request) =
        body.map_err(|_| RestError::InvalidRequest("Invalid request".to_owned()))?;
    let item = driver.create_item(request).await?;
    Ok((http::StatusCode::CREATED, Json(item)))
}
