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

//! API to get one bank.

use crate::driver::Driver;
use crate::model::Bank;
use crate::rest::parse_id;
use axum::Json;
use axum::extract::{Path, State};
use creditline_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
) -> Result<Json<Bank>, RestError> {
    let id = parse_id(&id, "Invalid ID")?;
    let bank = driver.get_bank(id).await?;
    Ok(Json(bank))
}
