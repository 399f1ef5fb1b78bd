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

//! API to list the credits granted by a bank.

use crate::driver::Driver;
use crate::model::Credit;
use crate::rest::parse_id;
use axum::Json;
use axum::extract::{Path, State};
use creditline_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(bank_id): Path<String>,
) -> Result<Json<Vec<Credit>>, RestError> {
    let bank_id = parse_id(&bank_id, "Invalid bank ID")?;
    let credits = driver.list_bank_credits(bank_id).await?;
    Ok(Json(credits))
}
