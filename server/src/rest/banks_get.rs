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

//! API to list all banks.

use crate::driver::Driver;
use crate::model::Bank;
use axum::Json;
use axum::extract::State;
use creditline_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(State(driver): State<Driver>) -> Result<Json<Vec<Bank>>, RestError> {
    let banks = driver.list_banks().await?;
    Ok(Json(banks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use creditline_core::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/banks".to_owned())
    }

    #[tokio::test]
    async fn test_newest_first() {
        let context = TestContext::setup().await;

        let bank1 = context.create_bank(1).await;
        let bank2 = context.create_bank(2).await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<Bank>>()
            .await;
        assert_eq!(vec![bank2, bank1], response);
    }

    #[tokio::test]
    async fn test_type_key() {
        let context = TestContext::setup().await;

        context.create_bank(1).await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .take_body_as_text()
            .await;
        assert!(response.contains(r#""type":"PRIVATE""#), "{}", response);
    }
}
