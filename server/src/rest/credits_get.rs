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

//! API to list all credits.

use crate::driver::Driver;
use crate::model::Credit;
use axum::Json;
use axum::extract::State;
use creditline_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(State(driver): State<Driver>) -> Result<Json<Vec<Credit>>, RestError> {
    let credits = driver.list_credits().await?;
    Ok(Json(credits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use creditline_core::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/credits".to_owned())
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .send_empty()
            .await
            .take_body_as_text()
            .await;
        assert_eq!("[]", response);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let context = TestContext::setup().await;

        let client = context.create_client(1).await;
        let bank = context.create_bank(2).await;
        let credit1 = context.create_credit(10, &client, &bank).await;
        let credit2 = context.create_credit(20, &client, &bank).await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<Credit>>()
            .await;
        assert_eq!(vec![credit2, credit1], response);
    }

    #[tokio::test]
    async fn test_database_error() {
        let context = TestContext::setup().await;
        context.break_table("credits").await;

        OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_error("^Database error$")
            .await;

        let entries = context.log_entries();
        assert_eq!(2, entries.len());
        assert_eq!("/api/credits", entries[0].path());
        assert!(entries[0].error().as_deref().unwrap_or_default().contains("credits"));
    }
}
