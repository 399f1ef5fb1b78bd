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

//! API to create a new client.

use crate::driver::Driver;
use crate::model::{Client, ClientRequest};
use axum::extract::State;
use axum::{Json, http};
use creditline_core::rest::{JsonBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<ClientRequest>,
) -> Result<(http::StatusCode, Json<Client>), RestError> {
    let client = driver.create_client(request).await?;
    Ok((http::StatusCode::CREATED, Json(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use creditline_core::rest::testutils::*;
    use time::macros::date;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/clients".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let request = serde_json::json!({
            "full_name": "John Doe",
            "email": "john@example.com",
            "birth_date": "1990-12-25",
            "country": "Mexico",
        });
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<Client>()
            .await;
        assert_eq!("John Doe", response.full_name());
        assert_eq!(date!(1990 - 12 - 25), *response.birth_date());

        assert_eq!(Some(response.clone()), context.get_client(*response.id()).await);
    }

    #[tokio::test]
    async fn test_birth_date_as_timestamp() {
        let context = TestContext::setup().await;

        let request = serde_json::json!({
            "full_name": "John Doe",
            "email": "john.doe@example.com",
            "birth_date": "1990-01-01T00:00:00Z",
            "country": "USA",
        });
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!("1990-01-01T00:00:00Z", response["birth_date"]);

        let id = response["id"].as_i64().unwrap();
        let client = context.get_client(id).await.unwrap();
        assert_eq!(date!(1990 - 01 - 01), *client.birth_date());
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let context = TestContext::setup().await;

        let request = serde_json::json!({"full_name": "John Doe", "email": "john@example.com"});
        OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^Invalid request body$")
            .await;
    }

    #[tokio::test]
    async fn test_bad_birth_date() {
        let context = TestContext::setup().await;

        let request = serde_json::json!({
            "full_name": "John Doe",
            "email": "john@example.com",
            "birth_date": "25/12/1990",
            "country": "Mexico",
        });
        OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^Invalid request body$")
            .await;
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let context = TestContext::setup().await;

        let client = context.create_client(1).await;

        let request = serde_json::json!({
            "full_name": "Someone else",
            "email": client.email(),
            "birth_date": "2001-01-01",
            "country": "Mexico",
        });
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_error("^Database error$")
            .await;

        let entries = context.log_entries();
        assert_eq!(2, entries.len());
        assert!(entries[0].error().is_some());
        assert_eq!(500, *entries[1].status_code());
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route());
}
