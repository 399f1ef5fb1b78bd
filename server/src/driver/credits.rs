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

//! Extends the driver with the operations on credits.

use crate::db;
use crate::driver::Driver;
use crate::driver::validation::validate_credit;
use crate::model::{Credit, CreditRequest};
use creditline_core::db::DbError;
use creditline_core::driver::{DriverError, DriverResult};

/// Rewrites a generic not-found database error into one that names credits.
fn not_found(e: DbError) -> DriverError {
    match e {
        DbError::NotFound => DriverError::NotFound("Credit not found".to_owned()),
        e => e.into(),
    }
}

impl Driver {
    /// Gets all credits, newest first.
    pub(crate) async fn list_credits(self) -> DriverResult<Vec<Credit>> {
        Ok(db::list_credits(&mut self.db.ex().await?).await?)
    }

    /// Gets all credits of the client `client_id`, which need not exist.
    pub(crate) async fn list_client_credits(self, client_id: i64) -> DriverResult<Vec<Credit>> {
        Ok(db::list_credits_by_client(&mut self.db.ex().await?, client_id).await?)
    }

    /// Gets all credits granted by the bank `bank_id`, which need not exist.
    pub(crate) async fn list_bank_credits(self, bank_id: i64) -> DriverResult<Vec<Credit>> {
        Ok(db::list_credits_by_bank(&mut self.db.ex().await?, bank_id).await?)
    }

    /// Gets the credit identified by `id`.
    pub(crate) async fn get_credit(self, id: i64) -> DriverResult<Credit> {
        db::get_credit(&mut self.db.ex().await?, id).await.map_err(not_found)
    }

    /// Creates a new credit.  A missing status makes the credit start as pending.
    ///
    /// Referencing a client or a bank that does not exist is reported as a backend error because
    /// it is the database that detects the violation.
    pub(crate) async fn create_credit(self, request: CreditRequest) -> DriverResult<Credit> {
        let data = validate_credit(&request, true)?;

        let now = self.clock.now_utc();
        Ok(db::create_credit(&mut self.db.ex().await?, data, now).await?)
    }

    /// Replaces the details of the credit identified by `id` and returns the stored result.
    ///
    /// Unlike creation, updates must always carry an explicit status.
    pub(crate) async fn update_credit(
        self,
        id: i64,
        request: CreditRequest,
    ) -> DriverResult<Credit> {
        let data = validate_credit(&request, false)?;

        let mut tx = self.db.begin().await?;
        db::update_credit(tx.ex(), id, &data).await.map_err(not_found)?;
        let credit = db::get_credit(tx.ex(), id).await.map_err(not_found)?;
        tx.commit().await?;
        Ok(credit)
    }

    /// Deletes the credit identified by `id`.
    pub(crate) async fn delete_credit(self, id: i64) -> DriverResult<()> {
        db::delete_credit(&mut self.db.ex().await?, id).await.map_err(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::model::{Bank, Client, CreditStatus, CreditType};

    fn request(client: &Client, bank: &Bank) -> CreditRequest {
        CreditRequest {
            client_id: *client.id(),
            bank_id: *bank.id(),
            min_payment: 150.0,
            max_payment: 900.0,
            term_months: 48,
            credit_type: "MORTGAGE".to_owned(),
            status: "".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_create_credit_defaults_to_pending() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;

        let credit = context.driver().create_credit(request(&client, &bank)).await.unwrap();
        assert_eq!(CreditStatus::Pending, *credit.status());
        assert_eq!(CreditType::Mortgage, *credit.credit_type());
        assert_eq!(48, *credit.term_months());

        assert_eq!(credit, context.driver().get_credit(*credit.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_credit_explicit_status() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;

        let request = CreditRequest { status: "APPROVED".to_owned(), ..request(&client, &bank) };
        let credit = context.driver().create_credit(request).await.unwrap();
        assert_eq!(CreditStatus::Approved, *credit.status());
    }

    #[tokio::test]
    async fn test_create_credit_invalid_amounts() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;

        let request =
            CreditRequest { min_payment: 1000.0, max_payment: 100.0, ..request(&client, &bank) };
        match context.driver().create_credit(request).await {
            Err(DriverError::InvalidInput(msg)) => assert_eq!(
                "Invalid payment amounts. Min and max must be positive, and min must be <= max",
                msg
            ),
            e => panic!("{:?}", e),
        }
        assert!(context.driver().list_credits().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_credit_unknown_bank() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;

        let request = CreditRequest { bank_id: *bank.id() + 100, ..request(&client, &bank) };
        match context.driver().create_credit(request).await {
            Err(DriverError::BackendError(_)) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_update_credit_ok() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;
        let credit = context.create_credit(&client, &bank).await;

        let request = CreditRequest {
            status: "REJECTED".to_owned(),
            credit_type: "COMMERCIAL".to_owned(),
            ..request(&client, &bank)
        };
        let updated = context.driver().update_credit(*credit.id(), request).await.unwrap();
        assert_eq!(credit.id(), updated.id());
        assert_eq!(credit.created_at(), updated.created_at());
        assert_eq!(CreditStatus::Rejected, *updated.status());
        assert_eq!(CreditType::Commercial, *updated.credit_type());
        assert_eq!(900.0, *updated.max_payment());
    }

    #[tokio::test]
    async fn test_update_credit_requires_status() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;
        let credit = context.create_credit(&client, &bank).await;

        match context.driver().update_credit(*credit.id(), request(&client, &bank)).await {
            Err(DriverError::InvalidInput(msg)) => {
                assert_eq!("Invalid status. Must be PENDING, APPROVED, or REJECTED", msg)
            }
            e => panic!("{:?}", e),
        }
        assert_eq!(credit, context.driver().get_credit(*credit.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_and_delete_credit_not_found() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;

        let request = CreditRequest { status: "PENDING".to_owned(), ..request(&client, &bank) };
        match context.driver().update_credit(7, request).await {
            Err(DriverError::NotFound(msg)) => assert_eq!("Credit not found", msg),
            e => panic!("{:?}", e),
        }
        match context.driver().delete_credit(7).await {
            Err(DriverError::NotFound(msg)) => assert_eq!("Credit not found", msg),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_list_credits_by_owner() {
        let context = TestContext::setup().await;

        let client1 = context.create_client("c1").await;
        let client2 = context.create_client("c2").await;
        let bank = context.create_bank("b").await;
        let credit1 = context.create_credit(&client1, &bank).await;
        let credit2 = context.create_credit(&client2, &bank).await;
        let credit3 = context.create_credit(&client1, &bank).await;

        assert_eq!(
            vec![credit3.clone(), credit1.clone()],
            context.driver().list_client_credits(*client1.id()).await.unwrap()
        );
        assert_eq!(
            vec![credit3.clone(), credit2.clone(), credit1.clone()],
            context.driver().list_bank_credits(*bank.id()).await.unwrap()
        );
        assert!(context.driver().list_client_credits(999).await.unwrap().is_empty());
        assert!(context.driver().list_bank_credits(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_credit_ok() {
        let context = TestContext::setup().await;

        let client = context.create_client("c").await;
        let bank = context.create_bank("b").await;
        let credit = context.create_credit(&client, &bank).await;

        context.driver().delete_credit(*credit.id()).await.unwrap();
        assert!(context.driver().list_credits().await.unwrap().is_empty());
        assert_eq!(client, context.driver().get_client(*client.id()).await.unwrap());
    }
}
