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

//! Extends the driver with the operations on banks.

use crate::db;
use crate::driver::Driver;
use crate::driver::validation::validate_bank_type;
use crate::model::{Bank, BankRequest};
use creditline_core::db::DbError;
use creditline_core::driver::{DriverError, DriverResult};

/// Rewrites a generic not-found database error into one that names banks.
fn not_found(e: DbError) -> DriverError {
    match e {
        DbError::NotFound => DriverError::NotFound("Bank not found".to_owned()),
        e => e.into(),
    }
}

impl Driver {
    /// Gets all banks, newest first.
    pub(crate) async fn list_banks(self) -> DriverResult<Vec<Bank>> {
        Ok(db::list_banks(&mut self.db.ex().await?).await?)
    }

    /// Gets the bank identified by `id`.
    pub(crate) async fn get_bank(self, id: i64) -> DriverResult<Bank> {
        db::get_bank(&mut self.db.ex().await?, id).await.map_err(not_found)
    }

    /// Creates a new bank after validating its type.
    pub(crate) async fn create_bank(self, request: BankRequest) -> DriverResult<Bank> {
        let bank_type = validate_bank_type(&request.bank_type)?;

        let now = self.clock.now_utc();
        Ok(db::create_bank(&mut self.db.ex().await?, &request.name, bank_type, now).await?)
    }

    /// Replaces the details of the bank identified by `id` and returns the stored result.
    pub(crate) async fn update_bank(self, id: i64, request: BankRequest) -> DriverResult<Bank> {
        let bank_type = validate_bank_type(&request.bank_type)?;

        let mut tx = self.db.begin().await?;
        db::update_bank(tx.ex(), id, &request.name, bank_type).await.map_err(not_found)?;
        let bank = db::get_bank(tx.ex(), id).await.map_err(not_found)?;
        tx.commit().await?;
        Ok(bank)
    }

    /// Deletes the bank identified by `id` together with all of its credits.
    pub(crate) async fn delete_bank(self, id: i64) -> DriverResult<()> {
        db::delete_bank(&mut self.db.ex().await?, id).await.map_err(not_found)
    }
}
