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

//! Extends the driver with the operations on clients.

use crate::db;
use crate::driver::Driver;
use crate::model::{Client, ClientRequest};
use creditline_core::db::DbError;
use creditline_core::driver::{DriverError, DriverResult};

/// Rewrites a generic not-found database error into one that names clients.
fn not_found(e: DbError) -> DriverError {
    match e {
        DbError::NotFound => DriverError::NotFound("Client not found".to_owned()),
        e => e.into(),
    }
}

impl Driver {
    /// Gets all clients, newest first.
    pub(crate) async fn list_clients(self) -> DriverResult<Vec<Client>> {
        Ok(db::list_clients(&mut self.db.ex().await?).await?)
    }

    /// Gets the client identified by `id`.
    pub(crate) async fn get_client(self, id: i64) -> DriverResult<Client> {
        db::get_client(&mut self.db.ex().await?, id).await.map_err(not_found)
    }

    /// Creates a new client.
    pub(crate) async fn create_client(self, request: ClientRequest) -> DriverResult<Client> {
        let now = self.clock.now_utc();
        Ok(db::create_client(&mut self.db.ex().await?, &request, now).await?)
    }

    /// Replaces the details of the client identified by `id` and returns the stored result.
    pub(crate) async fn update_client(
        self,
        id: i64,
        request: ClientRequest,
    ) -> DriverResult<Client> {
        let mut tx = self.db.begin().await?;
        db::update_client(tx.ex(), id, &request).await.map_err(not_found)?;
        let client = db::get_client(tx.ex(), id).await.map_err(not_found)?;
        tx.commit().await?;
        Ok(client)
    }

    /// Deletes the client identified by `id` together with all of its credits.
    pub(crate) async fn delete_client(self, id: i64) -> DriverResult<()> {
        db::delete_client(&mut self.db.ex().await?, id).await.map_err(not_found)
    }
}
