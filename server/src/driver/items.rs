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

//! Extends the driver with the operations on items.

use crate::db;
use crate::driver::Driver;
use crate::model::{Item, ItemRequest};
use creditline_core::db::DbError;
use creditline_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Gets all items, newest first.
    pub(crate) async fn list_items(self) -> DriverResult<Vec<Item>> {
        Ok(db::list_items(&mut self.db.ex().await?).await?)
    }

    /// Gets the item identified by `id`.
    pub(crate) async fn get_item(self, id: i64) -> DriverResult<Item> {
        match db::get_item(&mut self.db.ex().await?, id).await {
            Ok(item) => Ok(item),
            Err(DbError::NotFound) => Err(DriverError::NotFound("Item not found".to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a new item.  Items carry no validation rules.
    pub(crate) async fn create_item(self, request: ItemRequest) -> DriverResult<Item> {
        let now = self.clock.now_utc();
        Ok(db::create_item(&mut self.db.ex().await?, &request, now).await?)
    }
}
