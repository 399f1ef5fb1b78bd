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

//! Test utilities for the business logic.

use crate::db;
use crate::driver::Driver;
use crate::model::{
    Bank, BankType, Client, ClientRequest, Credit, CreditData, CreditStatus, CreditType,
};
use creditline_core::clocks::Clock;
use creditline_core::clocks::testutils::MonotonicClock;
use creditline_core::db::{Db, Executor};
use std::sync::Arc;
use time::macros::date;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a monotonic clock.
    pub(crate) async fn setup() -> Self {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(creditline_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new(100000));
        let driver = Driver::new(db.clone(), clock);
        Self { db, driver }
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Creates a client with an email address derived from `name` directly in the database.
    pub(crate) async fn create_client(&self, name: &str) -> Client {
        let request = ClientRequest {
            full_name: name.to_owned(),
            email: format!("{}@example.com", name),
            birth_date: date!(1985 - 03 - 04),
            country: "Argentina".to_owned(),
        };
        db::create_client(&mut self.ex().await, &request, self.driver.now_utc()).await.unwrap()
    }

    /// Creates a private bank named `name` directly in the database.
    pub(crate) async fn create_bank(&self, name: &str) -> Bank {
        db::create_bank(&mut self.ex().await, name, BankType::Private, self.driver.now_utc())
            .await
            .unwrap()
    }

    /// Creates a pending auto credit between `client` and `bank` directly in the database.
    pub(crate) async fn create_credit(&self, client: &Client, bank: &Bank) -> Credit {
        let data = CreditData {
            client_id: *client.id(),
            bank_id: *bank.id(),
            min_payment: 100.0,
            max_payment: 1000.0,
            term_months: 36,
            credit_type: CreditType::Auto,
            status: CreditStatus::Pending,
        };
        db::create_credit(&mut self.ex().await, data, self.driver.now_utc()).await.unwrap()
    }
}
