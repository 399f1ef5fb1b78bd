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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use crate::rest::app;
use axum::Router;
use creditline_accesslog::testutils::MemorySink;
use creditline_accesslog::{AccessLog, LogEntry};
use creditline_core::clocks::Clock;
use creditline_core::clocks::testutils::MonotonicClock;
use creditline_core::db::{Db, DbError, Executor};
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    app: Router,
    log_sink: MemorySink,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(creditline_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new(100000));

        let log_sink = MemorySink::default();
        let access_log = Arc::new(AccessLog::with_sink(Box::new(log_sink.clone()), clock.clone()));

        let driver = Driver::new(db.clone(), clock);
        let app = app(driver, access_log);
        Self { db, app, log_sink }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Returns all entries written to the access log so far.
    pub(crate) fn log_entries(&self) -> Vec<LogEntry> {
        self.log_sink.lines().iter().map(|line| serde_json::from_str(line).unwrap()).collect()
    }

    /// Timestamp to assign to entities created directly in the database.
    fn created_at(n: u32) -> OffsetDateTime {
        datetime!(2023-09-01 00:00:00 UTC) + time::Duration::seconds(i64::from(n))
    }

    pub(crate) async fn create_item(&self, n: u32) -> Item {
        let request = ItemRequest {
            name: format!("item {}", n),
            description: format!("description {}", n),
        };
        db::create_item(&mut self.ex().await, &request, Self::created_at(n)).await.unwrap()
    }

    pub(crate) async fn create_client(&self, n: u32) -> Client {
        let request = ClientRequest {
            full_name: format!("Client {}", n),
            email: format!("client{}@example.com", n),
            birth_date: date!(1980 - 02 - 29),
            country: "Uruguay".to_owned(),
        };
        db::create_client(&mut self.ex().await, &request, Self::created_at(n)).await.unwrap()
    }

    pub(crate) async fn create_bank(&self, n: u32) -> Bank {
        db::create_bank(
            &mut self.ex().await,
            &format!("Bank {}", n),
            BankType::Private,
            Self::created_at(n),
        )
        .await
        .unwrap()
    }

    pub(crate) async fn create_credit(&self, n: u32, client: &Client, bank: &Bank) -> Credit {
        let data = CreditData {
            client_id: *client.id(),
            bank_id: *bank.id(),
            min_payment: 100.0,
            max_payment: 250.75,
            term_months: 12,
            credit_type: CreditType::Commercial,
            status: CreditStatus::Approved,
        };
        db::create_credit(&mut self.ex().await, data, Self::created_at(n)).await.unwrap()
    }

    pub(crate) async fn get_client(&self, id: i64) -> Option<Client> {
        match db::get_client(&mut self.ex().await, id).await {
            Ok(client) => Some(client),
            Err(DbError::NotFound) => None,
            Err(e) => panic!("{:?}", e),
        }
    }

    pub(crate) async fn get_bank(&self, id: i64) -> Option<Bank> {
        match db::get_bank(&mut self.ex().await, id).await {
            Ok(bank) => Some(bank),
            Err(DbError::NotFound) => None,
            Err(e) => panic!("{:?}", e),
        }
    }

    pub(crate) async fn get_credit(&self, id: i64) -> Option<Credit> {
        match db::get_credit(&mut self.ex().await, id).await {
            Ok(credit) => Some(credit),
            Err(DbError::NotFound) => None,
            Err(e) => panic!("{:?}", e),
        }
    }

    /// Simulates a database failure by dropping `table`.
    pub(crate) async fn break_table(&self, table: &str) {
        match &mut self.ex().await {
            Executor::Sqlite(ex) => {
                sqlx::query(&format!("DROP TABLE {}", table)).execute(ex.conn()).await.unwrap();
            }

            #[allow(unused)]
            _ => unreachable!(),
        }
    }
}
