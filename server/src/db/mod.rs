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

//! Database abstraction to manipulate items, clients, banks and credits.
//!
//! Listing operations are best effort: rows that cannot be decoded are logged and skipped so that
//! one corrupt row does not hide all others.

use crate::model::{
    Bank, BankType, Client, ClientRequest, Credit, CreditData, Item, ItemRequest,
};
#[cfg(any(feature = "sqlite", test))]
use crate::model::{format_date, parse_date};
#[cfg(feature = "postgres")]
use creditline_core::db::postgres::{self, PostgresExecutor};
#[cfg(any(feature = "sqlite", test))]
use creditline_core::db::sqlite::{self, SqliteExecutor, build_timestamp, unpack_timestamp};
use creditline_core::db::{DbError, DbResult, Executor};
use futures::TryStreamExt;
use log::warn;
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;
#[cfg(feature = "postgres")]
use time::Date;


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Checks that a statement that targets a single row by its primary key touched exactly one row.
fn expect_one_row(rows_affected: u64) -> DbResult<()> {
    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Expected one affected row but got {}", n))),
    }
}

/// Runs `query_str`, optionally binding `param` as its only parameter, and decodes all returned
/// rows as `T`.  Rows that fail to decode are skipped.
#[cfg(feature = "postgres")]
async fn collect_pg<T>(
    ex: &mut PostgresExecutor,
    query_str: &str,
    param: Option<i64>,
    what: &str,
) -> DbResult<Vec<T>>
where
    T: TryFrom<PgRow, Error = DbError>,
{
    let mut query = sqlx::query(query_str);
    if let Some(param) = param {
        query = query.bind(param);
    }

    let mut entities = vec![];
    let mut rows = query.fetch(ex.conn());
    while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
        match T::try_from(row) {
            Ok(entity) => entities.push(entity),
            Err(e) => warn!("Skipping {} row that cannot be decoded: {}", what, e),
        }
    }
    Ok(entities)
}

/// Runs `query_str`, optionally binding `param` as its only parameter, and decodes all returned
/// rows as `T`.  Rows that fail to decode are skipped.
#[cfg(any(feature = "sqlite", test))]
async fn collect_sqlite<T>(
    ex: &mut SqliteExecutor,
    query_str: &str,
    param: Option<i64>,
    what: &str,
) -> DbResult<Vec<T>>
where
    T: TryFrom<SqliteRow, Error = DbError>,
{
    let mut query = sqlx::query(query_str);
    if let Some(param) = param {
        query = query.bind(param);
    }

    let mut entities = vec![];
    let mut rows = query.fetch(ex.conn());
    while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
        match T::try_from(row) {
            Ok(entity) => entities.push(entity),
            Err(e) => warn!("Skipping {} row that cannot be decoded: {}", what, e),
        }
    }
    Ok(entities)
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Item {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let description: String = row.try_get("description").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(Item::new(id, name, description, created_at))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Item {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let description: String = row.try_get("description").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        let created_at = build_timestamp(created_at_secs, created_at_nsecs)?;

        Ok(Item::new(id, name, description, created_at))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Client {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let full_name: String = row.try_get("full_name").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let birth_date: Date = row.try_get("birth_date").map_err(postgres::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(Client::new(id, full_name, email, birth_date, country, created_at))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Client {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let full_name: String = row.try_get("full_name").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let birth_date: String = row.try_get("birth_date").map_err(sqlite::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        let birth_date = parse_date(&birth_date)?;
        let created_at = build_timestamp(created_at_secs, created_at_nsecs)?;

        Ok(Client::new(id, full_name, email, birth_date, country, created_at))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Bank {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let bank_type: String = row.try_get("type").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(Bank::new(id, name, bank_type.parse()?, created_at))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Bank {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let bank_type: String = row.try_get("type").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        let created_at = build_timestamp(created_at_secs, created_at_nsecs)?;

        Ok(Bank::new(id, name, bank_type.parse()?, created_at))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Credit {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let client_id: i64 = row.try_get("client_id").map_err(postgres::map_sqlx_error)?;
        let bank_id: i64 = row.try_get("bank_id").map_err(postgres::map_sqlx_error)?;
        let min_payment: f64 = row.try_get("min_payment").map_err(postgres::map_sqlx_error)?;
        let max_payment: f64 = row.try_get("max_payment").map_err(postgres::map_sqlx_error)?;
        let term_months: i32 = row.try_get("term_months").map_err(postgres::map_sqlx_error)?;
        let credit_type: String = row.try_get("credit_type").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        let data = CreditData {
            client_id,
            bank_id,
            min_payment,
            max_payment,
            term_months,
            credit_type: credit_type.parse()?,
            status: status.parse()?,
        };
        Ok(Credit::from_data(id, data, created_at))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Credit {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let client_id: i64 = row.try_get("client_id").map_err(sqlite::map_sqlx_error)?;
        let bank_id: i64 = row.try_get("bank_id").map_err(sqlite::map_sqlx_error)?;
        let min_payment: f64 = row.try_get("min_payment").map_err(sqlite::map_sqlx_error)?;
        let max_payment: f64 = row.try_get("max_payment").map_err(sqlite::map_sqlx_error)?;
        let term_months: i32 = row.try_get("term_months").map_err(sqlite::map_sqlx_error)?;
        let credit_type: String = row.try_get("credit_type").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        let data = CreditData {
            client_id,
            bank_id,
            min_payment,
            max_payment,
            term_months,
            credit_type: credit_type.parse()?,
            status: status.parse()?,
        };
        let created_at = build_timestamp(created_at_secs, created_at_nsecs)?;
        Ok(Credit::from_data(id, data, created_at))
    }
}

/// Gets all items, newest first.
pub async fn list_items(ex: &mut Executor) -> DbResult<Vec<Item>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM items ORDER BY created_at DESC, id DESC";
            collect_pg(ex, query_str, None, "item").await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM items
                ORDER BY created_at_secs DESC, created_at_nsecs DESC, id DESC";
            collect_sqlite(ex, query_str, None, "item").await
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the item identified by `id`.
pub async fn get_item(ex: &mut Executor, id: i64) -> DbResult<Item> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM items WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Item::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM items WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Item::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new item from `request`, marking it as created at `created_at`.
pub async fn create_item(
    ex: &mut Executor,
    request: &ItemRequest,
    created_at: OffsetDateTime,
) -> DbResult<Item> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO items (name, description, created_at)
                VALUES ($1, $2, $3)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&request.name)
                .bind(&request.description)
                .bind(created_at)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at);

            let query_str = "
                INSERT INTO items (name, description, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&request.name)
                .bind(&request.description)
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Item::new(id, request.name.clone(), request.description.clone(), created_at))
}

/// Gets all clients, newest first.
pub async fn list_clients(ex: &mut Executor) -> DbResult<Vec<Client>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM clients ORDER BY created_at DESC, id DESC";
            collect_pg(ex, query_str, None, "client").await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM clients
                ORDER BY created_at_secs DESC, created_at_nsecs DESC, id DESC";
            collect_sqlite(ex, query_str, None, "client").await
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the client identified by `id`.
pub async fn get_client(ex: &mut Executor, id: i64) -> DbResult<Client> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM clients WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Client::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM clients WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Client::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new client from `request`, marking it as created at `created_at`.
///
/// Fails with a `BackendError` if the email address is already in use.
pub async fn create_client(
    ex: &mut Executor,
    request: &ClientRequest,
    created_at: OffsetDateTime,
) -> DbResult<Client> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO clients (full_name, email, birth_date, country, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&request.full_name)
                .bind(&request.email)
                .bind(request.birth_date)
                .bind(&request.country)
                .bind(created_at)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at);

            let query_str = "
                INSERT INTO clients
                    (full_name, email, birth_date, country, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&request.full_name)
                .bind(&request.email)
                .bind(format_date(request.birth_date))
                .bind(&request.country)
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Client::new(
        id,
        request.full_name.clone(),
        request.email.clone(),
        request.birth_date,
        request.country.clone(),
        created_at,
    ))
}

/// Replaces the mutable fields of the client identified by `id` with those in `request`.
pub async fn update_client(ex: &mut Executor, id: i64, request: &ClientRequest) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE clients SET full_name = $1, email = $2, birth_date = $3, country = $4
                WHERE id = $5";
            let done = sqlx::query(query_str)
                .bind(&request.full_name)
                .bind(&request.email)
                .bind(request.birth_date)
                .bind(&request.country)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE clients SET full_name = ?, email = ?, birth_date = ?, country = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(&request.full_name)
                .bind(&request.email)
                .bind(format_date(request.birth_date))
                .bind(&request.country)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    expect_one_row(rows_affected)
}

/// Deletes the client identified by `id` and, by cascade, all of its credits.
pub async fn delete_client(ex: &mut Executor, id: i64) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM clients WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM clients WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    expect_one_row(rows_affected)
}

/// Gets all banks, newest first.
pub async fn list_banks(ex: &mut Executor) -> DbResult<Vec<Bank>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM banks ORDER BY created_at DESC, id DESC";
            collect_pg(ex, query_str, None, "bank").await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM banks
                ORDER BY created_at_secs DESC, created_at_nsecs DESC, id DESC";
            collect_sqlite(ex, query_str, None, "bank").await
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the bank identified by `id`.
pub async fn get_bank(ex: &mut Executor, id: i64) -> DbResult<Bank> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM banks WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Bank::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM banks WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Bank::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new bank named `name` of type `bank_type`, marking it as created at `created_at`.
pub async fn create_bank(
    ex: &mut Executor,
    name: &str,
    bank_type: BankType,
    created_at: OffsetDateTime,
) -> DbResult<Bank> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO banks (name, type, created_at) VALUES ($1, $2, $3)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(name)
                .bind(bank_type.as_str())
                .bind(created_at)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at);

            let query_str = "
                INSERT INTO banks (name, type, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(name)
                .bind(bank_type.as_str())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Bank::new(id, name.to_owned(), bank_type, created_at))
}

/// Replaces the mutable fields of the bank identified by `id`.
pub async fn update_bank(
    ex: &mut Executor,
    id: i64,
    name: &str,
    bank_type: BankType,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE banks SET name = $1, type = $2 WHERE id = $3";
            let done = sqlx::query(query_str)
                .bind(name)
                .bind(bank_type.as_str())
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE banks SET name = ?, type = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(name)
                .bind(bank_type.as_str())
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    expect_one_row(rows_affected)
}

/// Deletes the bank identified by `id` and, by cascade, all of its credits.
pub async fn delete_bank(ex: &mut Executor, id: i64) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM banks WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM banks WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    expect_one_row(rows_affected)
}

/// Gets all credits, newest first.
pub async fn list_credits(ex: &mut Executor) -> DbResult<Vec<Credit>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM credits ORDER BY created_at DESC, id DESC";
            collect_pg(ex, query_str, None, "credit").await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM credits
                ORDER BY created_at_secs DESC, created_at_nsecs DESC, id DESC";
            collect_sqlite(ex, query_str, None, "credit").await
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all credits granted to the client `client_id`, newest first.
///
/// An unknown client yields an empty list.
pub async fn list_credits_by_client(ex: &mut Executor, client_id: i64) -> DbResult<Vec<Credit>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM credits WHERE client_id = $1
                ORDER BY created_at DESC, id DESC";
            collect_pg(ex, query_str, Some(client_id), "credit").await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM credits WHERE client_id = ?
                ORDER BY created_at_secs DESC, created_at_nsecs DESC, id DESC";
            collect_sqlite(ex, query_str, Some(client_id), "credit").await
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all credits granted by the bank `bank_id`, newest first.
///
/// An unknown bank yields an empty list.
pub async fn list_credits_by_bank(ex: &mut Executor, bank_id: i64) -> DbResult<Vec<Credit>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM credits WHERE bank_id = $1
                ORDER BY created_at DESC, id DESC";
            collect_pg(ex, query_str, Some(bank_id), "credit").await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM credits WHERE bank_id = ?
                ORDER BY created_at_secs DESC, created_at_nsecs DESC, id DESC";
            collect_sqlite(ex, query_str, Some(bank_id), "credit").await
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the credit identified by `id`.
pub async fn get_credit(ex: &mut Executor, id: i64) -> DbResult<Credit> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM credits WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Credit::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM credits WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Credit::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new credit from its validated `data`, marking it as created at `created_at`.
///
/// Fails with a `BackendError` if the client or the bank do not exist.
pub async fn create_credit(
    ex: &mut Executor,
    data: CreditData,
    created_at: OffsetDateTime,
) -> DbResult<Credit> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO credits (client_id, bank_id, min_payment, max_payment, term_months,
                    credit_type, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(data.client_id)
                .bind(data.bank_id)
                .bind(data.min_payment)
                .bind(data.max_payment)
                .bind(data.term_months)
                .bind(data.credit_type.as_str())
                .bind(data.status.as_str())
                .bind(created_at)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at);

            let query_str = "
                INSERT INTO credits (client_id, bank_id, min_payment, max_payment, term_months,
                    credit_type, status, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(data.client_id)
                .bind(data.bank_id)
                .bind(data.min_payment)
                .bind(data.max_payment)
                .bind(data.term_months)
                .bind(data.credit_type.as_str())
                .bind(data.status.as_str())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Credit::from_data(id, data, created_at))
}

/// Replaces the mutable fields of the credit identified by `id` with `data`.
pub async fn update_credit(ex: &mut Executor, id: i64, data: &CreditData) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE credits SET client_id = $1, bank_id = $2, min_payment = $3,
                    max_payment = $4, term_months = $5, credit_type = $6, status = $7
                WHERE id = $8";
            let done = sqlx::query(query_str)
                .bind(data.client_id)
                .bind(data.bank_id)
                .bind(data.min_payment)
                .bind(data.max_payment)
                .bind(data.term_months)
                .bind(data.credit_type.as_str())
                .bind(data.status.as_str())
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE credits SET client_id = ?, bank_id = ?, min_payment = ?,
                    max_payment = ?, term_months = ?, credit_type = ?, status = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(data.client_id)
                .bind(data.bank_id)
                .bind(data.min_payment)
                .bind(data.max_payment)
                .bind(data.term_months)
                .bind(data.credit_type.as_str())
                .bind(data.status.as_str())
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    expect_one_row(rows_affected)
}

/// Deletes the credit identified by `id`.
pub async fn delete_credit(ex: &mut Executor, id: i64) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM credits WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM credits WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    expect_one_row(rows_affected)
}
