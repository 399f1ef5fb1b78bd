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

//! High-level data types.
//!
//! Entities are returned to callers as is.  Payloads accepted from callers are separate types
//! that lack the fields the service assigns on its own (`id` and `created_at`).

use creditline_core::model::{ModelError, ModelResult};
use derive_getters::Getters;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time, UtcOffset};

/// Textual representation of calendar dates, both in JSON and in the SQLite database.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats a calendar date as `YYYY-MM-DD`.
pub(crate) fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).expect("Dates of the supported range always format")
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub(crate) fn parse_date(s: &str) -> ModelResult<Date> {
    Date::parse(s, DATE_FORMAT).map_err(|e| ModelError(format!("Invalid date '{}': {}", s, e)))
}

/// Parses a birth date given either as an RFC 3339 timestamp or as a plain `YYYY-MM-DD` date.
///
/// Timestamps are reduced to their calendar date in UTC.
pub(crate) fn parse_birth_date(s: &str) -> ModelResult<Date> {
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(timestamp) => Ok(timestamp.to_offset(UtcOffset::UTC).date()),
        Err(_) => parse_date(s),
    }
}

/// Serde adapter for birth dates.
///
/// Dates are emitted as RFC 3339 timestamps at midnight UTC and are read with `parse_birth_date`.
mod birth_date {
    use super::{Date, Rfc3339, Time, parse_birth_date};
    use serde::{Deserialize, Deserializer, Serializer, de, ser};

    /// Serializes `date` as midnight UTC of that day.
    pub(super) fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let midnight = date.with_time(Time::MIDNIGHT).assume_utc();
        serializer.serialize_str(&midnight.format(&Rfc3339).map_err(ser::Error::custom)?)
    }

    /// Deserializes a birth date in any of the forms accepted by `parse_birth_date`.
    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_birth_date(&s).map_err(de::Error::custom)
    }
}

/// Kind of institution a bank is.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankType {
    /// A privately owned bank.
    Private,

    /// A state-owned bank.
    Government,
}

impl BankType {
    /// Returns the canonical textual representation of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BankType::Private => "PRIVATE",
            BankType::Government => "GOVERNMENT",
        }
    }
}

impl FromStr for BankType {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "PRIVATE" => Ok(BankType::Private),
            "GOVERNMENT" => Ok(BankType::Government),
            _ => Err(ModelError("Invalid bank type. Must be PRIVATE or GOVERNMENT".to_owned())),
        }
    }
}

impl fmt::Display for BankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose of a credit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditType {
    /// Vehicle financing.
    Auto,

    /// Real estate financing.
    Mortgage,

    /// Business financing.
    Commercial,
}

impl CreditType {
    /// Returns the canonical textual representation of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditType::Auto => "AUTO",
            CreditType::Mortgage => "MORTGAGE",
            CreditType::Commercial => "COMMERCIAL",
        }
    }
}

impl FromStr for CreditType {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "AUTO" => Ok(CreditType::Auto),
            "MORTGAGE" => Ok(CreditType::Mortgage),
            "COMMERCIAL" => Ok(CreditType::Commercial),
            _ => Err(ModelError(
                "Invalid credit type. Must be AUTO, MORTGAGE, or COMMERCIAL".to_owned(),
            )),
        }
    }
}

impl fmt::Display for CreditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a credit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    /// The credit has not been reviewed yet.
    Pending,

    /// The credit was granted.
    Approved,

    /// The credit was denied.
    Rejected,
}

impl CreditStatus {
    /// Returns the canonical textual representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Pending => "PENDING",
            CreditStatus::Approved => "APPROVED",
            CreditStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for CreditStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "PENDING" => Ok(CreditStatus::Pending),
            "APPROVED" => Ok(CreditStatus::Approved),
            "REJECTED" => Ok(CreditStatus::Rejected),
            _ => Err(ModelError(
                "Invalid status. Must be PENDING, APPROVED, or REJECTED".to_owned(),
            )),
        }
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generic item.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct Item {
    /// Identifier assigned by the database.
    id: i64,

    /// Name of the item.
    name: String,

    /// Free-form description of the item.
    description: String,

    /// Time at which the item was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

/// A customer of the banks.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct Client {
    /// Identifier assigned by the database.
    id: i64,

    /// Full name of the person.
    full_name: String,

    /// Email address of the person, unique across clients.
    email: String,

    /// Birth date of the person.
    #[serde(with = "birth_date")]
    birth_date: Date,

    /// Country of residence.
    country: String,

    /// Time at which the client was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

/// A financial institution that grants credits.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct Bank {
    /// Identifier assigned by the database.
    id: i64,

    /// Name of the bank.
    name: String,

    /// Kind of institution.
    #[serde(rename = "type")]
    bank_type: BankType,

    /// Time at which the bank was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

/// A credit granted by a bank to a client.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct Credit {
    /// Identifier assigned by the database.
    id: i64,

    /// Client that receives the credit.
    client_id: i64,

    /// Bank that grants the credit.
    bank_id: i64,

    /// Smallest monthly payment.
    min_payment: f64,

    /// Largest monthly payment.
    max_payment: f64,

    /// Duration of the credit.
    term_months: i32,

    /// Purpose of the credit.
    credit_type: CreditType,

    /// Current state of the credit.
    status: CreditStatus,

    /// Time at which the credit was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl Credit {
    /// Builds a stored credit from its validated `data` and the values assigned by the service.
    pub fn from_data(id: i64, data: CreditData, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            client_id: data.client_id,
            bank_id: data.bank_id,
            min_payment: data.min_payment,
            max_payment: data.max_payment,
            term_months: data.term_months,
            credit_type: data.credit_type,
            status: data.status,
            created_at,
        }
    }
}

/// Validated contents of a credit, ready to be stored.
#[derive(Clone, Debug, PartialEq)]
pub struct CreditData {
    /// Client that receives the credit.
    pub client_id: i64,

    /// Bank that grants the credit.
    pub bank_id: i64,

    /// Smallest monthly payment.
    pub min_payment: f64,

    /// Largest monthly payment.
    pub max_payment: f64,

    /// Duration of the credit.
    pub term_months: i32,

    /// Purpose of the credit.
    pub credit_type: CreditType,

    /// Current state of the credit.
    pub status: CreditStatus,
}

/// Payload to create an item.  Missing fields are empty.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ItemRequest {
    /// Name of the item.
    pub name: String,

    /// Free-form description of the item.
    pub description: String,
}

/// Payload to create or replace a client.  All fields are required.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClientRequest {
    /// Full name of the person.
    pub full_name: String,

    /// Email address of the person.
    pub email: String,

    /// Birth date of the person.
    #[serde(with = "birth_date")]
    pub birth_date: Date,

    /// Country of residence.
    pub country: String,
}

/// Payload to create or replace a bank.  Missing fields are empty, which makes a missing type
/// fail validation.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct BankRequest {
    /// Name of the bank.
    pub name: String,

    /// Kind of institution, not yet validated.
    #[serde(rename = "type")]
    pub bank_type: String,
}

/// Payload to create or replace a credit.  Missing fields take their zero values so that
/// validation reports them.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CreditRequest {
    /// Client that receives the credit.
    pub client_id: i64,

    /// Bank that grants the credit.
    pub bank_id: i64,

    /// Smallest monthly payment.
    pub min_payment: f64,

    /// Largest monthly payment.
    pub max_payment: f64,

    /// Duration of the credit.
    pub term_months: i32,

    /// Purpose of the credit, not yet validated.
    pub credit_type: String,

    /// Current state of the credit, not yet validated.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_tokens};
    use time::macros::{date, datetime};

    #[test]
    fn test_bank_type_ser_de() {
        assert_tokens(
            &BankType::Government,
            &[Token::UnitVariant { name: "BankType", variant: "GOVERNMENT" }],
        );
    }

    #[test]
    fn test_credit_type_ser_de() {
        assert_tokens(
            &CreditType::Commercial,
            &[Token::UnitVariant { name: "CreditType", variant: "COMMERCIAL" }],
        );
    }

    #[test]
    fn test_credit_status_ser_de() {
        assert_tokens(
            &CreditStatus::Approved,
            &[Token::UnitVariant { name: "CreditStatus", variant: "APPROVED" }],
        );
    }

    #[test]
    fn test_enums_from_str_and_back() {
        for t in [BankType::Private, BankType::Government] {
            assert_eq!(t, BankType::from_str(t.as_str()).unwrap());
        }
        for t in [CreditType::Auto, CreditType::Mortgage, CreditType::Commercial] {
            assert_eq!(t, CreditType::from_str(t.as_str()).unwrap());
        }
        for s in [CreditStatus::Pending, CreditStatus::Approved, CreditStatus::Rejected] {
            assert_eq!(s, CreditStatus::from_str(s.as_str()).unwrap());
        }
    }

    #[test]
    fn test_enums_from_str_are_case_sensitive() {
        assert_eq!(
            ModelError("Invalid bank type. Must be PRIVATE or GOVERNMENT".to_owned()),
            BankType::from_str("private").unwrap_err()
        );
        CreditType::from_str("Auto").unwrap_err();
        CreditStatus::from_str("").unwrap_err();
    }

    #[test]
    fn test_date_format_and_parse() {
        assert_eq!("1990-04-07", format_date(date!(1990 - 04 - 07)));
        assert_eq!(date!(1990 - 04 - 07), parse_date("1990-04-07").unwrap());
        assert!(parse_date("07/04/1990").unwrap_err().0.contains("Invalid date"));
    }

    #[test]
    fn test_bank_json_uses_type_key() {
        let created_at = datetime!(2024-01-02 03:04:05 UTC);
        let bank = Bank::new(7, "First".to_owned(), BankType::Private, created_at);
        assert_eq!(
            serde_json::json!({
                "id": 7,
                "name": "First",
                "type": "PRIVATE",
                "created_at": "2024-01-02T03:04:05Z",
            }),
            serde_json::to_value(&bank).unwrap()
        );
    }

    #[test]
    fn test_parse_birth_date() {
        assert_eq!(date!(1990 - 01 - 01), parse_birth_date("1990-01-01T00:00:00Z").unwrap());
        assert_eq!(date!(1990 - 01 - 01), parse_birth_date("1990-01-01").unwrap());
        assert_eq!(date!(1990 - 01 - 02), parse_birth_date("1990-01-01T22:00:00-03:00").unwrap());
        assert!(parse_birth_date("1990-01-01T00:00:00").unwrap_err().0.contains("Invalid date"));
        parse_birth_date("01/01/1990").unwrap_err();
    }

    #[test]
    fn test_client_json_birth_date_is_midnight_utc() {
        let client = Client::new(
            1,
            "Ada Lovelace".to_owned(),
            "ada@example.com".to_owned(),
            date!(1815 - 12 - 10),
            "UK".to_owned(),
            datetime!(2024-01-02 03:04:05.25 UTC),
        );
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!("1815-12-10T00:00:00Z", json["birth_date"]);
        assert_eq!("2024-01-02T03:04:05.25Z", json["created_at"]);
    }

    #[test]
    fn test_credit_request_is_lenient() {
        let request: CreditRequest =
            serde_json::from_str(r#"{"client_id": 3, "credit_type": "AUTO", "id": 99}"#).unwrap();
        assert_eq!(
            CreditRequest {
                client_id: 3,
                credit_type: "AUTO".to_owned(),
                ..Default::default()
            },
            request
        );
    }

    #[test]
    fn test_bank_request_missing_type_is_empty() {
        let request: BankRequest = serde_json::from_str(r#"{"name": "B"}"#).unwrap();
        assert_eq!(BankRequest { name: "B".to_owned(), bank_type: "".to_owned() }, request);
    }

    #[test]
    fn test_client_request_requires_all_fields() {
        serde_json::from_str::<ClientRequest>(r#"{"full_name": "A", "email": "a@b.c"}"#)
            .unwrap_err();
        serde_json::from_str::<ClientRequest>(
            r#"{"full_name": "A", "email": "a@b.c", "birth_date": "1990-13-01", "country": "AR"}"#,
        )
        .unwrap_err();

        let request: ClientRequest = serde_json::from_str(
            r#"{"full_name": "A", "email": "a@b.c", "birth_date": "1990-01-31", "country": "AR"}"#,
        )
        .unwrap();
        assert_eq!(date!(1990 - 01 - 31), request.birth_date);

        let request: ClientRequest = serde_json::from_value(serde_json::json!({
            "full_name": "A",
            "email": "a@b.c",
            "birth_date": "1990-01-31T00:00:00Z",
            "country": "AR",
        }))
        .unwrap();
        assert_eq!(date!(1990 - 01 - 31), request.birth_date);
    }
}
