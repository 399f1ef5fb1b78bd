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

//! Validation rules applied to caller-supplied payloads before they reach the database.

use crate::model::{BankType, CreditData, CreditRequest, CreditStatus, CreditType};
use creditline_core::model::{ModelError, ModelResult};

/// Validates the textual type of a bank.
pub(crate) fn validate_bank_type(s: &str) -> ModelResult<BankType> {
    s.parse()
}

/// Validates the textual type of a credit.
pub(crate) fn validate_credit_type(s: &str) -> ModelResult<CreditType> {
    s.parse()
}

/// Validates the textual status of a credit.
///
/// New credits may omit their status, in which case they start as pending.  Updates must always
/// carry an explicit status.
pub(crate) fn validate_credit_status(s: &str, is_create: bool) -> ModelResult<CreditStatus> {
    if is_create && s.is_empty() {
        return Ok(CreditStatus::Pending);
    }
    s.parse()
}

/// Validates that the payment range of a credit is positive and well ordered.
pub(crate) fn validate_credit_amounts(min_payment: f64, max_payment: f64) -> ModelResult<()> {
    if min_payment > 0.0 && max_payment > 0.0 && min_payment <= max_payment {
        Ok(())
    } else {
        Err(ModelError(
            "Invalid payment amounts. Min and max must be positive, and min must be <= max"
                .to_owned(),
        ))
    }
}

/// Validates the duration of a credit.
pub(crate) fn validate_term_months(term_months: i32) -> ModelResult<()> {
    if term_months > 0 {
        Ok(())
    } else {
        Err(ModelError("Term months must be positive".to_owned()))
    }
}

/// Applies all credit rules to `request` in order and returns the first failure.
pub(crate) fn validate_credit(request: &CreditRequest, is_create: bool) -> ModelResult<CreditData> {
    let credit_type = validate_credit_type(&request.credit_type)?;
    let status = validate_credit_status(&request.status, is_create)?;
    validate_credit_amounts(request.min_payment, request.max_payment)?;
    validate_term_months(request.term_months)?;
    Ok(CreditData {
        client_id: request.client_id,
        bank_id: request.bank_id,
        min_payment: request.min_payment,
        max_payment: request.max_payment,
        term_months: request.term_months,
        credit_type,
        status,
    })
}
