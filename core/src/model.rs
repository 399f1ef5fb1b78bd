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

//! Generic types shared by the model layer of every service.
//!
//! Services define their own `model` module with the domain types.  Constructors and parsers in
//! those modules report invalid values with `ModelError`, which then converts into the error type
//! of whichever layer encountered it: a `DbError` when reading corrupt rows, or an invalid input
//! error when validating user requests.

/// Model errors.  These carry a human-readable message that is suitable for returning to the
/// caller as is.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;
