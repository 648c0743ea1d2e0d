// Cadastro
// Copyright 2025 The Cadastro Authors
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

//! API to add a record to a collection.

use crate::driver::{Driver, Resource};
use crate::rest::{CreatedResponse, MSG_CREATED, RestError, invalid_payload_error};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

/// API handler.
///
/// Any payload problem, from malformed JSON to missing or malformed fields, collapses into the
/// same canonical validation error.
pub(crate) async fn handler<R>(
    State(driver): State<Driver>,
    payload: Result<Json<R::Payload>, JsonRejection>,
) -> Result<(http::StatusCode, Json<CreatedResponse>), RestError>
where
    R: Resource + Send,
{
    let Json(payload) = payload.map_err(|_| invalid_payload_error())?;

    let (name, value) = match R::split_payload(payload) {
        (Some(name), Some(value)) => (name, value),
        _ => return Err(invalid_payload_error()),
    };
    let fields = R::new_fields(name, value).map_err(|_| invalid_payload_error())?;

    let result = driver.create::<R>(fields).await?;

    let response = CreatedResponse { message: MSG_CREATED.to_owned(), data: result };
    Ok((http::StatusCode::CREATED, Json(response)))
}
