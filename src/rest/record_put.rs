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

//! API to update an existing record of a collection.

use crate::driver::{Driver, Resource, UpdateOutcome};
use crate::model::{FieldValue, PathId};
use crate::rest::{MSG_NO_CHANGES, MSG_UPDATED, MessageResponse, RestError, invalid_payload_error};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

/// API handler.
///
/// The payload must carry at least one field, and passes a cross-field check: a numeric name is
/// only acceptable when the companion field is numeric as well.  Requests that reference a
/// missing record report the absence in a plain 200 message instead of a 404.
pub(crate) async fn handler<R>(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    payload: Result<Json<R::Payload>, JsonRejection>,
) -> Result<Json<MessageResponse>, RestError>
where
    R: Resource + Send,
{
    let Json(payload) = payload.map_err(|_| invalid_payload_error())?;
    let (name, value) = R::split_payload(payload);

    let id = match PathId::parse(&id) {
        PathId::Id(id) => Some(id),
        PathId::Unmatchable => None,
        PathId::Invalid => return Err(invalid_payload_error()),
    };

    let name_is_numeric = name.as_ref().map(FieldValue::is_numeric).unwrap_or(false);
    let value_is_numeric = value.as_ref().map(FieldValue::is_numeric).unwrap_or(false);
    if (name.is_none() && value.is_none()) || (name_is_numeric && !value_is_numeric) {
        return Err(invalid_payload_error());
    }

    let id = match id {
        Some(id) => id,

        // Fractional identifiers are numeric, hence well-formed, but can never match a record.
        None => return Ok(Json(MessageResponse { message: format!("{} not found", R::NAME) })),
    };

    let message = match driver.modify::<R>(id, name, value).await? {
        UpdateOutcome::NotFound => format!("{} not found", R::NAME),
        UpdateOutcome::NoChanges => MSG_NO_CHANGES.to_owned(),
        UpdateOutcome::Updated => MSG_UPDATED.to_owned(),
    };
    Ok(Json(MessageResponse { message }))
}
