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

//! API to remove a record from a collection.

use crate::driver::{DeleteOutcome, Driver, Resource};
use crate::model::PathId;
use crate::rest::{EmptyBody, MSG_INVALID_ID, MessageResponse, RestError};
use axum::Json;
use axum::extract::{Path, State};

/// API handler.
///
/// Unlike updates, deletions insist on a well-formed integral identifier and reject anything
/// else outright.  A missing record reports the absence in a plain 200 message instead of a 404.
pub(crate) async fn handler<R>(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    _: EmptyBody,
) -> Result<Json<MessageResponse>, RestError>
where
    R: Resource,
{
    let id = match PathId::parse(&id) {
        PathId::Id(id) => id,
        PathId::Unmatchable | PathId::Invalid => {
            return Err(RestError::InvalidRequest(MSG_INVALID_ID.to_owned()));
        }
    };

    let message = match driver.remove::<R>(id).await? {
        DeleteOutcome::NotFound => format!("{} not found in database", R::NAME),
        DeleteOutcome::NothingDeleted => format!("error deleting {}", R::NAME),
        DeleteOutcome::Deleted => format!("{} deleted successfully", R::NAME),
    };
    Ok(Json(MessageResponse { message }))
}
