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

//! API to list all records of a collection or to look one up by identifier.

use crate::driver::{Driver, Resource};
use crate::model::PathId;
use crate::rest::{DataResponse, EmptyBody, MSG_NO_RESULTS, MessageResponse, RestError};
use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;

/// API handler.
///
/// Requests without an identifier in the query string list the whole collection; requests with
/// one look up that single record and wrap it in a `data` envelope, which stays empty when the
/// identifier denotes nothing.
pub(crate) async fn handler<R>(
    State(driver): State<Driver>,
    Query(params): Query<HashMap<String, String>>,
    _: EmptyBody,
) -> Result<Response, RestError>
where
    R: Resource,
{
    let raw_id = match params.get(R::ID_QUERY_PARAM).or_else(|| params.get("id")) {
        Some(raw) if !raw.is_empty() => Some(raw.as_str()),
        _ => None,
    };

    match raw_id {
        Some(raw) => {
            let data = match PathId::parse(raw) {
                PathId::Id(id) => match driver.get::<R>(id).await? {
                    Some(record) => vec![record],
                    None => vec![],
                },
                // Identifiers that cannot denote a stored row match nothing instead of failing.
                PathId::Unmatchable | PathId::Invalid => vec![],
            };
            Ok(Json(DataResponse { data }).into_response())
        }

        None => {
            let records = driver.list::<R>().await?;
            if records.is_empty() {
                Ok(Json(MessageResponse { message: MSG_NO_RESULTS.to_owned() }).into_response())
            } else {
                Ok(Json(records).into_response())
            }
        }
    }
}
