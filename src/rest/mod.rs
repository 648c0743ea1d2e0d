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

//! HTTP surface of the service.
//!
//! One file per route shape.  Each file's `tests` module declares `route` helpers yielding
//! the method and path under test, and every test goes through them so that the exercised
//! endpoint is always the one the file is about.

use crate::driver::customers::Customers;
use crate::driver::products::Products;
use crate::driver::{Driver, DriverError};
use crate::model::MutationResult;
use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::response::IntoResponse;
use axum::{Json, Router};
use log::error;
use serde::Serialize;

mod record_delete;
mod record_put;
mod records_get;
mod records_post;
#[cfg(test)]
mod testutils;

/// Message attached to 400 responses for payloads that fail validation.
pub(crate) const MSG_INVALID_PAYLOAD: &str = "check the submitted data and try again";

/// Message attached to 400 responses for malformed path identifiers.
pub(crate) const MSG_INVALID_ID: &str = "provide a valid identifier";

/// Message returned by listings that match no records.
pub(crate) const MSG_NO_RESULTS: &str = "query returned no results";

/// Message returned when a record is created.
pub(crate) const MSG_CREATED: &str = "record created successfully";

/// Message returned when an update matches a record but leaves it unchanged.
pub(crate) const MSG_NO_CHANGES: &str = "no changes to apply";

/// Message returned when an update rewrites a record.
pub(crate) const MSG_UPDATED: &str = "record updated successfully";

/// Errors surfaced to API callers, each paired with the status code it maps to.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// The request collides with a record that already exists.
    #[error("{0}")]
    Conflict(String),

    /// Catch-all for failures the caller cannot act on.
    #[error("{0}")]
    InternalError(String),

    /// Problem with what the request carried.
    #[error("{0}")]
    InvalidRequest(String),

    /// A body arrived on an endpoint that takes none.
    #[error("Payload should be empty")]
    PayloadNotEmpty,
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
        }
    }
}

/// Creates the error that every request validation failure reports.
pub(crate) fn invalid_payload_error() -> RestError {
    RestError::InvalidRequest(MSG_INVALID_PAYLOAD.to_owned())
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            RestError::Conflict(_) => http::StatusCode::CONFLICT,
            RestError::InternalError(details) => {
                error!("Request failed: {}", details);
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
            RestError::InvalidRequest(_) => http::StatusCode::BAD_REQUEST,
            RestError::PayloadNotEmpty => http::StatusCode::PAYLOAD_TOO_LARGE,
        };

        let response = match self {
            // Internal errors hide behind a fixed message and carry their details separately.
            RestError::InternalError(details) => {
                ErrorResponse { message: "server error".to_owned(), error_message: Some(details) }
            }
            e => ErrorResponse { message: e.to_string(), error_message: None },
        };

        (status, Json(response)).into_response()
    }
}

/// Wire shape of every error response.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, serde::Deserialize, PartialEq))]
pub(crate) struct ErrorResponse {
    /// Human-readable description of the failure.
    pub(crate) message: String,

    /// Details of the failure hidden behind the generic message of a 500 response.
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub(crate) error_message: Option<String>,
}

/// Body of any response that carries just a human-readable outcome message.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, serde::Deserialize, PartialEq))]
pub(crate) struct MessageResponse {
    /// Textual description of the outcome of the operation.
    pub(crate) message: String,
}

/// Body of a lookup response, wrapping the zero or one records that matched.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, serde::Deserialize, PartialEq))]
pub(crate) struct DataResponse<T> {
    /// The records that matched the lookup.
    pub(crate) data: Vec<T>,
}

/// Body of a successful creation response.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, serde::Deserialize, PartialEq))]
pub(crate) struct CreatedResponse {
    /// Textual description of the outcome of the operation.
    pub(crate) message: String,

    /// Counters describing the performed insertion.
    pub(crate) data: MutationResult,
}

/// Extractor that rejects requests carrying a body.
///
/// Reads and deletions take no payload, and mounting this makes a stray one fail loudly
/// instead of being silently ignored.
pub(crate) struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// Builds the router with every route this service exposes.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, put};
    Router::new()
        .route(
            "/clientes",
            get(records_get::handler::<Customers>).post(records_post::handler::<Customers>),
        )
        .route(
            "/clientes/:id",
            put(record_put::handler::<Customers>).delete(record_delete::handler::<Customers>),
        )
        .route(
            "/produtos",
            get(records_get::handler::<Products>).post(records_post::handler::<Products>),
        )
        .route(
            "/produtos/:id",
            put(record_put::handler::<Products>).delete(record_delete::handler::<Products>),
        )
        .with_state(driver)
}
