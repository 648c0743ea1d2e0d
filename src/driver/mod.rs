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

//! Business layer sitting between the REST handlers and the storage backends.

use crate::db::{Db, DbError, DbResult, Executor};
use crate::model::{FieldValue, ModelError, ModelResult, MutationResult};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub(crate) mod customers;
mod ops;
pub(crate) mod products;
#[cfg(test)]
mod testutils;

/// Errors reported by the business layer, coming either from storage or from bad input.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum DriverError {
    /// A stored record already claims contents that must remain unique.
    #[error("{0}")]
    AlreadyExists(String),

    /// Failure in the storage layer that the caller cannot remedy.
    #[error("{0}")]
    BackendError(String),

    /// The supplied contents failed validation.
    #[error("{0}")]
    InvalidInput(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::BackendError(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result alias used throughout the driver operations.
pub(crate) type DriverResult<T> = Result<T, DriverError>;

/// Result of an update operation that ran to completion.
#[derive(Debug, PartialEq)]
pub(crate) enum UpdateOutcome {
    /// There is no record with the requested identifier.
    NotFound,

    /// The record exists but the requested contents match the stored ones.
    NoChanges,

    /// The record was rewritten with the requested contents.
    Updated,
}

/// Result of a delete operation that ran to completion.
#[derive(Debug, PartialEq)]
pub(crate) enum DeleteOutcome {
    /// There is no record with the requested identifier.
    NotFound,

    /// The record existed when the operation started but the deletion removed no rows.
    NothingDeleted,

    /// The record was deleted.
    Deleted,
}

/// Describes one of the record collections the service manages.
///
/// The driver operations are the same for every collection, so they are generic over
/// implementations of this trait, which supplies the collection-specific pieces: the payload
/// and record shapes, the validation rules, and the database queries.
///
/// Every payload carries up to two fields: a descriptive one (the customer name or the product
/// description) and a numeric-leaning one (the tax id or the price).  The operations here call
/// these `name` and `value`.
#[async_trait]
pub(crate) trait Resource {
    /// Name of the record type as it appears in user-visible messages.
    const NAME: &'static str;

    /// Name of the query string parameter that carries the record identifier in retrievals.
    const ID_QUERY_PARAM: &'static str;

    /// Stored representation of one record.
    type Record: Serialize + Send + Sync;

    /// Wire representation of the optional fields in creation and update payloads.
    type Payload: DeserializeOwned + Send + Sync;

    /// Validated contents of one record, ready for persistence.
    type Fields: Send + Sync;

    /// Splits a decoded payload into its `name` and `value` parts, normalizing blank text
    /// to absent values.
    fn split_payload(payload: Self::Payload) -> (Option<FieldValue>, Option<FieldValue>);

    /// Validates the fields of a creation request.
    fn new_fields(name: FieldValue, value: FieldValue) -> ModelResult<Self::Fields>;

    /// Combines the fields of an update request with the stored `current` record, keeping the
    /// stored value of any field the request omits.
    fn merge(
        current: &Self::Record,
        name: Option<FieldValue>,
        value: Option<FieldValue>,
    ) -> ModelResult<Self::Fields>;

    /// Checks whether writing `fields` over `current` would change the stored contents.
    fn changed(current: &Self::Record, fields: &Self::Fields) -> bool;

    /// Error to report when a record conflicting with `fields` already exists.
    fn conflict_error() -> DriverError {
        DriverError::AlreadyExists("Already exists".to_owned())
    }

    /// Verifies that `fields` does not collide with a record other than the one identified by
    /// `exclude_id`.  Collections without uniqueness requirements accept everything.
    async fn check_unique(
        _ex: &mut Executor,
        _fields: &Self::Fields,
        _exclude_id: Option<i64>,
    ) -> DriverResult<()> {
        Ok(())
    }

    /// Gets all records in the collection.
    async fn list(ex: &mut Executor) -> DbResult<Vec<Self::Record>>;

    /// Gets the record with identifier `id`, or `None` if it does not exist.
    async fn get_by_id(ex: &mut Executor, id: i64) -> DbResult<Option<Self::Record>>;

    /// Creates a new record with the contents of `fields`.
    async fn insert(ex: &mut Executor, fields: &Self::Fields) -> DbResult<MutationResult>;

    /// Overwrites the record with identifier `id` with `fields` and returns the number of rows
    /// that matched the identifier.
    async fn update(ex: &mut Executor, id: i64, fields: &Self::Fields) -> DbResult<u64>;

    /// Deletes the record with identifier `id` and returns the number of rows deleted.
    async fn delete(ex: &mut Executor, id: i64) -> DbResult<u64>;
}

/// Entry point into the business operations.
///
/// Every operation runs to completion in one go: it checks an executor out of the pool, issues
/// whatever queries it needs, and returns.  Operations therefore take the driver by value, and
/// callers wanting to issue another one clone it first.
#[derive(Clone)]
pub(crate) struct Driver {
    /// Storage backend the operations run against.
    db: Arc<dyn Db + Send + Sync>,
}

impl Driver {
    /// Creates a driver on top of `db`.
    pub(crate) fn new(db: Arc<dyn Db + Send + Sync>) -> Self {
        Self { db }
    }
}
