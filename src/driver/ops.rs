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

//! Operations on record collections, generic over the collection.

use crate::db::DbError;
use crate::driver::{DeleteOutcome, Driver, DriverError, DriverResult, Resource, UpdateOutcome};
use crate::model::{FieldValue, MutationResult};

impl Driver {
    /// Returns every stored record of the `R` collection.
    pub(crate) async fn list<R>(self) -> DriverResult<Vec<R::Record>>
    where
        R: Resource,
    {
        let mut ex = self.db.ex().await?;
        let records = R::list(&mut ex).await?;
        Ok(records)
    }

    /// Returns the record of the `R` collection with identifier `id`, if any.
    pub(crate) async fn get<R>(self, id: i64) -> DriverResult<Option<R::Record>>
    where
        R: Resource,
    {
        let mut ex = self.db.ex().await?;
        let record = R::get_by_id(&mut ex, id).await?;
        Ok(record)
    }

    /// Creates a new record of the `R` collection with the validated `fields` and returns the
    /// resulting write counters.
    pub(crate) async fn create<R>(self, fields: R::Fields) -> DriverResult<MutationResult>
    where
        R: Resource + Send,
    {
        let mut ex = self.db.ex().await?;

        R::check_unique(&mut ex, &fields, None).await?;

        let result = match R::insert(&mut ex, &fields).await {
            Ok(result) => result,
            // The insertion may hit a uniqueness constraint if a conflicting record was
            // created after the check above.
            Err(DbError::AlreadyExists) => return Err(R::conflict_error()),
            Err(e) => return Err(e.into()),
        };
        if *result.insert_id() == 0 {
            return Err(DriverError::BackendError(
                "Insertion did not assign an identifier".to_owned(),
            ));
        }
        Ok(result)
    }

    /// Updates the record of the `R` collection with identifier `id`, replacing the fields
    /// present in the request and keeping the stored values of the rest.
    pub(crate) async fn modify<R>(
        self,
        id: i64,
        name: Option<FieldValue>,
        value: Option<FieldValue>,
    ) -> DriverResult<UpdateOutcome>
    where
        R: Resource + Send,
    {
        let mut ex = self.db.ex().await?;

        let current = match R::get_by_id(&mut ex, id).await? {
            Some(current) => current,
            None => return Ok(UpdateOutcome::NotFound),
        };

        let fields = R::merge(&current, name, value)?;
        R::check_unique(&mut ex, &fields, Some(id)).await?;

        let changed = R::changed(&current, &fields);
        let matched = match R::update(&mut ex, id, &fields).await {
            Ok(matched) => matched,
            Err(DbError::AlreadyExists) => return Err(R::conflict_error()),
            Err(e) => return Err(e.into()),
        };
        match matched {
            1 if changed => Ok(UpdateOutcome::Updated),
            1 => Ok(UpdateOutcome::NoChanges),
            matched => Err(DriverError::BackendError(format!(
                "Update matched {} rows for identifier {}",
                matched, id
            ))),
        }
    }

    /// Deletes the record of the `R` collection with identifier `id`.
    pub(crate) async fn remove<R>(self, id: i64) -> DriverResult<DeleteOutcome>
    where
        R: Resource,
    {
        let mut ex = self.db.ex().await?;

        if R::get_by_id(&mut ex, id).await?.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let deleted = R::delete(&mut ex, id).await?;
        if deleted == 1 { Ok(DeleteOutcome::Deleted) } else { Ok(DeleteOutcome::NothingDeleted) }
    }
}
