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

//! Storage layer with interchangeable backends.
//!
//! PostgreSQL backs production deployments and SQLite backs the test suite, so every query in
//! the submodules is written once per backend behind a common entry point.

use async_trait::async_trait;

pub(crate) mod customers;
#[cfg(feature = "postgres")]
pub mod postgres;
pub(crate) mod products;
#[cfg(any(feature = "sqlite", test))]
pub mod sqlite;

/// Database errors.  Conditions the service reacts to get their own variant; everything else
/// is lumped under `BackendError`.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// A row insertion collided with an existing row.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all for unexpected backend failures.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Stored data could not be decoded into its model type.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// The requested row is not in the database.
    #[error("Entity not found")]
    NotFound,

    /// The database cannot take the operation right now, e.g. because the connection pool has
    /// no free slots.
    #[error("Unavailable")]
    Unavailable,
}

/// Result alias used by the storage operations.
pub type DbResult<T> = Result<T, DbError>;

/// A connection checked out from one of the supported databases.
///
/// sqlx type-checks queries against a concrete database, so callers destructure this enum and
/// repeat each query once per backend instead of going through a generic interface.
pub enum Executor {
    /// Connection to a PostgreSQL database.
    #[cfg(feature = "postgres")]
    Postgres(sqlx::pool::PoolConnection<sqlx::Postgres>),

    /// Connection to an SQLite database.
    #[cfg(any(feature = "sqlite", test))]
    Sqlite(sqlx::pool::PoolConnection<sqlx::Sqlite>),
}

/// Capabilities common to all supported databases.
#[async_trait]
pub trait Db {
    /// Checks a connection out of the pool.
    ///
    /// The name is terse on purpose given how often call sites have to write it.
    async fn ex(&self) -> DbResult<Executor>;

    /// Closes the pool that backs the database, waiting for all connections to terminate.
    async fn close(&self);
}

/// Initializes the tables served by this service if they do not exist yet.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            postgres::run_schema(ex, include_str!("postgres.sql")).await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}
