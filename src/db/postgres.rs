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

//! PostgreSQL-backed implementation of the database abstraction.

use crate::db::{Db, DbError, DbResult, Executor};
use crate::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use futures::Future;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgDatabaseError, PgPool, PgPoolOptions, Postgres};
use std::fmt;
use std::time::Duration;

/// Fallback for `max_retries` when the environment does not configure one.
const DEFAULT_MAX_RETRIES: u16 = 60;

/// Translates the sqlx error `e` into this crate's database error type.
///
/// PostgreSQL reports the interesting conditions through well-known error codes.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.downcast_ref::<PgDatabaseError>().code() {
            "23503" /* foreign_key_violation */ => DbError::NotFound,
            "23505" /* unique_violation */ => DbError::AlreadyExists,
            "53300" /* too_many_connections */ => DbError::Unavailable,
            number => DbError::BackendError(format!("pgsql error {}: {}", number, e)),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Connection settings for a PostgreSQL server.
#[cfg_attr(test, derive(PartialEq))]
pub struct PostgresOptions {
    /// Server hostname or address.
    pub host: String,

    /// Port the server listens on (typically 5432).
    pub port: u16,

    /// Name of the database to use.
    pub database: String,

    /// User to authenticate as.
    pub username: String,

    /// Password for `username`.  Omitted from the `Debug` output.
    pub password: String,

    /// Lower bound of connections the pool keeps open.
    pub min_connections: Option<u32>,

    /// Upper bound of connections the pool may open.
    pub max_connections: Option<u32>,

    /// How many times to retry acquiring a connection while the database reports itself as
    /// unavailable.
    pub max_retries: u16,
}

impl fmt::Debug for PostgresOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("min_connections", &self.min_connections)
            .field("max_connections", &self.max_connections)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl PostgresOptions {
    /// Builds the options from the `<prefix>_*` family of environment variables.
    ///
    /// `HOST`, `PORT`, `DATABASE`, `USERNAME` and `PASSWORD` must be set under the prefix;
    /// `MIN_CONNECTIONS`, `MAX_CONNECTIONS` and `MAX_RETRIES` may be omitted.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        Ok(PostgresOptions {
            host: get_required_var::<String>(prefix, "HOST")?,
            port: get_required_var::<u16>(prefix, "PORT")?,
            database: get_required_var::<String>(prefix, "DATABASE")?,
            username: get_required_var::<String>(prefix, "USERNAME")?,
            password: get_required_var::<String>(prefix, "PASSWORD")?,
            min_connections: get_optional_var::<u32>(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
            max_retries: get_optional_var::<u16>(prefix, "MAX_RETRIES")?
                .unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }
}

/// Runs `op` until it stops failing with `DbError::Unavailable`, up to `retries` times.
///
/// The waits between attempts grow and carry some jitter so that a herd of waiters does not
/// wake up at once.
async fn retry<Op, OpFut, T>(op: Op, mut retries: u16) -> DbResult<T>
where
    Op: Fn() -> OpFut,
    OpFut: Future<Output = Result<T, sqlx::Error>>,
    T: Send + Sync,
{
    let mut delay = Duration::from_millis(100 + u64::from(rand::random::<u16>() % 900));
    loop {
        match op().await.map_err(map_sqlx_error) {
            Ok(result) => return Ok(result),
            Err(DbError::Unavailable) => {
                if retries == 0 {
                    return Err(DbError::Unavailable);
                }
                retries -= 1;

                warn!(
                    "Database unavailable; sleeping {}ms before retrying ({} attempts left)",
                    delay.as_millis(),
                    retries
                );

                tokio::time::sleep(delay).await;
                if delay < Duration::from_secs(5) {
                    delay += Duration::from_millis(u64::from(rand::random::<u16>() % 1000));
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// A database instance backed by a PostgreSQL connection pool.
pub struct PostgresDb {
    /// Pool from which all executors are acquired.
    pool: PgPool,

    /// How many times to retry acquiring a connection while the database reports itself as
    /// unavailable.
    max_retries: u16,
}

impl Drop for PostgresDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            if cfg!(debug_assertions) {
                panic!("Dropping database with an open pool; missing call to close()");
            } else {
                warn!("Dropping database with an open pool; missing call to close()");
            }
        }
    }
}

impl PostgresDb {
    /// Prepares a pool against the server described by `opts`.
    ///
    /// No connection is established here; that happens lazily on the first acquire.
    pub fn connect(opts: PostgresOptions) -> DbResult<Self> {
        let mut pool_options = PgPoolOptions::new();
        if let Some(min_connections) = opts.min_connections {
            pool_options = pool_options.min_connections(min_connections);
        }
        if let Some(max_connections) = opts.max_connections {
            pool_options = pool_options.max_connections(max_connections);
        }
        pool_options = pool_options.acquire_timeout(Duration::from_secs(2));

        let options = PgConnectOptions::new()
            .host(&opts.host)
            .port(opts.port)
            .database(&opts.database)
            .username(&opts.username)
            .password(&opts.password);

        let pool = pool_options.connect_lazy_with(options);
        Ok(Self { pool, max_retries: opts.max_retries })
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        let conn = retry(|| self.pool.acquire(), self.max_retries).await?;
        Ok(Executor::Postgres(conn))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Feeds the statements in `schema` to the database behind `conn`, one at a time.
pub async fn run_schema(conn: &mut PoolConnection<Postgres>, schema: &str) -> DbResult<()> {
    // sqlx runs a single statement per query, so the schema has to be split at semicolons.
    // Comments must go first or they could swallow a separator.
    let schema =
        regex::RegexBuilder::new("--.*$").multi_line(true).build().unwrap().replace_all(schema, "");

    for query_str in schema.split(';') {
        if query_str.trim().is_empty() {
            continue;
        }
        sqlx::query(query_str).execute(&mut **conn).await.map_err(map_sqlx_error)?;
    }
    Ok(())
}

/// Helpers for tests that run against a live PostgreSQL server.
#[cfg(test)]
pub(crate) mod testutils {
    use super::*;

    /// Opens a connection to the database configured by the `PGSQL_TEST_*` environment
    /// variables.
    ///
    /// Tables land in the `pg_temp` schema, which the server wipes when the connection goes
    /// away.  That trick only works while the pool holds exactly one connection, so the pool
    /// is pinned to that size.
    ///
    /// Panics on failure because this only ever runs under tests.
    pub(crate) async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let mut opts = PostgresOptions::from_env("PGSQL_TEST").unwrap();
        opts.min_connections = Some(1);
        opts.max_connections = Some(1);
        let db = PostgresDb::connect(opts).unwrap();

        match db.ex().await.unwrap() {
            Executor::Postgres(mut conn) => {
                sqlx::query("SET search_path TO pg_temp").execute(&mut *conn).await.unwrap();
            }
            #[allow(unused)]
            _ => unreachable!(),
        }
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::generate_db_tests;
    use std::sync::Arc;

    generate_db_tests!(
        {
            let db: Arc<dyn Db + Send + Sync> = Arc::from(testutils::setup().await);
            crate::db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
            db
        },
        #[ignore = "Requires a PostgreSQL server configured through PGSQL_TEST variables"]
    );

    #[test]
    fn test_postgres_options_from_env_all_required_present() {
        temp_env::with_vars(
            [
                ("PGSQL_HOST", Some("db1.example.org")),
                ("PGSQL_PORT", Some("5433")),
                ("PGSQL_DATABASE", Some("cadastro")),
                ("PGSQL_USERNAME", Some("cadastro-rw")),
                ("PGSQL_PASSWORD", Some("oculta")),
                ("PGSQL_MIN_CONNECTIONS", None),
                ("PGSQL_MAX_CONNECTIONS", None),
                ("PGSQL_MAX_RETRIES", None),
            ],
            || {
                let opts = PostgresOptions::from_env("PGSQL").unwrap();
                assert_eq!(
                    PostgresOptions {
                        host: "db1.example.org".to_owned(),
                        port: 5433,
                        database: "cadastro".to_owned(),
                        username: "cadastro-rw".to_owned(),
                        password: "oculta".to_owned(),
                        min_connections: None,
                        max_connections: None,
                        max_retries: DEFAULT_MAX_RETRIES,
                    },
                    opts
                );
            },
        );
    }

    #[test]
    fn test_postgres_options_from_env_all_required_and_optional_present() {
        temp_env::with_vars(
            [
                ("PGSQL_HOST", Some("db1.example.org")),
                ("PGSQL_PORT", Some("5433")),
                ("PGSQL_DATABASE", Some("cadastro")),
                ("PGSQL_USERNAME", Some("cadastro-rw")),
                ("PGSQL_PASSWORD", Some("oculta")),
                ("PGSQL_MIN_CONNECTIONS", Some("2")),
                ("PGSQL_MAX_CONNECTIONS", Some("8")),
                ("PGSQL_MAX_RETRIES", Some("5")),
            ],
            || {
                let opts = PostgresOptions::from_env("PGSQL").unwrap();
                assert_eq!(
                    PostgresOptions {
                        host: "db1.example.org".to_owned(),
                        port: 5433,
                        database: "cadastro".to_owned(),
                        username: "cadastro-rw".to_owned(),
                        password: "oculta".to_owned(),
                        min_connections: Some(2),
                        max_connections: Some(8),
                        max_retries: 5,
                    },
                    opts
                );
            },
        );
    }

    #[test]
    fn test_postgres_options_from_env_missing_variable() {
        temp_env::with_vars(
            [
                ("PGSQL_HOST", Some("db1.example.org")),
                ("PGSQL_PORT", Some("5433")),
                ("PGSQL_DATABASE", Some("cadastro")),
                ("PGSQL_USERNAME", Some("cadastro-rw")),
                ("PGSQL_PASSWORD", None::<&str>),
            ],
            || {
                let err = PostgresOptions::from_env("PGSQL").unwrap_err();
                assert_eq!("Required environment variable PGSQL_PASSWORD not present", err);
            },
        );
    }

    #[test]
    fn test_postgres_options_debug_excludes_password() {
        let opts = PostgresOptions {
            host: "h".to_owned(),
            port: 5432,
            database: "d".to_owned(),
            username: "u".to_owned(),
            password: "super-secret".to_owned(),
            min_connections: None,
            max_connections: None,
            max_retries: DEFAULT_MAX_RETRIES,
        };
        let debug = format!("{:?}", opts);
        assert!(!debug.contains("super-secret"));
    }
}
