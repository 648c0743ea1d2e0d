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

//! Database operations for the `clientes` table.

#[cfg(feature = "postgres")]
use crate::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use crate::db::sqlite;
use crate::db::{DbResult, Executor};
use crate::model::{Customer, CustomerFields, MutationResult};
use futures::TryStreamExt;
use sqlx::Row;

/// Gets all customers in the order in which they are stored.
pub(crate) async fn list(ex: &mut Executor) -> DbResult<Vec<Customer>> {
    let mut customers = vec![];

    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id_cliente, nome_cliente, cpf_cliente FROM clientes";
            let mut rows = sqlx::query(query_str).fetch(&mut **ex);
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                let id: i64 = row.try_get("id_cliente").map_err(postgres::map_sqlx_error)?;
                let name: String = row.try_get("nome_cliente").map_err(postgres::map_sqlx_error)?;
                let cpf: String = row.try_get("cpf_cliente").map_err(postgres::map_sqlx_error)?;
                customers.push(Customer::new(id, name, cpf));
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id_cliente, nome_cliente, cpf_cliente FROM clientes";
            let mut rows = sqlx::query(query_str).fetch(&mut **ex);
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let id: i64 = row.try_get("id_cliente").map_err(sqlite::map_sqlx_error)?;
                let name: String = row.try_get("nome_cliente").map_err(sqlite::map_sqlx_error)?;
                let cpf: String = row.try_get("cpf_cliente").map_err(sqlite::map_sqlx_error)?;
                customers.push(Customer::new(id, name, cpf));
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }

    Ok(customers)
}

/// Gets the customer with identifier `id`, or `None` if it does not exist.
pub(crate) async fn get_by_id(ex: &mut Executor, id: i64) -> DbResult<Option<Customer>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "SELECT id_cliente, nome_cliente, cpf_cliente FROM clientes WHERE id_cliente = $1";
            match sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?
            {
                Some(row) => {
                    let id: i64 = row.try_get("id_cliente").map_err(postgres::map_sqlx_error)?;
                    let name: String =
                        row.try_get("nome_cliente").map_err(postgres::map_sqlx_error)?;
                    let cpf: String =
                        row.try_get("cpf_cliente").map_err(postgres::map_sqlx_error)?;
                    Ok(Some(Customer::new(id, name, cpf)))
                }
                None => Ok(None),
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT id_cliente, nome_cliente, cpf_cliente FROM clientes WHERE id_cliente = ?";
            match sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?
            {
                Some(row) => {
                    let id: i64 = row.try_get("id_cliente").map_err(sqlite::map_sqlx_error)?;
                    let name: String =
                        row.try_get("nome_cliente").map_err(sqlite::map_sqlx_error)?;
                    let cpf: String = row.try_get("cpf_cliente").map_err(sqlite::map_sqlx_error)?;
                    Ok(Some(Customer::new(id, name, cpf)))
                }
                None => Ok(None),
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the customer whose tax id is exactly `cpf`, or `None` if there is none.
pub(crate) async fn get_by_cpf(ex: &mut Executor, cpf: &str) -> DbResult<Option<Customer>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "SELECT id_cliente, nome_cliente, cpf_cliente FROM clientes WHERE cpf_cliente = $1";
            match sqlx::query(query_str)
                .bind(cpf)
                .fetch_optional(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?
            {
                Some(row) => {
                    let id: i64 = row.try_get("id_cliente").map_err(postgres::map_sqlx_error)?;
                    let name: String =
                        row.try_get("nome_cliente").map_err(postgres::map_sqlx_error)?;
                    let cpf: String =
                        row.try_get("cpf_cliente").map_err(postgres::map_sqlx_error)?;
                    Ok(Some(Customer::new(id, name, cpf)))
                }
                None => Ok(None),
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT id_cliente, nome_cliente, cpf_cliente FROM clientes WHERE cpf_cliente = ?";
            match sqlx::query(query_str)
                .bind(cpf)
                .fetch_optional(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?
            {
                Some(row) => {
                    let id: i64 = row.try_get("id_cliente").map_err(sqlite::map_sqlx_error)?;
                    let name: String =
                        row.try_get("nome_cliente").map_err(sqlite::map_sqlx_error)?;
                    let cpf: String = row.try_get("cpf_cliente").map_err(sqlite::map_sqlx_error)?;
                    Ok(Some(Customer::new(id, name, cpf)))
                }
                None => Ok(None),
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new customer with the contents of `fields`.
///
/// The returned counters carry the identifier assigned to the new row.
pub(crate) async fn insert(ex: &mut Executor, fields: &CustomerFields) -> DbResult<MutationResult> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO clientes (nome_cliente, cpf_cliente)
                VALUES ($1, $2)
                RETURNING id_cliente
            ";
            let row = sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.cpf())
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let id: i64 = row.try_get("id_cliente").map_err(postgres::map_sqlx_error)?;
            Ok(MutationResult::new(id, 1, 0))
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO clientes (nome_cliente, cpf_cliente) VALUES (?, ?)";
            let result = sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.cpf())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(MutationResult::new(result.last_insert_rowid(), result.rows_affected(), 0))
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Overwrites the contents of the customer with identifier `id` with `fields`.
///
/// Returns the number of rows that matched the identifier, which is zero when the customer
/// does not exist.
pub(crate) async fn update(ex: &mut Executor, id: i64, fields: &CustomerFields) -> DbResult<u64> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "UPDATE clientes SET nome_cliente = $1, cpf_cliente = $2 WHERE id_cliente = $3";
            sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.cpf())
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "UPDATE clientes SET nome_cliente = ?, cpf_cliente = ? WHERE id_cliente = ?";
            sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.cpf())
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(rows_affected)
}

/// Deletes the customer with identifier `id`.
///
/// Returns the number of rows deleted, which is zero when the customer does not exist.
pub(crate) async fn delete(ex: &mut Executor, id: i64) -> DbResult<u64> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM clientes WHERE id_cliente = $1";
            sqlx::query(query_str)
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM clientes WHERE id_cliente = ?";
            sqlx::query(query_str)
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(rows_affected)
}
