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

//! Database operations for the `produtos` table.

#[cfg(feature = "postgres")]
use crate::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use crate::db::sqlite;
use crate::db::{DbResult, Executor};
use crate::model::{MutationResult, Product, ProductFields};
use futures::TryStreamExt;
use sqlx::Row;

/// Gets all products in the order in which they are stored.
pub(crate) async fn list(ex: &mut Executor) -> DbResult<Vec<Product>> {
    let mut products = vec![];

    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id_produto, nome_produto, valor_produto FROM produtos";
            let mut rows = sqlx::query(query_str).fetch(&mut **ex);
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                let id: i64 = row.try_get("id_produto").map_err(postgres::map_sqlx_error)?;
                let name: String = row.try_get("nome_produto").map_err(postgres::map_sqlx_error)?;
                let price: f64 = row.try_get("valor_produto").map_err(postgres::map_sqlx_error)?;
                products.push(Product::new(id, name, price));
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id_produto, nome_produto, valor_produto FROM produtos";
            let mut rows = sqlx::query(query_str).fetch(&mut **ex);
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let id: i64 = row.try_get("id_produto").map_err(sqlite::map_sqlx_error)?;
                let name: String = row.try_get("nome_produto").map_err(sqlite::map_sqlx_error)?;
                let price: f64 = row.try_get("valor_produto").map_err(sqlite::map_sqlx_error)?;
                products.push(Product::new(id, name, price));
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }

    Ok(products)
}

/// Gets the product with identifier `id`, or `None` if it does not exist.
pub(crate) async fn get_by_id(ex: &mut Executor, id: i64) -> DbResult<Option<Product>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id_produto, nome_produto, valor_produto FROM produtos \
                WHERE id_produto = $1";
            match sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?
            {
                Some(row) => {
                    let id: i64 = row.try_get("id_produto").map_err(postgres::map_sqlx_error)?;
                    let name: String =
                        row.try_get("nome_produto").map_err(postgres::map_sqlx_error)?;
                    let price: f64 =
                        row.try_get("valor_produto").map_err(postgres::map_sqlx_error)?;
                    Ok(Some(Product::new(id, name, price)))
                }
                None => Ok(None),
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT id_produto, nome_produto, valor_produto FROM produtos WHERE id_produto = ?";
            match sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?
            {
                Some(row) => {
                    let id: i64 = row.try_get("id_produto").map_err(sqlite::map_sqlx_error)?;
                    let name: String =
                        row.try_get("nome_produto").map_err(sqlite::map_sqlx_error)?;
                    let price: f64 =
                        row.try_get("valor_produto").map_err(sqlite::map_sqlx_error)?;
                    Ok(Some(Product::new(id, name, price)))
                }
                None => Ok(None),
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new product with the contents of `fields`.
///
/// The returned counters carry the identifier assigned to the new row.
pub(crate) async fn insert(ex: &mut Executor, fields: &ProductFields) -> DbResult<MutationResult> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO produtos (nome_produto, valor_produto)
                VALUES ($1, $2)
                RETURNING id_produto
            ";
            let row = sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.price())
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let id: i64 = row.try_get("id_produto").map_err(postgres::map_sqlx_error)?;
            Ok(MutationResult::new(id, 1, 0))
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO produtos (nome_produto, valor_produto) VALUES (?, ?)";
            let result = sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.price())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(MutationResult::new(result.last_insert_rowid(), result.rows_affected(), 0))
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Overwrites the contents of the product with identifier `id` with `fields`.
///
/// Returns the number of rows that matched the identifier, which is zero when the product
/// does not exist.
pub(crate) async fn update(ex: &mut Executor, id: i64, fields: &ProductFields) -> DbResult<u64> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "UPDATE produtos SET nome_produto = $1, valor_produto = $2 WHERE id_produto = $3";
            sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.price())
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "UPDATE produtos SET nome_produto = ?, valor_produto = ? WHERE id_produto = ?";
            sqlx::query(query_str)
                .bind(fields.name())
                .bind(fields.price())
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

/// Deletes the product with identifier `id`.
///
/// Returns the number of rows deleted, which is zero when the product does not exist.
pub(crate) async fn delete(ex: &mut Executor, id: i64) -> DbResult<u64> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM produtos WHERE id_produto = $1";
            sqlx::query(query_str)
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM produtos WHERE id_produto = ?";
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
