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

//! Helpers shared by the driver tests.

use crate::db::{self, Db, Executor};
use crate::driver::Driver;
use crate::model::{Customer, CustomerFields, FieldValue, Product, ProductFields};
use std::sync::Arc;

pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    driver: Driver,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(crate::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());
        Self { db, driver }
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Obtains an executor for direct database manipulation.
    ///
    /// The pool behind the test database has a single connection, so the returned executor
    /// must be dropped before invoking any driver operation.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Inserts a customer directly into the database and returns its identifier.
    pub(crate) async fn insert_customer(&self, name: &str, cpf: &str) -> i64 {
        let fields =
            CustomerFields::new(FieldValue::Text(name.to_owned()), FieldValue::Text(cpf.to_owned()))
                .unwrap();
        let mut ex = self.ex().await;
        *db::customers::insert(&mut ex, &fields).await.unwrap().insert_id()
    }

    /// Inserts a product directly into the database and returns its identifier.
    pub(crate) async fn insert_product(&self, name: &str, price: f64) -> i64 {
        let fields =
            ProductFields::new(FieldValue::Text(name.to_owned()), FieldValue::Number(price))
                .unwrap();
        let mut ex = self.ex().await;
        *db::products::insert(&mut ex, &fields).await.unwrap().insert_id()
    }

    /// Fetches a customer directly from the database.
    pub(crate) async fn get_customer(&self, id: i64) -> Option<Customer> {
        let mut ex = self.ex().await;
        db::customers::get_by_id(&mut ex, id).await.unwrap()
    }

    /// Fetches a product directly from the database.
    pub(crate) async fn get_product(&self, id: i64) -> Option<Product> {
        let mut ex = self.ex().await;
        db::products::get_by_id(&mut ex, id).await.unwrap()
    }

    /// Counts the customers stored in the database.
    pub(crate) async fn count_customers(&self) -> usize {
        let mut ex = self.ex().await;
        db::customers::list(&mut ex).await.unwrap().len()
    }
}
