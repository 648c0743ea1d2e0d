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

//! Product-specific pieces of the business logic.

use crate::db::{self, DbResult, Executor};
use crate::driver::Resource;
use crate::model::{
    self, FieldValue, ModelResult, MutationResult, Product, ProductFields, ProductPayload,
};
use async_trait::async_trait;

/// The products collection.
///
/// Products have no uniqueness requirements, so this relies on the default conflict
/// handling, which never triggers.
pub(crate) struct Products;

#[async_trait]
impl Resource for Products {
    const NAME: &'static str = "product";

    const ID_QUERY_PARAM: &'static str = "idProduto";

    type Record = Product;
    type Payload = ProductPayload;
    type Fields = ProductFields;

    fn split_payload(payload: ProductPayload) -> (Option<FieldValue>, Option<FieldValue>) {
        (model::normalize(payload.descricao), model::normalize(payload.valor))
    }

    fn new_fields(name: FieldValue, value: FieldValue) -> ModelResult<ProductFields> {
        ProductFields::new(name, value)
    }

    fn merge(
        current: &Product,
        name: Option<FieldValue>,
        value: Option<FieldValue>,
    ) -> ModelResult<ProductFields> {
        ProductFields::merge(current, name, value)
    }

    fn changed(current: &Product, fields: &ProductFields) -> bool {
        current.name() != fields.name() || current.price() != fields.price()
    }

    async fn list(ex: &mut Executor) -> DbResult<Vec<Product>> {
        db::products::list(ex).await
    }

    async fn get_by_id(ex: &mut Executor, id: i64) -> DbResult<Option<Product>> {
        db::products::get_by_id(ex, id).await
    }

    async fn insert(ex: &mut Executor, fields: &ProductFields) -> DbResult<MutationResult> {
        db::products::insert(ex, fields).await
    }

    async fn update(ex: &mut Executor, id: i64, fields: &ProductFields) -> DbResult<u64> {
        db::products::update(ex, id, fields).await
    }

    async fn delete(ex: &mut Executor, id: i64) -> DbResult<u64> {
        db::products::delete(ex, id).await
    }
}
