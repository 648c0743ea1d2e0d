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

//! Customer-specific pieces of the business logic.

use crate::db::{self, DbResult, Executor};
use crate::driver::{DriverError, DriverResult, Resource};
use crate::model::{
    self, Customer, CustomerFields, CustomerPayload, FieldValue, ModelResult, MutationResult,
};
use async_trait::async_trait;

/// The customers collection.
pub(crate) struct Customers;

#[async_trait]
impl Resource for Customers {
    const NAME: &'static str = "customer";

    const ID_QUERY_PARAM: &'static str = "idCliente";

    type Record = Customer;
    type Payload = CustomerPayload;
    type Fields = CustomerFields;

    fn split_payload(payload: CustomerPayload) -> (Option<FieldValue>, Option<FieldValue>) {
        (model::normalize(payload.nome), model::normalize(payload.cpf))
    }

    fn new_fields(name: FieldValue, value: FieldValue) -> ModelResult<CustomerFields> {
        CustomerFields::new(name, value)
    }

    fn merge(
        current: &Customer,
        name: Option<FieldValue>,
        value: Option<FieldValue>,
    ) -> ModelResult<CustomerFields> {
        Ok(CustomerFields::merge(current, name, value))
    }

    fn changed(current: &Customer, fields: &CustomerFields) -> bool {
        current.name() != fields.name() || current.cpf() != fields.cpf()
    }

    fn conflict_error() -> DriverError {
        DriverError::AlreadyExists("invalid tax id".to_owned())
    }

    /// Tax ids must be unique across customers, except that a customer may keep its own.
    async fn check_unique(
        ex: &mut Executor,
        fields: &CustomerFields,
        exclude_id: Option<i64>,
    ) -> DriverResult<()> {
        match db::customers::get_by_cpf(ex, fields.cpf()).await? {
            Some(existing) if exclude_id != Some(*existing.id()) => Err(Self::conflict_error()),
            _ => Ok(()),
        }
    }

    async fn list(ex: &mut Executor) -> DbResult<Vec<Customer>> {
        db::customers::list(ex).await
    }

    async fn get_by_id(ex: &mut Executor, id: i64) -> DbResult<Option<Customer>> {
        db::customers::get_by_id(ex, id).await
    }

    async fn insert(ex: &mut Executor, fields: &CustomerFields) -> DbResult<MutationResult> {
        db::customers::insert(ex, fields).await
    }

    async fn update(ex: &mut Executor, id: i64, fields: &CustomerFields) -> DbResult<u64> {
        db::customers::update(ex, id, fields).await
    }

    async fn delete(ex: &mut Executor, id: i64) -> DbResult<u64> {
        db::customers::delete(ex, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    #[test]
    fn test_split_payload_treats_blank_text_as_absent() {
        let payload = CustomerPayload {
            nome: Some(FieldValue::Text("   ".to_owned())),
            cpf: Some(FieldValue::Text("12345678901".to_owned())),
        };
        let (name, value) = Customers::split_payload(payload);
        assert_eq!(None, name);
        assert_eq!(Some(FieldValue::Text("12345678901".to_owned())), value);

        let payload = CustomerPayload { nome: None, cpf: None };
        assert_eq!((None, None), Customers::split_payload(payload));
    }

    fn fields(name: &str, cpf: &str) -> CustomerFields {
        CustomerFields::new(FieldValue::Text(name.to_owned()), FieldValue::Text(cpf.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_check_unique_accepts_unused_tax_ids() {
        let context = TestContext::setup().await;
        context.insert_customer("Ana", "11111111111").await;

        let mut ex = context.ex().await;
        Customers::check_unique(&mut ex, &fields("Bia", "22222222222"), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_unique_rejects_taken_tax_ids() {
        let context = TestContext::setup().await;
        let id = context.insert_customer("Ana", "11111111111").await;

        let mut ex = context.ex().await;
        let err = Customers::check_unique(&mut ex, &fields("Bia", "11111111111"), None)
            .await
            .unwrap_err();
        assert_eq!(DriverError::AlreadyExists("invalid tax id".to_owned()), err);

        // Excluding an unrelated record does not lift the conflict.
        let err = Customers::check_unique(&mut ex, &fields("Bia", "11111111111"), Some(id + 1))
            .await
            .unwrap_err();
        assert_eq!(DriverError::AlreadyExists("invalid tax id".to_owned()), err);
    }

    #[tokio::test]
    async fn test_check_unique_ignores_the_excluded_record() {
        let context = TestContext::setup().await;
        let id = context.insert_customer("Ana", "11111111111").await;

        let mut ex = context.ex().await;
        Customers::check_unique(&mut ex, &fields("Ana", "11111111111"), Some(id)).await.unwrap();
    }
}
