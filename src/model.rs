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

//! High-level data types used across all layers of the service.

use derive_getters::Getters;
use derive_more::Constructor;
use serde::Deserialize;
use serde::Serialize;
use std::borrow::Cow;

/// Indicates that payload data failed validation.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct ModelError(pub(crate) String);

/// Result type for validation problems.
pub(crate) type ModelResult<T> = Result<T, ModelError>;

/// A field in a request payload, which clients may supply either as a JSON string
/// or as a JSON number.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum FieldValue {
    /// The field was supplied as a JSON number.
    Number(f64),

    /// The field was supplied as a JSON string.
    Text(String),
}

impl FieldValue {
    /// Returns the textual form of the value, formatting numbers the same way they
    /// would appear in a JSON document.
    pub(crate) fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Text(t) => Cow::Borrowed(t),
        }
    }

    /// Returns the numeric form of the value, or `None` if the value is textual
    /// and does not represent a number.
    pub(crate) fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(t) => parse_number(t),
        }
    }

    /// Checks whether the value represents a number, either natively or as text
    /// that parses as one.
    pub(crate) fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }
}

/// Parses `text` as a finite number, tolerating surrounding whitespace.
///
/// Returns `None` for empty or whitespace-only strings and for non-finite values
/// such as `NaN` or `inf`.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Normalizes an optional payload field, treating blank text as an absent field.
pub(crate) fn normalize(field: Option<FieldValue>) -> Option<FieldValue> {
    match field {
        Some(FieldValue::Text(t)) if t.trim().is_empty() => None,
        field => field,
    }
}

/// Result of interpreting the identifier segment of a request path.
#[derive(Debug, PartialEq)]
pub(crate) enum PathId {
    /// A well-formed identifier that may match a stored row.
    Id(i64),

    /// A numeric identifier that can never match a stored row, such as a
    /// fractional one.
    Unmatchable,

    /// Text that does not denote a usable identifier at all, including zero.
    Invalid,
}

impl PathId {
    /// Interprets the identifier segment of a request path.
    pub(crate) fn parse(raw: &str) -> PathId {
        let raw = raw.trim();
        if let Ok(id) = raw.parse::<i64>() {
            if id == 0 { PathId::Invalid } else { PathId::Id(id) }
        } else {
            match parse_number(raw) {
                Some(n) if n != 0.0 => {
                    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
                        PathId::Id(n as i64)
                    } else {
                        PathId::Unmatchable
                    }
                }
                _ => PathId::Invalid,
            }
        }
    }
}

/// Representation of a single customer row.
#[derive(Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
pub(crate) struct Customer {
    /// Unique identifier of the customer.
    #[serde(rename = "id_cliente")]
    id: i64,

    /// Display name of the customer.
    #[serde(rename = "nome_cliente")]
    name: String,

    /// Tax identifier of the customer, stored as text in the form the client
    /// supplied it.
    #[serde(rename = "cpf_cliente")]
    cpf: String,
}

/// Representation of a single product row.
#[derive(Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
pub(crate) struct Product {
    /// Unique identifier of the product.
    #[serde(rename = "id_produto")]
    id: i64,

    /// Description of the product.
    #[serde(rename = "nome_produto")]
    name: String,

    /// Unit price of the product.
    #[serde(rename = "valor_produto")]
    price: f64,
}

/// Counters describing the effects of a single write operation.
#[derive(Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
#[serde(rename_all = "camelCase")]
pub(crate) struct MutationResult {
    /// Identifier assigned to the row created by an insertion, or 0 when the
    /// operation did not create one.
    insert_id: i64,

    /// Number of rows matched by the operation.
    affected_rows: u64,

    /// Number of rows whose stored contents actually changed.
    changed_rows: u64,
}

/// Wire format of the optional fields in customer creation and update payloads.
///
/// Unknown fields in the payload are ignored.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct CustomerPayload {
    /// Display name of the customer.
    pub(crate) nome: Option<FieldValue>,

    /// Tax identifier of the customer.
    pub(crate) cpf: Option<FieldValue>,
}

/// Wire format of the optional fields in product creation and update payloads.
///
/// Unknown fields in the payload are ignored.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct ProductPayload {
    /// Description of the product.
    pub(crate) descricao: Option<FieldValue>,

    /// Unit price of the product.
    pub(crate) valor: Option<FieldValue>,
}

/// Validated content of a customer record, ready to be written to the database.
#[derive(Getters)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct CustomerFields {
    /// Display name of the customer.
    name: String,

    /// Tax identifier of the customer.
    cpf: String,
}

impl CustomerFields {
    /// Validates the payload of a creation request.
    ///
    /// Names must not look numeric and tax identifiers must.
    pub(crate) fn new(name: FieldValue, cpf: FieldValue) -> ModelResult<Self> {
        if name.is_numeric() {
            return Err(ModelError(format!("Name '{}' cannot be a number", name.as_text())));
        }
        if !cpf.is_numeric() {
            return Err(ModelError(format!("Tax id '{}' is not a number", cpf.as_text())));
        }
        Ok(Self { name: name.as_text().into_owned(), cpf: cpf.as_text().into_owned() })
    }

    /// Combines the fields of an update request with the values stored in
    /// `current`, keeping the stored value of any field the request omits.
    pub(crate) fn merge(
        current: &Customer,
        name: Option<FieldValue>,
        cpf: Option<FieldValue>,
    ) -> Self {
        let name = match name {
            Some(name) => name.as_text().into_owned(),
            None => current.name().clone(),
        };
        let cpf = match cpf {
            Some(cpf) => cpf.as_text().into_owned(),
            None => current.cpf().clone(),
        };
        Self { name, cpf }
    }
}

/// Validated content of a product record, ready to be written to the database.
#[derive(Getters)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct ProductFields {
    /// Description of the product.
    name: String,

    /// Unit price of the product.
    price: f64,
}

impl ProductFields {
    /// Validates the payload of a creation request.
    ///
    /// Descriptions must not look numeric and prices must.
    pub(crate) fn new(name: FieldValue, price: FieldValue) -> ModelResult<Self> {
        if name.is_numeric() {
            return Err(ModelError(format!("Description '{}' cannot be a number", name.as_text())));
        }
        let price = match price.as_number() {
            Some(price) => price,
            None => {
                return Err(ModelError(format!("Price '{}' is not a number", price.as_text())));
            }
        };
        Ok(Self { name: name.as_text().into_owned(), price })
    }

    /// Combines the fields of an update request with the values stored in
    /// `current`, keeping the stored value of any field the request omits.
    ///
    /// A supplied price must be numeric because that is how it is persisted; a
    /// supplied description is taken as-is.
    pub(crate) fn merge(
        current: &Product,
        name: Option<FieldValue>,
        price: Option<FieldValue>,
    ) -> ModelResult<Self> {
        let name = match name {
            Some(name) => name.as_text().into_owned(),
            None => current.name().clone(),
        };
        let price = match price {
            Some(price) => match price.as_number() {
                Some(price) => price,
                None => {
                    return Err(ModelError(format!("Price '{}' is not a number", price.as_text())));
                }
            },
            None => *current.price(),
        };
        Ok(Self { name, price })
    }
}
