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

//! Helpers shared by the REST handler tests.

use crate::db::{self, Db};
use crate::driver::Driver;
use crate::model::{Customer, CustomerFields, FieldValue, Product, ProductFields};
use crate::rest::{ErrorResponse, app};
use axum::Router;
use axum::extract::Request;
use axum::http::{self, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::util::ServiceExt;

/// Cap on response bodies read back during tests.
const MAX_BODY_SIZE: usize = 1024;

/// State of a running app under test plus direct access to its database.
pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(crate::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());
        let app = app(driver);
        Self { db, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Inserts a customer directly into the database and returns its identifier.
    pub(crate) async fn insert_customer(&self, name: &str, cpf: &str) -> i64 {
        let fields =
            CustomerFields::new(FieldValue::Text(name.to_owned()), FieldValue::Text(cpf.to_owned()))
                .unwrap();
        *db::customers::insert(&mut self.db.ex().await.unwrap(), &fields)
            .await
            .unwrap()
            .insert_id()
    }

    /// Inserts a product directly into the database and returns its identifier.
    pub(crate) async fn insert_product(&self, name: &str, price: f64) -> i64 {
        let fields =
            ProductFields::new(FieldValue::Text(name.to_owned()), FieldValue::Number(price))
                .unwrap();
        *db::products::insert(&mut self.db.ex().await.unwrap(), &fields)
            .await
            .unwrap()
            .insert_id()
    }

    /// Fetches a customer directly from the database.
    pub(crate) async fn get_customer(&self, id: i64) -> Option<Customer> {
        db::customers::get_by_id(&mut self.db.ex().await.unwrap(), id).await.unwrap()
    }

    /// Fetches a product directly from the database.
    pub(crate) async fn get_product(&self, id: i64) -> Option<Product> {
        db::products::get_by_id(&mut self.db.ex().await.unwrap(), id).await.unwrap()
    }

    /// Counts the customers stored in the database.
    pub(crate) async fn count_customers(&self) -> usize {
        db::customers::list(&mut self.db.ex().await.unwrap()).await.unwrap().len()
    }

    /// Counts the products stored in the database.
    pub(crate) async fn count_products(&self) -> usize {
        db::products::list(&mut self.db.ex().await.unwrap()).await.unwrap().len()
    }
}

/// Assembles one request and fires it at the router under test.
#[must_use]
pub(crate) struct OneShotBuilder {
    /// Router that will serve the request.
    app: Router,

    /// Accumulated request pieces pending dispatch.
    builder: axum::http::request::Builder,
}

impl OneShotBuilder {
    /// Starts a request for the `method`/`uri` pair against `app`.
    pub(crate) fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
        let builder = Request::builder().method(method).uri(uri.as_ref());
        Self { app, builder }
    }

    /// Appends `query` to the request URI.
    pub(crate) fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
        let uri = self.builder.uri_ref().unwrap().to_string();
        assert!(!uri.contains('?'), "Query string already present in {}", uri);
        self.builder =
            self.builder.uri(format!("{}?{}", uri, serde_urlencoded::to_string(query).unwrap()));
        self
    }

    /// Adds the `name: value` header to the request.
    pub(crate) fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Dispatches the request without a body.
    pub(crate) async fn send_empty(self) -> ResponseChecker {
        let request = self.builder.body(axum::body::Body::empty()).unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Dispatches the request with a plain text `text` body.
    pub(crate) async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
            .body(axum::body::Body::from(text.into()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Dispatches the request with `request` serialized as its JSON body.
    pub(crate) async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }
}

/// Response type produced by driving the router with `oneshot`.
type HttpResponse = hyper::Response<axum::body::Body>;

/// Inspects the response that came back from a dispatched request.
#[must_use]
pub(crate) struct ResponseChecker {
    /// Response under inspection.
    response: HttpResponse,

    /// Status the response is supposed to carry.
    exp_status: http::StatusCode,
}

impl From<HttpResponse> for ResponseChecker {
    fn from(response: HttpResponse) -> Self {
        Self { response, exp_status: http::StatusCode::OK }
    }
}

impl ResponseChecker {
    /// Declares that the response must carry `status`.
    pub(crate) fn expect_status(mut self, status: http::StatusCode) -> Self {
        self.exp_status = status;
        self
    }

    /// Runs the checks that apply to every response.
    pub(crate) fn verify(&self) {
        assert_eq!(self.exp_status, self.response.status());
    }

    /// Finishes checking the response and expects its body to be an `ErrorResponse` whose
    /// message matches `exp_re`.
    pub(crate) async fn expect_error(self, exp_re: &str) {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        let response: ErrorResponse = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(e) => {
                let body = String::from_utf8(body.to_vec()).unwrap();
                panic!("Error body failed to parse ({}); raw content: {}", e, body);
            }
        };
        let re = regex::Regex::new(exp_re).unwrap();
        assert!(
            re.is_match(&response.message),
            "Error message in {:?} does not match '{}'",
            response,
            exp_re
        );
    }

    /// Deserializes the response body into a `T` after running the common checks.
    pub(crate) async fn expect_json<T: DeserializeOwned>(self) -> T {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        serde_json::from_slice::<T>(&body).unwrap()
    }
}

/// Generates a test that sends non-JSON payloads to `route` and expects each of them to
/// collapse into the canonical validation error.
macro_rules! test_payload_must_be_json [
    ( $app:expr, $route:expr ) => {
        #[tokio::test]
        async fn test_payload_must_be_json() {
            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                .send_text("plain text, no json here")
                .await
                .expect_status(axum::http::StatusCode::BAD_REQUEST)
                .expect_error($crate::rest::MSG_INVALID_PAYLOAD)
                .await;

            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                .send_text("plain text, no json here")
                .await
                .expect_status(axum::http::StatusCode::BAD_REQUEST)
                .expect_error($crate::rest::MSG_INVALID_PAYLOAD)
                .await;
        }
    }
];

pub(crate) use test_payload_must_be_json;

/// Generates a test that sends a payload to a `route` that takes none and expects the
/// request to be rejected.
macro_rules! test_payload_must_be_empty [
    ( $app:expr, $route:expr $(, $query:expr)? ) => {
        #[tokio::test]
        async fn test_payload_must_be_empty() {
            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .send_text("unsolicited content")
                .await
                .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                .expect_error("should be empty")
                .await;
        }
    }
];

pub(crate) use test_payload_must_be_empty;
