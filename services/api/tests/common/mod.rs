#![allow(dead_code)]

use api_lib::{
    adapters::{FileCatalogLoader, InMemoryStore, UsdaFoodAdapter},
    config::Config,
    web::{build_router, AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use nutrilog_core::FoodCatalog;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// An app on the in-memory store, the built-in catalog sample, and a USDA
    /// endpoint nothing listens on.
    pub fn new() -> Self {
        let mut config = Config::for_tests();
        config.catalog_data_dir = PathBuf::from("/nonexistent/nutrilog-test-catalog");
        let config = Arc::new(config);

        let usda = Arc::new(UsdaFoodAdapter::new(
            reqwest::Client::new(),
            config.usda_base_url.clone(),
            config.usda_api_key.clone(),
        ));
        let catalog = Arc::new(FoodCatalog::new(Arc::new(FileCatalogLoader::new(
            config.catalog_data_dir.clone(),
        ))));
        let state = AppState::with_store(Arc::new(InMemoryStore::new()), usda, catalog, config);

        Self {
            router: build_router(Arc::new(state)).expect("router"),
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response");

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            body,
            set_cookie,
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request("GET", uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.request("POST", uri, Some(cookie), Some(body)).await
    }

    /// Signs up a new account and returns its `session=...` cookie.
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .request(
                "POST",
                "/auth/signup",
                None,
                Some(serde_json::json!({ "email": email, "password": "correct horse" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        session_cookie(&response)
    }
}

pub fn session_cookie(response: &TestResponse) -> String {
    response
        .set_cookie
        .as_deref()
        .and_then(|c| c.split(';').next())
        .expect("session cookie")
        .to_string()
}

pub fn approx(value: &Value, expected: f64) -> bool {
    value
        .as_f64()
        .is_some_and(|v| (v - expected).abs() < 1e-6)
}
