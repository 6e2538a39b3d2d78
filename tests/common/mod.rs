#![allow(dead_code)]

use atelier_back::{
    AppState, app,
    config::{DatabaseConfig, Environment},
    database,
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const PREFIX: &str = "/api/v1";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_environment(Environment::Production).await
    }

    pub async fn with_environment(environment: Environment) -> Self {
        let pool = database::create_pool(&DatabaseConfig::in_memory())
            .await
            .expect("in-memory database");
        let router = app::router(AppState::new(pool.clone(), environment), PREFIX);
        Self { router, pool }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let uri = if path.starts_with("/health") {
            path.to_string()
        } else {
            format!("{}{}", PREFIX, path)
        };

        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        (status, json)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, None).await
    }

    /// Creates a record and returns its id.
    pub async fn create(&self, path: &str, body: Value) -> i64 {
        let (status, json) = self.post(path, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {path}: {json}");
        json["data"]["id"].as_i64().expect("created id")
    }
}
