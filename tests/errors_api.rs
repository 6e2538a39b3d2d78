mod common;

use atelier_back::config::Environment;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn unknown_route_returns_not_found_envelope() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/widgets").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"success": false, "error": "NotFoundError", "message": "Route not found"})
    );
}

#[tokio::test]
async fn wrong_method_returns_not_found_envelope() {
    let app = TestApp::new().await;
    app.create("/colors", json!({"name": "Teal"})).await;

    let expected = json!({"success": false, "error": "NotFoundError", "message": "Route not found"});

    let (status, body) = app.patch("/colors", json!({"name": "Red"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, expected);

    let (status, body) = app.post("/colors/1", json!({"name": "Red"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn malformed_path_id_is_a_validation_error() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/colors/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("ValidationError"));
    assert_eq!(body["message"], json!("Invalid id 'abc'"));
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/colors")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("ValidationError"));

    let (status, _) = app.post("/colors", json!({"hexCode": "#FFF"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/colors", json!({"name": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_uptime() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].is_string());

    let (status, body) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], json!("connected"));
}

#[tokio::test]
async fn internal_errors_are_masked_in_production() {
    let app = TestApp::new().await;
    sqlx::query("DROP TABLE collection_variants").execute(&app.pool).await.unwrap();

    let (status, body) = app.get("/variants?collectionId=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": "InternalServerError",
            "message": "An unexpected error occurred"
        })
    );
}

#[tokio::test]
async fn internal_errors_are_revealed_in_development() {
    let app = TestApp::with_environment(Environment::Development).await;
    sqlx::query("DROP TABLE collection_variants").execute(&app.pool).await.unwrap();

    let (status, body) = app.get("/variants?collectionId=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("InternalServerError"));
    assert!(body["message"].as_str().unwrap().contains("no such table"));
}
