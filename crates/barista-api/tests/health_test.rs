//! Health endpoint integration tests.
//!
//! Run with: `cargo test -p barista-api --test health_test`

mod helpers;

use helpers::setup_test_app;
use opentelemetry::Value;
use serde_json::json;

#[tokio::test]
async fn test_health_reports_healthy_database() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "healthy");
    assert_eq!(body["region"], "eu-central-1");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let app = setup_test_app().await;
    app.store.set_available(false);

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "unhealthy");

    let span = app.server_span("GET /health");
    let database = span
        .attributes
        .iter()
        .find(|kv| kv.key.as_str() == "health.database")
        .map(|kv| kv.value.clone());
    assert_eq!(database, Some(Value::from("unhealthy")));
}

#[tokio::test]
async fn test_other_routes_keep_working_without_database() {
    let app = setup_test_app().await;
    app.store.set_available(false);

    let failed = app
        .client()
        .post("/coffee")
        .json(&json!({"user_name": "Ada", "coffee_type": "latte"}))
        .await;
    assert_eq!(failed.status_code(), 500);

    let docs = app.client().get("/api/openapi.json").await;
    assert_eq!(docs.status_code(), 200);

    app.store.set_available(true);
    let recovered = app
        .client()
        .post("/coffee")
        .json(&json!({"user_name": "Ada", "coffee_type": "latte"}))
        .await;
    assert_eq!(recovered.status_code(), 201);
}
