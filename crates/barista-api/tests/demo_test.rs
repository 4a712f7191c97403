//! Demo endpoint integration tests.
//!
//! Run with: `cargo test -p barista-api --test demo_test`

mod helpers;

use std::time::Duration;

use barista_core::CoffeeOrder;
use barista_infra::ErrorResponse;
use chrono::Utc;
use helpers::setup_test_app;
use serde_json::{json, Value};

fn order_body(user: &str) -> Value {
    json!({"user_name": user, "coffee_type": "cappuccino"})
}

#[tokio::test(start_paused = true)]
async fn test_tom_waits_before_answering() {
    let app = setup_test_app().await;

    let started = tokio::time::Instant::now();
    let response = app
        .client()
        .post("/make-coffee-tom")
        .json(&order_body("Tom"))
        .await;

    assert_eq!(response.status_code(), 201);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(app.store.orders().len(), 1);
}

#[tokio::test]
async fn test_honza_always_fails_and_stores_nothing() {
    let app = setup_test_app().await;

    for _ in 0..3 {
        let response = app
            .client()
            .post("/make-coffee-honza")
            .json(&order_body("Honza"))
            .await;
        assert_eq!(response.status_code(), 500);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "Honza's endpoint is broken");
        assert!(!body.request_id.is_empty());
    }

    assert!(app.store.orders().is_empty());
}

#[tokio::test]
async fn test_honza_rejects_malformed_json_first() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/make-coffee-honza")
        .bytes("[]".into())
        .content_type("application/json")
        .await;

    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Invalid JSON");
}

#[tokio::test]
async fn test_marek_stores_order_after_allocating() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/make-coffee-marek")
        .json(&order_body("Marek"))
        .await;

    assert_eq!(response.status_code(), 201);
    let order: CoffeeOrder = response.json();
    assert_eq!(order.user_name, "Marek");
}

#[tokio::test]
async fn test_viking_issues_extra_reads() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/make-coffee-viking")
        .json(&order_body("Viking"))
        .await;

    assert_eq!(response.status_code(), 201);
    assert_eq!(app.store.read_count(), 10);
    assert_eq!(app.store.orders().len(), 1);

    let reads = app
        .finished_spans()
        .into_iter()
        .filter(|s| s.name == "db.get_order")
        .count();
    assert_eq!(reads, 10);
}

#[tokio::test]
async fn test_matus_replaces_coffee_type() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/make-coffee-matus")
        .json(&json!({"user_name": "Matus", "coffee_type": "latte"}))
        .await;

    assert_eq!(response.status_code(), 201);
    let order: CoffeeOrder = response.json();
    assert_eq!(order.coffee_type, "borovicka");
    assert_eq!(app.store.orders()[0].coffee_type, "borovicka");
}

#[tokio::test]
async fn test_mila_stores_future_timestamp() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/make-coffee-mila")
        .json(&order_body("Mila"))
        .await;

    assert_eq!(response.status_code(), 201);
    let order: CoffeeOrder = response.json();
    let ahead = order.created_at - Utc::now();
    assert!(ahead > chrono::TimeDelta::minutes(119));
    assert!(ahead <= chrono::TimeDelta::hours(2));
}

#[tokio::test(start_paused = true)]
async fn test_slow_query_reports_count() {
    let app = setup_test_app().await;
    let client = app.client();
    client.post("/coffee").json(&order_body("Ada")).await;
    client.post("/coffee").json(&order_body("Bob")).await;

    let response = client.get("/demo/slow-query").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["message"], "Slow query completed");
    assert!(body["duration"].as_str().is_some());
    app.server_span("db.slow_count");
}

#[tokio::test]
async fn test_high_cpu_reports_duration() {
    let app = setup_test_app().await;

    let response = app.client().get("/demo/high-cpu").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "CPU intensive task completed");
    assert!(body["duration"].as_str().is_some_and(|d| !d.is_empty()));
}
