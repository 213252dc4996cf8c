//! Integration tests for the record query endpoint.
//!
//! Covers the response contract of `GET /api/records`: status, content
//! type, one object per row, keys in table column order, and all-or-nothing
//! failure.

use axum::http::StatusCode;
use rowgate_testing::{http, TestEnv};
use serde_json::{json, Value};

#[tokio::test]
async fn empty_table_returns_empty_array() {
    let env = TestEnv::new().await.expect("test env setup");

    let response = http::get(env.router(), "/api/records").await.expect("request");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(&response.body[..], b"[]");
}

#[tokio::test]
async fn every_row_is_returned() {
    let env = TestEnv::new().await.expect("test env setup");
    for i in 0..25 {
        env.insert_raw(&format!("row-{i}"), i).await.unwrap();
    }

    let response = http::get(env.router(), "/api/records").await.expect("request");
    let body = response.json().unwrap();
    let rows = body.as_array().expect("array body");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(rows.len() as i64, env.count_rows().await.unwrap());
    assert!(rows.contains(&json!({"column1": "row-7", "column2": 7})));
}

#[tokio::test]
async fn keys_follow_table_column_order() {
    let env = TestEnv::with_schema(
        "wide",
        "CREATE TABLE wide (zeta TEXT, alpha INTEGER, mid REAL, note TEXT)",
    )
    .await
    .expect("test env setup");
    sqlx::query("INSERT INTO wide (zeta, alpha, mid, note) VALUES ('z', 1, 2.5, NULL)")
        .execute(env.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO wide (zeta, alpha, mid, note) VALUES ('y', 2, 0.5, 'n')")
        .execute(env.pool())
        .await
        .unwrap();

    let response = http::get(env.router(), "/api/records").await.expect("request");
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json().unwrap();
    for row in body.as_array().unwrap() {
        let keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid", "note"]);
    }

    let text = std::str::from_utf8(&response.body).unwrap();
    assert!(text.contains(r#"{"zeta":"z","alpha":1,"mid":2.5,"note":null}"#), "{text}");
}

#[tokio::test]
async fn binary_value_fails_the_whole_query() {
    let env = TestEnv::with_schema("blobs", "CREATE TABLE blobs (name TEXT, data BLOB)")
        .await
        .expect("test env setup");
    sqlx::query("INSERT INTO blobs (name, data) VALUES ('fine', NULL)")
        .execute(env.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO blobs (name, data) VALUES ('raw', X'00FF')")
        .execute(env.pool())
        .await
        .unwrap();

    let response = http::get(env.router(), "/api/records").await.expect("request");

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"]["code"], "E3003");
    assert!(body.get(0).is_none(), "no partial result may be returned");
}

#[tokio::test]
async fn non_finite_float_fails_the_whole_query() {
    let env = TestEnv::with_schema("readings", "CREATE TABLE readings (name TEXT, value REAL)")
        .await
        .expect("test env setup");
    sqlx::query("INSERT INTO readings (name, value) VALUES ('ok', 1.5), ('overflow', 9e999)")
        .execute(env.pool())
        .await
        .unwrap();

    let response = http::get(env.router(), "/api/records").await.expect("request");

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"]["code"], "E3003");
    assert!(body["error"]["message"].as_str().unwrap().contains("non-finite"));
}

#[tokio::test]
async fn sqlite_boolean_column_is_a_serialization_fault() {
    let env = TestEnv::with_schema("flags", "CREATE TABLE flags (name TEXT, enabled BOOLEAN)")
        .await
        .expect("test env setup");
    sqlx::query("INSERT INTO flags (name, enabled) VALUES ('x', 1)")
        .execute(env.pool())
        .await
        .unwrap();

    let response = http::get(env.router(), "/api/records").await.expect("request");

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"]["code"], "E3003");
    assert!(body.get(0).is_none(), "no partial result may be returned");
}

#[tokio::test]
async fn missing_table_is_a_server_error() {
    let env = TestEnv::without_table().await.expect("test env setup");

    let response = http::get(env.router(), "/api/records").await.expect("request");

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json().unwrap()["error"]["code"], "E3002");
}

#[tokio::test]
async fn request_body_is_ignored() {
    let env = TestEnv::new().await.expect("test env setup");
    env.insert_raw("abc", 123).await.unwrap();

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/records?limit=0")
        .header("content-type", "text/plain")
        .body(axum::body::Body::from("ignored"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(env.router(), request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let rows: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rows, json!([{"column1": "abc", "column2": 123}]));
}
