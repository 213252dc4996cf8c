//! In-process HTTP helpers for driving the router.

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

/// Fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl TestResponse {
    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).context("response body is not valid JSON")
    }

    /// Value of the `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Sends `GET uri` through the router.
pub async fn get(app: Router, uri: &str) -> Result<TestResponse> {
    send(app, Method::GET, uri, Body::empty()).await
}

/// Sends `POST uri` with a raw body through the router.
pub async fn post(app: Router, uri: &str, body: impl Into<Body>) -> Result<TestResponse> {
    send(app, Method::POST, uri, body.into()).await
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> Result<TestResponse> {
    let request =
        Request::builder().method(method).uri(uri).body(body).context("failed to build request")?;

    let response = app.oneshot(request).await.context("failed to make request")?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .context("failed to read response body")?;

    Ok(TestResponse { status, headers, body })
}
