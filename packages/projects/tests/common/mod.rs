// ABOUTME: Common test utilities for API integration tests
// ABOUTME: Builds the router over in-memory storage and drives it with oneshot requests

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use escrowdesk_projects::{create_api_router, AppState};
use escrowdesk_storage::MemoryStorage;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Router over a fresh in-memory store
pub fn test_app() -> Router {
    create_api_router(AppState::new(Arc::new(MemoryStorage::new())))
}

/// Send one request and decode the JSON response body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

#[allow(dead_code)]
pub fn project_payload() -> Value {
    json!({
        "title": "DEX frontend",
        "description": "Swap UI for the token launch",
        "clientAddress": "SP1CLIENT",
        "freelancerAddress": "SP2FREELANCER",
        "totalAmount": 4000,
        "tokenType": "STX",
        "categoryId": 1,
        "milestones": [
            { "amount": 1000, "title": "Wireframes" },
            { "amount": 1000, "title": "Swap form" },
            { "amount": 1000, "title": "Wallet integration" },
            { "amount": 1000, "title": "Launch" }
        ]
    })
}

#[allow(dead_code)]
pub fn escrow_payload() -> Value {
    json!({
        "clientAddress": "SP1CLIENT",
        "freelancerAddress": "SP2FREELANCER",
        "amount": 2500,
        "description": "Audit of the staking contract"
    })
}
