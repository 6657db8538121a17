//! Test fixtures for integration tests
//!
//! Router builders and request helpers shared by the API tests

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower::ServiceExt;

use campusnet::coordinator::api::create_router as coordinator_router;
use campusnet::coordinator::{AppState, CoordinatorConfig};
use campusnet::worker::api::create_router as worker_router;
use campusnet::worker::{WorkerConfig, WorkerState};

/// Coordinator state over a fresh in-memory store
pub fn coordinator_state() -> AppState {
    coordinator_state_with(CoordinatorConfig::default())
}

pub fn coordinator_state_with(config: CoordinatorConfig) -> AppState {
    AppState::in_memory(config).expect("coordinator state")
}

pub fn coordinator(state: &AppState) -> Router {
    coordinator_router(state.clone())
}

/// Worker state with no simulated delay and no startup registration
pub fn worker_state(node_id: &str, coordinator_url: &str) -> WorkerState {
    let config = WorkerConfig {
        node_id: Some(node_id.to_string()),
        coordinator_url: coordinator_url.to_string(),
        min_delay_ms: 0,
        max_delay_ms: 0,
        register_on_startup: false,
        request_timeout_secs: 2,
        ..WorkerConfig::default()
    };
    WorkerState::new(config).expect("worker state")
}

pub fn worker(state: &WorkerState) -> Router {
    worker_router(state.clone())
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test router");
    });

    addr
}

/// Send one request and decode the JSON body (`Null` when not JSON)
pub async fn send(
    router: &Router,
    method: &str,
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

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub fn student_body(email: &str) -> Value {
    json!({
        "name": "Carla Mendes",
        "email": email,
        "university_id": 1,
        "course_id": 1,
        "enrollment_year": 2023
    })
}

pub fn register_body(node_id: &str, host: &str, port: u16, status: &str, capabilities: &[&str]) -> Value {
    json!({
        "node_id": node_id,
        "host": host,
        "port": port,
        "status": status,
        "capabilities": capabilities,
    })
}
