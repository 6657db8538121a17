//! Delegate-then-fallback tests
//!
//! Workers are stood in for by wiremock servers, except for the last test
//! which runs a real worker router on an ephemeral port.

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campusnet::coordinator::CoordinatorConfig;

use super::fixtures::{
    coordinator, coordinator_state, coordinator_state_with, register_body, send, spawn_router,
    student_body, worker, worker_state,
};

async fn register_mock(router: &Router, node_id: &str, server: &MockServer, status: &str) {
    let (code, _) = send(
        router,
        "POST",
        "/workers/register",
        Some(register_body(
            node_id,
            "127.0.0.1",
            server.address().port(),
            status,
            &["students"],
        )),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
}

fn worker_reply(node_id: &str) -> serde_json::Value {
    json!({
        "success": true,
        "message": "Student processed",
        "student_id": "STU-2023-ABCDEF12",
        "processed_by": node_id,
        "processing_time_ms": 3
    })
}

async fn stored_students(router: &Router) -> usize {
    let (_, body) = send(router, "GET", "/students", None).await;
    body["students"].as_array().unwrap().len()
}

// ============================================================================
// Delegation
// ============================================================================

#[tokio::test]
async fn test_healthy_worker_response_is_returned_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process_student"))
        .and(body_partial_json(json!({"email": "delegada@ufrj.br"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(worker_reply("worker-mock")))
        .expect(1)
        .mount(&server)
        .await;

    let router = coordinator(&coordinator_state());
    register_mock(&router, "worker-mock", &server, "active").await;

    let (status, body) = send(&router, "POST", "/students", Some(student_body("delegada@ufrj.br"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, worker_reply("worker-mock"));

    // Delegated students are not written to the coordinator store
    assert_eq!(stored_students(&router).await, 0);
}

#[tokio::test]
async fn test_worker_server_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process_student"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let router = coordinator(&coordinator_state());
    register_mock(&router, "worker-broken", &server, "active").await;

    let (status, body) = send(&router, "POST", "/students", Some(student_body("a@ufrj.br"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed_by"], "coordinator");
    assert_eq!(stored_students(&router).await, 1);
}

#[tokio::test]
async fn test_worker_timeout_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process_student"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(worker_reply("worker-slow"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = CoordinatorConfig::builder()
        .request_timeout_secs(1)
        .build()
        .unwrap();
    let router = coordinator(&coordinator_state_with(config));
    register_mock(&router, "worker-slow", &server, "active").await;

    let (status, body) = send(&router, "POST", "/students", Some(student_body("b@ufrj.br"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed_by"], "coordinator");
    assert_eq!(stored_students(&router).await, 1);
}

#[tokio::test]
async fn test_worker_reported_failure_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process_student"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Student processing failed",
            "error": "invalid email"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = coordinator(&coordinator_state());
    register_mock(&router, "worker-picky", &server, "active").await;

    let (_, body) = send(&router, "POST", "/students", Some(student_body("c@ufrj.br"))).await;
    assert_eq!(body["processed_by"], "coordinator");
    assert_eq!(stored_students(&router).await, 1);
}

#[tokio::test]
async fn test_inactive_and_incapable_workers_are_skipped() {
    let inactive = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(worker_reply("idle")))
        .expect(0)
        .mount(&inactive)
        .await;

    let analytics_only = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(worker_reply("stats")))
        .expect(0)
        .mount(&analytics_only)
        .await;

    let router = coordinator(&coordinator_state());
    register_mock(&router, "idle", &inactive, "inactive").await;
    send(
        &router,
        "POST",
        "/workers/register",
        Some(register_body(
            "stats",
            "127.0.0.1",
            analytics_only.address().port(),
            "active",
            &["analytics"],
        )),
    )
    .await;

    let (_, body) = send(&router, "POST", "/students", Some(student_body("d@ufrj.br"))).await;
    assert_eq!(body["processed_by"], "coordinator");
}

#[tokio::test]
async fn test_first_capable_worker_wins() {
    let first = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process_student"))
        .respond_with(ResponseTemplate::new(200).set_body_json(worker_reply("first")))
        .expect(2)
        .mount(&first)
        .await;

    let second = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(worker_reply("second")))
        .expect(0)
        .mount(&second)
        .await;

    let router = coordinator(&coordinator_state());
    register_mock(&router, "first", &first, "active").await;
    register_mock(&router, "second", &second, "active").await;

    for email in ["e1@ufrj.br", "e2@ufrj.br"] {
        let (_, body) = send(&router, "POST", "/students", Some(student_body(email))).await;
        assert_eq!(body["processed_by"], "first");
    }
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_worker_registers_with_coordinator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workers/register"))
        .and(body_partial_json(json!({
            "node_id": "worker-reg",
            "port": 8123,
            "status": "active"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Worker worker-reg registered successfully",
            "node_id": "worker-reg",
            "created": true,
            "registered_workers": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = worker_state("worker-reg", &server.uri());
    let response = state.register_with_coordinator(8123).await.unwrap();

    assert!(response.success);
    assert!(response.created);
    assert_eq!(response.node_id, "worker-reg");
}

#[tokio::test]
async fn test_unreachable_coordinator_is_an_error() {
    let state = worker_state("worker-alone", "http://127.0.0.1:1");

    assert!(state.register_with_coordinator(8001).await.is_err());

    // The worker keeps serving
    let (status, body) = send(&worker(&state), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["worker_id"], "worker-alone");
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_coordinator_delegates_to_real_worker() {
    let coordinator_state = coordinator_state();
    let coordinator_router = coordinator(&coordinator_state);
    let coordinator_addr = spawn_router(coordinator_router.clone()).await;

    let worker_state = worker_state("worker-e2e", &format!("http://{coordinator_addr}"));
    let worker_addr = spawn_router(worker(&worker_state)).await;

    // Register over real HTTP, advertising the loopback address
    let request = json!({
        "node_id": "worker-e2e",
        "host": "127.0.0.1",
        "port": worker_addr.port(),
        "status": "active",
        "capabilities": ["students", "analytics"]
    });
    let (status, _) = send(&coordinator_router, "POST", "/workers/register", Some(request)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &coordinator_router,
        "POST",
        "/students",
        Some(student_body("ponta@ufrj.edu.br")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["processed_by"], "worker-e2e");
    assert!(body["student_id"].as_str().unwrap().starts_with("STU-2023-"));
    assert_eq!(body["validation"]["institutional_email"], true);

    assert_eq!(stored_students(&coordinator_router).await, 0);

    let (_, history) = send(&worker(&worker_state), "GET", "/processed_requests", None).await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["recent"][0]["email"], "ponta@ufrj.edu.br");

    let (_, probe) = send(&worker(&worker_state), "GET", "/test/coordinator", None).await;
    assert_eq!(probe["reachable"], true);
    assert_eq!(probe["health"]["healthy"], true);
}
