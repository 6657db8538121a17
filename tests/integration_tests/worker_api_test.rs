//! Worker API tests

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use serde_json::json;

use super::fixtures::{send, student_body, worker, worker_state};

const NO_COORDINATOR: &str = "http://127.0.0.1:1";

#[tokio::test]
async fn test_process_student_enriches_and_counts() {
    let state = worker_state("worker-one", NO_COORDINATOR);
    let router = worker(&state);

    let (status, body) = send(
        &router,
        "POST",
        "/process_student",
        Some(student_body("ana@usp.edu.br")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["processed_by"], "worker-one");
    assert_eq!(body["estimated_graduation"], 2027);
    assert_eq!(body["validation"]["email_valid"], true);
    assert_eq!(body["validation"]["institutional_email"], true);

    let student_id = body["student_id"].as_str().unwrap();
    assert!(student_id.starts_with("STU-2023-"));
    assert_eq!(student_id.len(), "STU-2023-".len() + 8);

    let (_, stats) = send(&router, "GET", "/stats", None).await;
    assert_eq!(stats["students_processed"], 1);
    assert_eq!(stats["failed_requests"], 0);
    assert_eq!(stats["success_rate"], 100.0);
}

#[tokio::test]
async fn test_invalid_student_is_reported_not_rejected() {
    let state = worker_state("worker-two", NO_COORDINATOR);
    let router = worker(&state);

    let (status, body) = send(
        &router,
        "POST",
        "/process_student",
        Some(json!({"name": "Sem Curso", "email": "sem@ufrj.br"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert!(body.get("student_id").is_none());

    let (_, stats) = send(&router, "GET", "/stats", None).await;
    assert_eq!(stats["failed_requests"], 1);
    assert_eq!(stats["students_processed"], 0);
}

#[tokio::test]
async fn test_processed_requests_returns_latest_ten() {
    let state = worker_state("worker-history", NO_COORDINATOR);
    let router = worker(&state);

    for i in 0..12 {
        send(
            &router,
            "POST",
            "/process_student",
            Some(student_body(&format!("aluno{i}@ufrj.br"))),
        )
        .await;
    }

    let (status, body) = send(&router, "GET", "/processed_requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["worker_id"], "worker-history");
    assert_eq!(body["total"], 12);

    let recent = body["recent"].as_array().unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0]["email"], "aluno2@ufrj.br");
    assert_eq!(recent[9]["email"], "aluno11@ufrj.br");
}

#[tokio::test]
async fn test_analytics_defaults_to_recent_years() {
    let state = worker_state("worker-analytics", NO_COORDINATOR);
    let router = worker(&state);

    let (status, body) = send(&router, "POST", "/analytics/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["illustrative"], true);
    assert_eq!(body["generated_by"], "worker-analytics");
    assert_eq!(body["end_year"], Utc::now().year());
    assert_eq!(body["enrollment_by_year"].as_array().unwrap().len(), 5);

    let (_, stats) = send(&router, "GET", "/stats", None).await;
    assert_eq!(stats["analytics_generated"], 1);
}

#[tokio::test]
async fn test_analytics_rejects_inverted_period() {
    let router = worker(&worker_state("worker-analytics", NO_COORDINATOR));

    let (status, body) = send(
        &router,
        "POST",
        "/analytics/students",
        Some(json!({"start_year": 2024, "end_year": 2020})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_analytics_rejects_extreme_years() {
    let router = worker(&worker_state("worker-analytics", NO_COORDINATOR));

    for body in [
        json!({"start_year": i32::MIN, "end_year": 0}),
        json!({"start_year": i32::MIN, "end_year": i32::MAX}),
        json!({"end_year": i32::MIN}),
    ] {
        let (status, response) = send(&router, "POST", "/analytics/students", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], false);
    }

    // The worker is still serving afterwards
    let (status, _) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_root() {
    let router = worker(&worker_state("worker-root", NO_COORDINATOR));

    let (status, health) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["worker_id"], "worker-root");

    let (_, root) = send(&router, "GET", "/", None).await;
    assert_eq!(root["worker_id"], "worker-root");
    assert_eq!(root["coordinator_url"], NO_COORDINATOR);
    assert_eq!(root["capabilities"], json!(["students", "analytics"]));
}

#[tokio::test]
async fn test_sample_route_processes_canned_student() {
    let router = worker(&worker_state("worker-sample", NO_COORDINATOR));

    let (status, body) = send(&router, "GET", "/test/sample", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["academic_level"], "freshman");
}

#[tokio::test]
async fn test_coordinator_probe_when_unreachable() {
    let router = worker(&worker_state("worker-probe", NO_COORDINATOR));

    let (status, body) = send(&router, "GET", "/test/coordinator", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reachable"], false);
    assert!(body["error"].is_string());
    assert!(body.get("health").is_none());
}
