//! Coordinator API tests
//!
//! Drives the coordinator router with `oneshot` over an in-memory store:
//! 1. University CRUD and course assignment
//! 2. Courses and students
//! 3. Worker registry routes
//! 4. Service routes

use axum::http::StatusCode;
use serde_json::json;

use campusnet::coordinator::CoordinatorConfig;
use campusnet::storage::{stats, Database};

use super::fixtures::{
    coordinator, coordinator_state, coordinator_state_with, register_body, send, student_body,
};

// ============================================================================
// University Tests
// ============================================================================

#[tokio::test]
async fn test_create_then_fetch_university() {
    let router = coordinator(&coordinator_state());

    let (status, created) = send(
        &router,
        "POST",
        "/universities",
        Some(json!({"name": "UFMG", "state": "MG", "type": "public", "founded_year": 1927})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_i64().unwrap();

    let (status, university) = send(&router, "GET", &format!("/universities/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(university["name"], "UFMG");
    assert_eq!(university["state"], "MG");
    assert_eq!(university["type"], "public");
    assert_eq!(university["founded_year"], 1927);
    assert_eq!(university["courses"], json!([]));
}

#[tokio::test]
async fn test_list_universities_ordered_by_name() {
    let router = coordinator(&coordinator_state());

    let (status, body) = send(&router, "GET", "/universities", None).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["universities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["PUC-Rio", "UFRJ", "USP", "Unicamp"]);
    assert_eq!(body["universities"][0]["active_students"], 0);
}

#[tokio::test]
async fn test_update_university() {
    let router = coordinator(&coordinator_state());

    let (status, body) = send(
        &router,
        "PUT",
        "/universities/1",
        Some(json!({"name": "UFRJ Federal", "state": "RJ", "type": "private"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "University updated successfully");

    let (_, university) = send(&router, "GET", "/universities/1", None).await;
    assert_eq!(university["name"], "UFRJ Federal");
    assert_eq!(university["type"], "private");

    let (status, _) = send(
        &router,
        "PUT",
        "/universities/999",
        Some(json!({"name": "X", "state": "XX", "type": "public"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assignment_with_invalid_id_keeps_existing() {
    let router = coordinator(&coordinator_state());

    let (status, _) = send(
        &router,
        "PUT",
        "/universities/1/courses",
        Some(json!({"courses": [1, 2]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        "PUT",
        "/universities/1/courses",
        Some(json!({"courses": [3, 9999]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "One or more course IDs are invalid");

    let (_, university) = send(&router, "GET", "/universities/1", None).await;
    let ids: Vec<i64> = university["courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&1) && ids.contains(&2));
}

#[tokio::test]
async fn test_duplicate_ids_fail_count_check() {
    let router = coordinator(&coordinator_state());

    let (status, _) = send(
        &router,
        "PUT",
        "/universities/1/courses",
        Some(json!({"courses": [1, 1]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_assignment_clears_courses() {
    let router = coordinator(&coordinator_state());

    send(
        &router,
        "PUT",
        "/universities/2/courses",
        Some(json!({"courses": [1, 4]})),
    )
    .await;

    let (status, _) = send(
        &router,
        "PUT",
        "/universities/2/courses",
        Some(json!({"courses": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, university) = send(&router, "GET", "/universities/2", None).await;
    assert_eq!(university["courses"], json!([]));
}

#[tokio::test]
async fn test_assignment_terms_are_stored() {
    let router = coordinator(&coordinator_state());

    send(
        &router,
        "PUT",
        "/universities/3/courses",
        Some(json!({"courses": [{"course_id": 5, "annual_spots": 120, "tuition_fee": 0.0}, 6]})),
    )
    .await;

    let (_, university) = send(&router, "GET", "/universities/3", None).await;
    let courses = university["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 2);

    let medicina = courses.iter().find(|c| c["id"] == 5).unwrap();
    assert_eq!(medicina["annual_spots"], 120);
    assert_eq!(medicina["tuition_fee"], 0.0);
    assert_eq!(medicina["active_students"], 0);

    let engenharia = courses.iter().find(|c| c["id"] == 6).unwrap();
    assert!(engenharia["annual_spots"].is_null());
}

#[tokio::test]
async fn test_delete_university_removes_join_rows() {
    let state = coordinator_state();
    let router = coordinator(&state);

    send(
        &router,
        "PUT",
        "/universities/4/courses",
        Some(json!({"courses": [1, 2, 3]})),
    )
    .await;

    let (status, body) = send(&router, "DELETE", "/universities/4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "University deleted successfully");

    let (status, _) = send(&router, "GET", "/universities/4", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let counts = state.db.transaction(|tx| stats::counts(tx)).unwrap();
    assert_eq!(counts.course_assignments, 0);
    assert_eq!(counts.courses, 7);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let router = coordinator(&coordinator_state());

    let (status, body) = send(
        &router,
        "POST",
        "/universities",
        Some(json!({"name": "Sem Estado"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_non_numeric_id_answers_json_400() {
    let router = coordinator(&coordinator_state());

    for (method, uri, body) in [
        ("GET", "/universities/abc", None),
        ("DELETE", "/universities/1.5", None),
        ("PUT", "/universities/abc/courses", Some(json!({"courses": [1]}))),
    ] {
        let (status, response) = send(&router, method, uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(response["success"], false, "{method} {uri}");
        assert!(response["error"].is_string(), "{method} {uri}");
    }
}

// ============================================================================
// Course and Student Tests
// ============================================================================

#[tokio::test]
async fn test_create_course_defaults_duration() {
    let router = coordinator(&coordinator_state());

    let (status, created) = send(&router, "POST", "/courses", Some(json!({"name": "Física"}))).await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_i64().unwrap();

    let (_, body) = send(&router, "GET", "/courses", None).await;
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 8);

    let fisica = courses.iter().find(|c| c["id"] == id).unwrap();
    assert_eq!(fisica["duration_years"], 4);
    assert_eq!(fisica["universities_count"], 0);
    assert_eq!(fisica["students_count"], 0);
}

#[tokio::test]
async fn test_duplicate_course_name_is_server_error() {
    let router = coordinator(&coordinator_state());

    let (status, _) = send(&router, "POST", "/courses", Some(json!({"name": "Medicina"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_student_without_workers_is_stored_locally() {
    let router = coordinator(&coordinator_state());

    let (status, body) = send(&router, "POST", "/students", Some(student_body("carla@ufrj.br"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed_by"], "coordinator");
    assert!(body["id"].as_i64().unwrap() > 0);

    let (_, listed) = send(&router, "GET", "/students", None).await;
    let students = listed["students"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["email"], "carla@ufrj.br");
    assert_eq!(students[0]["status"], "active");
    assert_eq!(students[0]["university_name"], "UFRJ");
    assert_eq!(students[0]["course_name"], "Ciência da Computação");

    let (_, university) = send(&router, "GET", "/universities/1", None).await;
    assert_eq!(university["student_count"], 1);
}

#[tokio::test]
async fn test_student_with_missing_university_is_400() {
    let router = coordinator(&coordinator_state());

    let mut body = student_body("ghost@ufrj.br");
    body["university_id"] = json!(404);

    let (status, response) = send(&router, "POST", "/students", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("University 404"));
}

#[tokio::test]
async fn test_duplicate_student_email_is_server_error() {
    let router = coordinator(&coordinator_state());

    send(&router, "POST", "/students", Some(student_body("same@ufrj.br"))).await;
    let (status, _) = send(&router, "POST", "/students", Some(student_body("same@ufrj.br"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, university) = send(&router, "GET", "/universities/1", None).await;
    assert_eq!(university["student_count"], 1);
}

#[tokio::test]
async fn test_students_of_deleted_university_remain_listed() {
    let router = coordinator(&coordinator_state());

    send(&router, "POST", "/students", Some(student_body("orfa@ufrj.br"))).await;
    send(&router, "DELETE", "/universities/1", None).await;

    let (_, listed) = send(&router, "GET", "/students", None).await;
    let students = listed["students"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert!(students[0]["university_name"].is_null());
}

// ============================================================================
// Worker Registry Tests
// ============================================================================

#[tokio::test]
async fn test_reregistration_updates_in_place() {
    let router = coordinator(&coordinator_state());

    send(
        &router,
        "POST",
        "/workers/register",
        Some(register_body("worker-a", "10.0.0.5", 8001, "active", &["students"])),
    )
    .await;
    send(
        &router,
        "POST",
        "/workers/register",
        Some(register_body("worker-b", "10.0.0.6", 8001, "active", &["analytics"])),
    )
    .await;

    let (status, response) = send(
        &router,
        "POST",
        "/workers/register",
        Some(register_body("worker-a", "10.0.0.7", 9001, "inactive", &["students"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["created"], false);
    assert_eq!(response["registered_workers"], 2);

    let (_, body) = send(&router, "GET", "/workers", None).await;
    let workers = body["workers"].as_array().unwrap();
    assert_eq!(workers.len(), 2);
    assert_eq!(workers[0]["node_id"], "worker-a");
    assert_eq!(workers[0]["host"], "10.0.0.7");
    assert_eq!(workers[0]["port"], 9001);
    assert_eq!(workers[0]["status"], "inactive");
    assert_eq!(body["stats"]["active"], 1);
}

#[tokio::test]
async fn test_registry_capacity_is_enforced() {
    let config = CoordinatorConfig::builder().max_workers(2).build().unwrap();
    let router = coordinator(&coordinator_state_with(config));

    for id in ["w1", "w2"] {
        let (status, _) = send(
            &router,
            "POST",
            "/workers/register",
            Some(register_body(id, "10.0.0.5", 8001, "active", &["students"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &router,
        "POST",
        "/workers/register",
        Some(register_body("w3", "10.0.0.5", 8001, "active", &["students"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("capacity"));

    let (status, _) = send(
        &router,
        "POST",
        "/workers/register",
        Some(register_body("w2", "10.0.0.9", 8001, "active", &["students"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unregister_worker() {
    let router = coordinator(&coordinator_state());

    send(
        &router,
        "POST",
        "/workers/register",
        Some(register_body("worker-z", "10.0.0.5", 8001, "active", &["students"])),
    )
    .await;

    let (status, _) = send(&router, "DELETE", "/workers/worker-z", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, "DELETE", "/workers/worker-z", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&router, "GET", "/workers", None).await;
    assert_eq!(body["workers"], json!([]));
}

// ============================================================================
// Service Route Tests
// ============================================================================

#[tokio::test]
async fn test_health_probes_store() {
    let router = coordinator(&coordinator_state());

    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_stats_summaries() {
    let router = coordinator(&coordinator_state());
    send(&router, "POST", "/students", Some(student_body("stats@ufrj.br"))).await;

    let (status, body) = send(&router, "GET", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["students"], 1);
    assert_eq!(body["universities_by_type"]["public"], 3);
    assert_eq!(body["universities_by_state"]["SP"], 2);
    assert_eq!(body["students_by_status"]["active"], 1);
    assert_eq!(body["students_by_course"][0]["students"], 1);
    assert_eq!(body["workers"]["total_workers"], 0);
}

#[tokio::test]
async fn test_root_banner_lists_routes() {
    let router = coordinator(&coordinator_state());

    let (_, body) = send(&router, "GET", "/", None).await;
    let endpoints = body["endpoints"].as_array().unwrap();
    assert!(endpoints.iter().any(|e| e == "POST /students"));
    assert_eq!(body["counts"]["students"], 0);
}

// ============================================================================
// Store Initialization Tests
// ============================================================================

#[test]
fn test_reopening_store_does_not_duplicate_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("university.sqlite");

    {
        let db = Database::open(&path).unwrap();
        db.init().unwrap();
    }
    let db = Database::open(&path).unwrap();

    let counts = db.transaction(|tx| stats::counts(tx)).unwrap();
    assert_eq!(counts.universities, 4);
    assert_eq!(counts.courses, 7);
}
