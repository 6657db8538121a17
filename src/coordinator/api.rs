//! REST API handlers for the Coordinator server
//!
//! Every handler that touches the store runs exactly one
//! [`Database::transaction`](crate::storage::Database::transaction).
//! `POST /students` is the exception: it first offers the request to a
//! worker and only opens a transaction on the local fallback path.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::http::{metrics_handler, ApiJson, ApiPath, CreatedResponse, MessageResponse};
use crate::metrics;
use crate::models::{
    CourseAssignment, CourseCreate, CourseSummary, StudentCreate, StudentListing,
    UniversityCreate, UniversityDetail, UniversitySummary, UniversityType, UniversityUpdate,
};
use crate::storage::stats::{EntityCounts, StoreStats};
use crate::storage::{courses, stats, students, universities, Database};

use super::delegation::DelegationOutcome;
use super::registry::{RegisterWorkerRequest, RegisterWorkerResponse, RegistryStats, WorkerNode};
use super::server::AppState;

const UNIVERSITY_NOT_FOUND: &str = "University not found";

/// Routes advertised by `GET /`
const ENDPOINTS: &[&str] = &[
    "GET /universities",
    "POST /universities",
    "GET /universities/{id}",
    "PUT /universities/{id}",
    "DELETE /universities/{id}",
    "PUT /universities/{id}/courses",
    "GET /courses",
    "POST /courses",
    "GET /students",
    "POST /students",
    "POST /workers/register",
    "GET /workers",
    "DELETE /workers/{node_id}",
    "GET /health",
    "GET /stats",
    "GET /metrics",
];

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UniversitiesResponse {
    pub universities: Vec<UniversitySummary>,
}

#[derive(Debug, Serialize)]
pub struct CoursesResponse {
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Serialize)]
pub struct StudentsResponse {
    pub students: Vec<StudentListing>,
}

/// Body returned when the coordinator stores a student itself
#[derive(Debug, Serialize)]
pub struct LocalStudentResponse {
    pub id: i64,
    pub message: String,
    pub processed_by: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WorkersResponse {
    pub workers: Vec<WorkerNode>,
    pub stats: RegistryStats,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub counts: EntityCounts,
    pub registered_workers: usize,
    pub endpoints: &'static [&'static str],
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub store: StoreStats,
    pub workers: RegistryStats,
    pub uptime_secs: u64,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/metrics", get(metrics_handler))
        // Universities
        .route("/universities", get(list_universities).post(create_university))
        .route(
            "/universities/{id}",
            get(get_university)
                .put(update_university)
                .delete(delete_university),
        )
        .route("/universities/{id}/courses", put(assign_courses))
        // Courses
        .route("/courses", get(list_courses).post(create_course))
        // Students
        .route("/students", get(list_students).post(create_student))
        // Workers
        .route("/workers", get(list_workers))
        .route("/workers/register", post(register_worker))
        .route("/workers/{node_id}", axum::routing::delete(unregister_worker))
        .with_state(state)
}

// ============================================================================
// Service Handlers
// ============================================================================

async fn root(State(state): State<AppState>) -> Result<Json<RootResponse>> {
    let counts = state.db.transaction(|tx| stats::counts(tx))?;
    let registered_workers = state.registry.list().await.len();

    Ok(Json(RootResponse {
        service: "campusnet coordinator",
        version: env!("CARGO_PKG_VERSION"),
        counts,
        registered_workers,
        endpoints: ENDPOINTS,
    }))
}

/// Liveness plus a `SELECT 1` store probe
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    state.db.ping()?;

    Ok(Json(HealthResponse {
        status: "healthy",
        database: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let store = state.db.transaction(|tx| stats::summary(tx))?;

    Ok(Json(StatsResponse {
        store,
        workers: state.registry.stats().await,
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

// ============================================================================
// University Handlers
// ============================================================================

async fn list_universities(State(state): State<AppState>) -> Result<Json<UniversitiesResponse>> {
    let universities = state.db.transaction(|tx| universities::list(tx))?;
    Ok(Json(UniversitiesResponse { universities }))
}

async fn create_university(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UniversityCreate>,
) -> Result<Json<CreatedResponse>> {
    let kind: UniversityType = body.kind.parse()?;

    let id = state.db.transaction(|tx| {
        universities::insert(tx, &body.name, &body.state, kind, body.founded_year)
    })?;

    tracing::info!(id, name = %body.name, "University created");
    Ok(Json(CreatedResponse { id }))
}

async fn get_university(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UniversityDetail>> {
    let detail = state.db.transaction(|tx| {
        let university =
            universities::get(tx, id)?.ok_or_else(|| Error::not_found(UNIVERSITY_NOT_FOUND))?;
        let courses = universities::courses_for(tx, id)?;
        Ok(UniversityDetail {
            university,
            courses,
        })
    })?;

    Ok(Json(detail))
}

async fn update_university(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UniversityUpdate>,
) -> Result<Json<MessageResponse>> {
    let kind: UniversityType = body.kind.parse()?;

    state.db.transaction(|tx| {
        if !universities::exists(tx, id)? {
            return Err(Error::not_found(UNIVERSITY_NOT_FOUND));
        }
        universities::update(tx, id, &body.name, &body.state, kind)?;
        Ok(())
    })?;

    tracing::info!(id, "University updated");
    Ok(Json(MessageResponse::new("University updated successfully")))
}

async fn delete_university(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    state.db.transaction(|tx| {
        if !universities::exists(tx, id)? {
            return Err(Error::not_found(UNIVERSITY_NOT_FOUND));
        }
        universities::delete(tx, id)
    })?;

    tracing::info!(id, "University deleted");
    Ok(Json(MessageResponse::new("University deleted successfully")))
}

/// Replace the course set of a university
///
/// The count check and the replacement share one transaction, so a rejected
/// list leaves the previous assignments in place.
async fn assign_courses(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CourseAssignment>,
) -> Result<Json<MessageResponse>> {
    state.db.transaction(|tx| {
        if !universities::exists(tx, id)? {
            return Err(Error::not_found(UNIVERSITY_NOT_FOUND));
        }

        if !body.courses.is_empty() {
            let ids: Vec<i64> = body.courses.iter().map(|c| c.course_id()).collect();
            let found = courses::count_existing(tx, &ids)?;
            if found != ids.len() as i64 {
                return Err(Error::validation("One or more course IDs are invalid"));
            }
        }

        universities::replace_courses(tx, id, &body.courses)
    })?;

    tracing::info!(id, count = body.courses.len(), "Courses assigned");
    Ok(Json(MessageResponse::new("Courses assigned successfully")))
}

// ============================================================================
// Course Handlers
// ============================================================================

async fn list_courses(State(state): State<AppState>) -> Result<Json<CoursesResponse>> {
    let courses = state.db.transaction(|tx| courses::list(tx))?;
    Ok(Json(CoursesResponse { courses }))
}

async fn create_course(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CourseCreate>,
) -> Result<Json<CreatedResponse>> {
    let id = state.db.transaction(|tx| courses::insert(tx, &body))?;

    tracing::info!(id, name = %body.name, "Course created");
    Ok(Json(CreatedResponse { id }))
}

// ============================================================================
// Student Handlers
// ============================================================================

async fn list_students(State(state): State<AppState>) -> Result<Json<StudentsResponse>> {
    let students = state.db.transaction(|tx| students::list(tx))?;
    Ok(Json(StudentsResponse { students }))
}

/// Delegate to a worker, falling back to a local insert
async fn create_student(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StudentCreate>,
) -> Result<Response> {
    match state
        .delegator
        .delegate_student(&state.registry, &body)
        .await
    {
        DelegationOutcome::Delegated { response, .. } => {
            metrics::record_student_created("worker");
            Ok(Json(response).into_response())
        }
        DelegationOutcome::Fallback(reason) => {
            tracing::debug!(reason = reason.label(), "Processing student locally");
            let id = insert_student_locally(&state.db, &body)?;

            metrics::record_student_created("coordinator");
            tracing::info!(id, email = %body.email, "Student created by coordinator");

            Ok(Json(LocalStudentResponse {
                id,
                message: "Student created successfully".to_string(),
                processed_by: "coordinator",
            })
            .into_response())
        }
    }
}

fn insert_student_locally(db: &Database, student: &StudentCreate) -> Result<i64> {
    db.transaction(|tx| {
        if !universities::exists(tx, student.university_id)? {
            return Err(Error::validation(format!(
                "University {} does not exist",
                student.university_id
            )));
        }
        if !courses::exists(tx, student.course_id)? {
            return Err(Error::validation(format!(
                "Course {} does not exist",
                student.course_id
            )));
        }
        students::insert(tx, student)
    })
}

// ============================================================================
// Worker Handlers
// ============================================================================

async fn register_worker(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterWorkerRequest>,
) -> Result<Json<RegisterWorkerResponse>> {
    Ok(Json(state.registry.register(request).await?))
}

async fn list_workers(State(state): State<AppState>) -> Json<WorkersResponse> {
    Json(WorkersResponse {
        workers: state.registry.list().await,
        stats: state.registry.stats().await,
    })
}

async fn unregister_worker(
    State(state): State<AppState>,
    ApiPath(node_id): ApiPath<String>,
) -> Result<Json<MessageResponse>> {
    state
        .registry
        .unregister(&node_id)
        .await
        .ok_or_else(|| Error::not_found(format!("Worker not found: {node_id}")))?;

    Ok(Json(MessageResponse::new(format!(
        "Worker {node_id} unregistered"
    ))))
}

// ============================================================================
// Tests
// ============================================================================
