//! REST API handlers for the Worker server

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::coordinator::client::HealthStatus;
use crate::error::{Error, Result};
use crate::http::metrics_handler;
use crate::models::{StudentCreate, ACTIVE_STATUS};

use super::analytics::{self, AnalyticsRequest, StudentAnalytics};
use super::processor::{ProcessResponse, ProcessedRecord, RECENT_RECORDS};
use super::server::WorkerState;

const ENDPOINTS: &[&str] = &[
    "POST /process_student",
    "POST /analytics/students",
    "GET /health",
    "GET /stats",
    "GET /processed_requests",
    "GET /test/sample",
    "GET /test/coordinator",
    "GET /metrics",
];

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub worker_id: String,
    pub capabilities: Vec<String>,
    pub coordinator_url: String,
    pub endpoints: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub worker_id: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub worker_id: String,
    pub uptime_secs: u64,
    pub students_processed: u64,
    pub failed_requests: u64,
    pub total_requests: u64,
    pub success_rate: f64,
    pub analytics_generated: u64,
    pub history_size: usize,
}

#[derive(Debug, Serialize)]
pub struct ProcessedRequestsResponse {
    pub worker_id: String,
    pub total: usize,
    pub recent: Vec<ProcessedRecord>,
}

/// Result of probing the coordinator's `/health`
#[derive(Debug, Serialize)]
pub struct CoordinatorProbe {
    pub coordinator_url: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: WorkerState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/metrics", get(metrics_handler))
        .route("/process_student", post(process_student))
        .route("/analytics/students", post(student_analytics))
        .route("/processed_requests", get(processed_requests))
        .route("/test/sample", get(test_sample))
        .route("/test/coordinator", get(test_coordinator))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn root(State(state): State<WorkerState>) -> Json<RootResponse> {
    Json(RootResponse {
        service: "campusnet worker",
        version: env!("CARGO_PKG_VERSION"),
        worker_id: state.node_id().to_string(),
        capabilities: state.config.capabilities.clone(),
        coordinator_url: state.coordinator.coordinator_url().to_string(),
        endpoints: ENDPOINTS,
    })
}

async fn health_check(State(state): State<WorkerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        worker_id: state.node_id().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn get_stats(State(state): State<WorkerState>) -> Json<StatsResponse> {
    let stats = state.processor.stats().await;

    Json(StatsResponse {
        worker_id: state.node_id().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        students_processed: stats.students_processed,
        failed_requests: stats.failed_requests,
        total_requests: stats.total_requests(),
        success_rate: stats.success_rate(),
        analytics_generated: stats.analytics_generated,
        history_size: state.processor.history_len().await,
    })
}

/// Always 200; failures are reported through `success: false`
async fn process_student(State(state): State<WorkerState>, body: Bytes) -> Json<ProcessResponse> {
    Json(state.processor.process_payload(&body).await)
}

async fn student_analytics(
    State(state): State<WorkerState>,
    body: Bytes,
) -> Result<Json<StudentAnalytics>> {
    let request: AnalyticsRequest = if body.is_empty() {
        AnalyticsRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::validation(format!("Invalid analytics request: {e}")))?
    };

    let report = analytics::generate(&request, state.node_id())?;
    state.processor.record_analytics().await;

    tracing::info!(
        start_year = report.start_year,
        end_year = report.end_year,
        "Illustrative analytics generated"
    );
    Ok(Json(report))
}

async fn processed_requests(State(state): State<WorkerState>) -> Json<ProcessedRequestsResponse> {
    Json(ProcessedRequestsResponse {
        worker_id: state.node_id().to_string(),
        total: state.processor.history_len().await,
        recent: state.processor.recent(RECENT_RECORDS).await,
    })
}

/// Run a canned student through the processor
async fn test_sample(State(state): State<WorkerState>) -> Json<ProcessResponse> {
    let sample = StudentCreate {
        name: "Estudante Exemplo".to_string(),
        email: "estudante.exemplo@ufrj.edu.br".to_string(),
        university_id: 1,
        course_id: 1,
        enrollment_year: Utc::now().year(),
        status: ACTIVE_STATUS.to_string(),
    };

    Json(state.processor.process(sample).await)
}

async fn test_coordinator(State(state): State<WorkerState>) -> Json<CoordinatorProbe> {
    let coordinator_url = state.coordinator.coordinator_url().to_string();

    let probe = match state.coordinator.health_check().await {
        Ok(health) => CoordinatorProbe {
            coordinator_url,
            reachable: true,
            health: Some(health),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Coordinator probe failed");
            CoordinatorProbe {
                coordinator_url,
                reachable: false,
                health: None,
                error: Some(e.to_string()),
            }
        }
    };

    Json(probe)
}

// ============================================================================
// Tests
// ============================================================================
