//! Prometheus metrics for the campusnet coordinator and worker
//!
//! This module provides metrics tracking for:
//! - Coordinator: registered workers, student creations by path, delegation outcomes
//! - Worker: processed/failed students, analytics requests, processing time
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all coordinator metrics
struct CoordinatorMetrics {
    registered_workers: Gauge,
    active_workers: Gauge,
    students_created: CounterVec,
    delegation_attempts: Counter,
    delegation_failures: CounterVec,
}

/// Container for all worker metrics
struct WorkerMetrics {
    students_processed: Counter,
    processing_failures: Counter,
    analytics_generated: Counter,
    processing_duration: Histogram,
}

/// Global storage for coordinator metrics
static COORDINATOR_METRICS: OnceLock<CoordinatorMetrics> = OnceLock::new();

/// Global storage for worker metrics
static WORKER_METRICS: OnceLock<WorkerMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let coordinator = CoordinatorMetrics {
        registered_workers: register_gauge!(
            "campusnet_coordinator_registered_workers",
            "Number of workers in the registry"
        )?,
        active_workers: register_gauge!(
            "campusnet_coordinator_active_workers",
            "Number of workers reporting status active"
        )?,
        students_created: register_counter_vec!(
            "campusnet_coordinator_students_created_total",
            "Students created, by processing path",
            &["processed_by"]
        )?,
        delegation_attempts: register_counter!(
            "campusnet_coordinator_delegation_attempts_total",
            "Student creations handed to a worker"
        )?,
        delegation_failures: register_counter_vec!(
            "campusnet_coordinator_delegation_failures_total",
            "Delegations that fell back to local processing, by reason",
            &["reason"]
        )?,
    };

    let worker = WorkerMetrics {
        students_processed: register_counter!(
            "campusnet_worker_students_processed_total",
            "Students processed successfully"
        )?,
        processing_failures: register_counter!(
            "campusnet_worker_processing_failures_total",
            "Student processing requests that failed validation"
        )?,
        analytics_generated: register_counter!(
            "campusnet_worker_analytics_generated_total",
            "Analytics reports generated"
        )?,
        processing_duration: register_histogram!(
            "campusnet_worker_processing_duration_seconds",
            "Simulated student processing time in seconds",
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
        )?,
    };

    COORDINATOR_METRICS
        .set(coordinator)
        .map_err(|_| "Coordinator metrics already initialized")?;
    WORKER_METRICS
        .set(worker)
        .map_err(|_| "Worker metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    COORDINATOR_METRICS.get().is_some() && WORKER_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Update registry gauges
pub fn update_worker_registry_metrics(registered: usize, active: usize) {
    if let Some(m) = COORDINATOR_METRICS.get() {
        m.registered_workers.set(registered as f64);
        m.active_workers.set(active as f64);
    }
}

/// Record a student creation and which side handled it
pub fn record_student_created(processed_by: &str) {
    if let Some(m) = COORDINATOR_METRICS.get() {
        m.students_created.with_label_values(&[processed_by]).inc();
    }
}

/// Record a delegation attempt
pub fn record_delegation_attempt() {
    if let Some(m) = COORDINATOR_METRICS.get() {
        m.delegation_attempts.inc();
    }
}

/// Record a delegation that fell back to the coordinator
pub fn record_delegation_failure(reason: &str) {
    if let Some(m) = COORDINATOR_METRICS.get() {
        m.delegation_failures.with_label_values(&[reason]).inc();
    }
}

/// Record the outcome of one simulated processing run
pub fn record_student_processing(success: bool, duration_secs: f64) {
    let Some(m) = WORKER_METRICS.get() else {
        return;
    };

    if success {
        m.students_processed.inc();
    } else {
        m.processing_failures.inc();
    }
    m.processing_duration.observe(duration_secs);
}

/// Record an analytics report
pub fn record_analytics_generated() {
    if let Some(m) = WORKER_METRICS.get() {
        m.analytics_generated.inc();
    }
}

// ============================================================================
// Tests
// ============================================================================
