//! Delegate-then-fallback for student creation
//!
//! [`Delegator::delegate_student`] is the one decision point between the
//! coordinator and its workers:
//!
//! 1. pick the first `active` worker advertising `"students"`;
//! 2. make a single `POST /process_student` bounded by the configured timeout;
//! 3. accept only a 2xx JSON body whose `success` flag is `true`.
//!
//! Anything else yields [`DelegationOutcome::Fallback`] and the caller
//! processes the request locally. There is no retry and no compensation: a
//! student accepted by a worker is not written to the coordinator's store.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::metrics;
use crate::models::StudentCreate;

use super::registry::{WorkerNode, WorkerRegistry, STUDENTS_CAPABILITY};

// ============================================================================
// Errors and Outcomes
// ============================================================================

/// Why a single delegation call failed
#[derive(Error, Debug)]
pub enum DelegationError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("worker answered HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("invalid worker response: {0}")]
    InvalidResponse(String),

    #[error("worker rejected request: {0}")]
    Rejected(String),
}

impl DelegationError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Rejected(_) => "rejected",
        }
    }
}

impl From<reqwest::Error> for DelegationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result of the delegation decision
#[derive(Debug)]
pub enum DelegationOutcome {
    /// A worker accepted the request; `response` is its body, untouched
    Delegated { node_id: String, response: Value },

    /// Process locally
    Fallback(FallbackReason),
}

#[derive(Debug)]
pub enum FallbackReason {
    NoCapableWorker,
    Failed {
        node_id: String,
        error: DelegationError,
    },
}

impl FallbackReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoCapableWorker => "no_capable_worker",
            Self::Failed { error, .. } => error.reason(),
        }
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Transport used to reach a worker
#[async_trait]
pub trait WorkerGateway: Send + Sync {
    /// Send one student to `worker`; returns the body of a 2xx response
    async fn process_student(
        &self,
        worker: &WorkerNode,
        student: &StudentCreate,
    ) -> std::result::Result<Value, DelegationError>;
}

/// reqwest-backed gateway with a fixed per-call timeout
pub struct HttpWorkerGateway {
    http_client: reqwest::Client,
}

impl HttpWorkerGateway {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::with_source("Failed to build worker HTTP client", e))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl WorkerGateway for HttpWorkerGateway {
    async fn process_student(
        &self,
        worker: &WorkerNode,
        student: &StudentCreate,
    ) -> std::result::Result<Value, DelegationError> {
        let url = format!("{}/process_student", worker.base_url());

        let response = self.http_client.post(&url).json(student).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DelegationError::HttpStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

// ============================================================================
// Delegator
// ============================================================================

/// Applies the delegation policy on top of a [`WorkerGateway`]
#[derive(Clone)]
pub struct Delegator {
    gateway: Arc<dyn WorkerGateway>,
}

impl Delegator {
    pub fn new(gateway: Arc<dyn WorkerGateway>) -> Self {
        Self { gateway }
    }

    /// Delegator over HTTP with the given per-call timeout
    pub fn http(timeout: Duration) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpWorkerGateway::new(timeout)?)))
    }

    /// Try to hand `student` to a worker
    ///
    /// Never fails: every failure class turns into a fallback, logged here.
    pub async fn delegate_student(
        &self,
        registry: &WorkerRegistry,
        student: &StudentCreate,
    ) -> DelegationOutcome {
        let Some(worker) = registry.select_delegate(STUDENTS_CAPABILITY).await else {
            tracing::debug!("No active worker with the students capability");
            return DelegationOutcome::Fallback(FallbackReason::NoCapableWorker);
        };

        metrics::record_delegation_attempt();
        tracing::debug!(node_id = %worker.node_id, address = %worker.address(), "Delegating student");

        let result = self
            .gateway
            .process_student(&worker, student)
            .await
            .and_then(check_success_flag);

        match result {
            Ok(response) => {
                tracing::info!(node_id = %worker.node_id, email = %student.email, "Student processed by worker");
                DelegationOutcome::Delegated {
                    node_id: worker.node_id,
                    response,
                }
            }
            Err(error) => {
                tracing::warn!(
                    node_id = %worker.node_id,
                    error = %error,
                    "Delegation failed, processing locally"
                );
                metrics::record_delegation_failure(error.reason());
                DelegationOutcome::Fallback(FallbackReason::Failed {
                    node_id: worker.node_id,
                    error,
                })
            }
        }
    }
}

fn check_success_flag(body: Value) -> std::result::Result<Value, DelegationError> {
    match body.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(body),
        Some(false) => {
            let reason = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unspecified error")
                .to_string();
            Err(DelegationError::Rejected(reason))
        }
        None => Err(DelegationError::InvalidResponse(
            "missing success flag".to_string(),
        )),
    }
}
