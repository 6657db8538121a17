//! Worker registry
//!
//! Tracks the workers that announced themselves through
//! `POST /workers/register`. The registry lives in coordinator memory only:
//! it starts empty on every restart and nothing expires entries, a worker
//! stays listed until it is unregistered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::RwLock;

use crate::metrics;

/// Capability required to receive delegated student creations
pub const STUDENTS_CAPABILITY: &str = "students";

/// Capability advertised by workers that serve analytics
pub const ANALYTICS_CAPABILITY: &str = "analytics";

// ============================================================================
// Worker Status
// ============================================================================

/// Self-reported status of a worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    #[default]
    Active,
    Inactive,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

// ============================================================================
// Worker Node
// ============================================================================

/// Information about a registered worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerNode {
    /// Unique worker identifier
    pub node_id: String,

    /// Host the worker is reachable on
    pub host: String,

    /// Port the worker is listening on
    pub port: u16,

    /// Current status
    pub status: WorkerStatus,

    /// Advertised capabilities
    pub capabilities: BTreeSet<String>,

    /// When the worker first registered
    pub registered_at: DateTime<Utc>,

    /// Last registration received
    pub updated_at: DateTime<Utc>,
}

impl WorkerNode {
    fn from_request(request: RegisterWorkerRequest) -> Self {
        let now = Utc::now();
        Self {
            node_id: request.node_id,
            host: request.host,
            port: request.port,
            status: request.status,
            capabilities: request.capabilities,
            registered_at: now,
            updated_at: now,
        }
    }

    /// Get the full address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL for HTTP calls to this worker
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }

    pub fn is_active(&self) -> bool {
        self.status == WorkerStatus::Active
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

// ============================================================================
// Registration Request/Response
// ============================================================================

/// Request to register a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    pub node_id: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub status: WorkerStatus,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

/// Response to registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkerResponse {
    pub success: bool,
    pub message: String,
    pub node_id: String,
    /// `false` when an existing entry was updated in place
    pub created: bool,
    pub registered_workers: usize,
}

// ============================================================================
// Worker Registry
// ============================================================================

/// Registry of workers in registration order
pub struct WorkerRegistry {
    workers: RwLock<Vec<WorkerNode>>,
    max_workers: usize,
}

impl WorkerRegistry {
    /// Create a new registry
    pub fn new(max_workers: usize) -> Self {
        Self {
            workers: RwLock::new(Vec::new()),
            max_workers,
        }
    }

    /// Register a worker, or update it in place if its `node_id` is known
    ///
    /// Updating keeps the entry's position and `registered_at`.
    pub async fn register(
        &self,
        request: RegisterWorkerRequest,
    ) -> Result<RegisterWorkerResponse, RegistryError> {
        if request.node_id.trim().is_empty() {
            return Err(RegistryError::InvalidRequest(
                "node_id must not be empty".to_string(),
            ));
        }
        if request.host.trim().is_empty() {
            return Err(RegistryError::InvalidRequest(
                "host must not be empty".to_string(),
            ));
        }
        if request.port == 0 {
            return Err(RegistryError::InvalidRequest(
                "port must be greater than zero".to_string(),
            ));
        }

        let mut workers = self.workers.write().await;
        let node_id = request.node_id.clone();

        let created = match workers.iter_mut().find(|w| w.node_id == request.node_id) {
            Some(existing) => {
                existing.host = request.host;
                existing.port = request.port;
                existing.status = request.status;
                existing.capabilities = request.capabilities;
                existing.updated_at = Utc::now();
                false
            }
            None => {
                if workers.len() >= self.max_workers {
                    return Err(RegistryError::CapacityExceeded {
                        current: workers.len(),
                        max: self.max_workers,
                    });
                }
                workers.push(WorkerNode::from_request(request));
                true
            }
        };

        Self::publish_metrics(&workers);

        tracing::info!(
            node_id = %node_id,
            created,
            registered = workers.len(),
            "Worker registered"
        );

        Ok(RegisterWorkerResponse {
            success: true,
            message: if created {
                format!("Worker {node_id} registered successfully")
            } else {
                format!("Worker {node_id} updated successfully")
            },
            node_id,
            created,
            registered_workers: workers.len(),
        })
    }

    /// Unregister a worker
    pub async fn unregister(&self, node_id: &str) -> Option<WorkerNode> {
        let mut workers = self.workers.write().await;
        let position = workers.iter().position(|w| w.node_id == node_id)?;
        let removed = workers.remove(position);

        Self::publish_metrics(&workers);
        tracing::info!(node_id = %node_id, "Worker unregistered");

        Some(removed)
    }

    #[cfg(test)]
    pub async fn get(&self, node_id: &str) -> Option<WorkerNode> {
        self.workers
            .read()
            .await
            .iter()
            .find(|w| w.node_id == node_id)
            .cloned()
    }

    /// Get all workers in registration order
    pub async fn list(&self) -> Vec<WorkerNode> {
        self.workers.read().await.clone()
    }

    /// First active worker advertising `capability`, in registration order
    pub async fn select_delegate(&self, capability: &str) -> Option<WorkerNode> {
        self.workers
            .read()
            .await
            .iter()
            .find(|w| w.is_active() && w.has_capability(capability))
            .cloned()
    }

    /// Get registry statistics
    pub async fn stats(&self) -> RegistryStats {
        let workers = self.workers.read().await;
        let active = workers.iter().filter(|w| w.is_active()).count();

        RegistryStats {
            total_workers: workers.len(),
            active,
            inactive: workers.len() - active,
            capacity: self.max_workers,
        }
    }

    fn publish_metrics(workers: &[WorkerNode]) {
        let active = workers.iter().filter(|w| w.is_active()).count();
        metrics::update_worker_registry_metrics(workers.len(), active);
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_workers: usize,
    pub active: usize,
    pub inactive: usize,
    pub capacity: usize,
}

// ============================================================================
// Errors
// ============================================================================

/// Registry errors
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Registration payload failed validation
    InvalidRequest(String),

    /// Registry at capacity
    CapacityExceeded { current: usize, max: usize },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(reason) => write!(f, "Invalid registration: {}", reason),
            Self::CapacityExceeded { current, max } => {
                write!(f, "Registry at capacity: {}/{}", current, max)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<RegistryError> for crate::error::Error {
    fn from(err: RegistryError) -> Self {
        Self::Validation(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
