//! Worker server implementation

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::coordinator::client::{ClientConfig, ClientError, CoordinatorClient};
use crate::coordinator::registry::{RegisterWorkerRequest, RegisterWorkerResponse, WorkerStatus};
use crate::coordinator::server::ServerError;
use crate::utils;

use super::api::create_router;
use super::config::WorkerConfig;
use super::processor::StudentProcessor;

// ============================================================================
// Worker State
// ============================================================================

/// Shared worker state
#[derive(Clone)]
pub struct WorkerState {
    pub processor: Arc<StudentProcessor>,
    pub coordinator: Arc<CoordinatorClient>,
    pub start_time: Instant,
    pub config: WorkerConfig,
}

impl WorkerState {
    /// Build state, generating a node id when the config has none
    pub fn new(mut config: WorkerConfig) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let node_id = config
            .node_id
            .get_or_insert_with(utils::generate_node_id)
            .clone();

        let client_config =
            ClientConfig::new(config.coordinator_url.clone()).with_timeout(config.request_timeout());
        let coordinator = CoordinatorClient::new(client_config)
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let processor = StudentProcessor::new(node_id, config.delay_range(), config.max_history);

        Ok(Self {
            processor: Arc::new(processor),
            coordinator: Arc::new(coordinator),
            start_time: Instant::now(),
            config,
        })
    }

    pub fn node_id(&self) -> &str {
        self.processor.node_id()
    }

    /// Registration payload announcing this worker on `port`
    pub fn registration_request(&self, port: u16) -> RegisterWorkerRequest {
        let host = self
            .config
            .advertise_host
            .clone()
            .unwrap_or_else(|| utils::resolve_local_ip().to_string());

        RegisterWorkerRequest {
            node_id: self.node_id().to_string(),
            host,
            port,
            status: WorkerStatus::Active,
            capabilities: self.config.capabilities.iter().cloned().collect(),
        }
    }

    /// Register once with the coordinator
    pub async fn register_with_coordinator(
        &self,
        port: u16,
    ) -> Result<RegisterWorkerResponse, ClientError> {
        let request = self.registration_request(port);
        tracing::info!(
            node_id = %request.node_id,
            host = %request.host,
            port,
            coordinator = %self.coordinator.coordinator_url(),
            "Registering with coordinator"
        );

        self.coordinator.register(&request).await
    }
}

// ============================================================================
// Worker Server
// ============================================================================

/// Worker HTTP server
pub struct WorkerServer {
    state: WorkerState,
}

impl WorkerServer {
    pub fn new(config: WorkerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            state: WorkerState::new(config)?,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = create_router(self.state.clone());
        if self.state.config.enable_request_logging {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        }
    }

    /// Start with graceful shutdown
    ///
    /// Registration runs in the background after the listener is bound, so
    /// the coordinator can already reach the worker. A failed registration
    /// is logged and the worker keeps serving standalone.
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.state.config.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;
        let local_addr: SocketAddr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        tracing::info!(
            addr = %local_addr,
            node_id = %self.state.node_id(),
            "Starting Worker server"
        );

        if self.state.config.register_on_startup {
            let state = self.state.clone();
            tokio::spawn(async move {
                match state.register_with_coordinator(local_addr.port()).await {
                    Ok(response) => tracing::info!(
                        created = response.created,
                        registered_workers = response.registered_workers,
                        "Registered with coordinator"
                    ),
                    Err(e) => tracing::warn!(
                        error = %e,
                        "Registration with coordinator failed, running standalone"
                    ),
                }
            });
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Worker server shutdown complete");
        Ok(())
    }
}
