//! Coordinator server implementation
//!
//! This module wires the store, the worker registry and the delegator into
//! shared state and serves the API router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::storage::Database;

use super::api::create_router;
use super::config::CoordinatorConfig;
use super::delegation::Delegator;
use super::registry::WorkerRegistry;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Relational store
    pub db: Arc<Database>,

    /// Worker registry
    pub registry: Arc<WorkerRegistry>,

    /// Delegate-then-fallback policy for student creation
    pub delegator: Delegator,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: CoordinatorConfig,
}

impl AppState {
    /// Assemble state around an already opened store
    pub fn new(config: CoordinatorConfig, db: Database, delegator: Delegator) -> Self {
        Self {
            db: Arc::new(db),
            registry: Arc::new(WorkerRegistry::new(config.max_workers)),
            delegator,
            start_time: Instant::now(),
            config,
        }
    }

    /// State over an in-memory store with an HTTP delegator (for testing)
    pub fn in_memory(config: CoordinatorConfig) -> Result<Self, ServerError> {
        let db = Database::in_memory().map_err(|e| ServerError::InitError(e.to_string()))?;
        let delegator = Delegator::http(config.request_timeout())
            .map_err(|e| ServerError::InitError(e.to_string()))?;
        Ok(Self::new(config, db, delegator))
    }
}

// ============================================================================
// Coordinator Server
// ============================================================================

/// Main Coordinator server
pub struct CoordinatorServer {
    config: CoordinatorConfig,
    state: AppState,
}

impl CoordinatorServer {
    /// Open the store and create a coordinator server
    pub fn new(config: CoordinatorConfig) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let db = Database::open(&config.database_path)
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let delegator = Delegator::http(config.request_timeout())
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let state = AppState::new(config.clone(), db, delegator);
        Ok(Self { config, state })
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.clone(),
            state,
        }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(
            %addr,
            database = %self.config.database_path.display(),
            max_workers = self.config.max_workers,
            "Starting Coordinator server"
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Coordinator server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            database_path: self.config.database_path.display().to_string(),
            max_workers: self.config.max_workers,
            request_timeout_secs: self.config.request_timeout_secs,
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub database_path: String,
    pub max_workers: usize,
    pub request_timeout_secs: u64,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Coordinator Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Database: {}\n\
             Max Workers: {}\n\
             Delegation Timeout: {}s\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.database_path,
            self.max_workers,
            self.request_timeout_secs,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Initialization error
    InitError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InitError(msg) => write!(f, "Initialization error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================
