use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use campusnet::config::Config;
use campusnet::coordinator::CoordinatorServer;
use campusnet::worker::WorkerServer;

/// Resolve when Ctrl+C is received
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown signal received");
        }
        Err(e) => {
            tracing::error!("Failed to wait for Ctrl+C: {}", e);
        }
    }
}

// ============================================================================
// Coordinator Server
// ============================================================================

/// Flags overriding the coordinator section of the config
pub struct CoordinatorParams {
    pub bind: Option<SocketAddr>,
    pub database: Option<PathBuf>,
    pub max_workers: Option<usize>,
    pub request_timeout: Option<u64>,
    pub disable_cors: bool,
}

/// Start the coordinator server
pub async fn coordinator_server(config: Config, params: CoordinatorParams) -> Result<()> {
    let mut config = config.coordinator;
    if let Some(bind) = params.bind {
        config.bind_address = bind;
    }
    if let Some(database) = params.database {
        config.database_path = database;
    }
    if let Some(max_workers) = params.max_workers {
        config.max_workers = max_workers;
    }
    if let Some(timeout) = params.request_timeout {
        config.request_timeout_secs = timeout;
    }
    if params.disable_cors {
        config.enable_cors = false;
    }

    let server = CoordinatorServer::new(config).context("Failed to create coordinator server")?;

    println!("{}", server.info().display());
    println!();
    println!("Coordinator server listening on http://{}", server.info().bind_address);
    println!("Press Ctrl+C to stop.\n");

    server.start_with_shutdown(shutdown_signal()).await?;

    println!("Coordinator server stopped.");
    Ok(())
}

// ============================================================================
// Worker Server
// ============================================================================

/// Flags overriding the worker section of the config
pub struct WorkerParams {
    pub bind: Option<SocketAddr>,
    pub coordinator_url: Option<String>,
    pub node_id: Option<String>,
    pub advertise_host: Option<String>,
    pub no_register: bool,
}

/// Start the worker server
pub async fn worker_server(config: Config, params: WorkerParams) -> Result<()> {
    let mut config = config.worker;
    if let Some(bind) = params.bind {
        config.bind_address = bind;
    }
    if let Some(url) = params.coordinator_url {
        config.coordinator_url = url;
    }
    if params.node_id.is_some() {
        config.node_id = params.node_id;
    }
    if params.advertise_host.is_some() {
        config.advertise_host = params.advertise_host;
    }
    if params.no_register {
        config.register_on_startup = false;
    }

    let server = WorkerServer::new(config).context("Failed to create worker server")?;
    let state = server.state();

    println!("Starting Worker Server");
    println!("======================");
    println!("  Worker ID: {}", state.node_id());
    println!("  Bind Address: {}", state.config.bind_address);
    println!("  Coordinator: {}", state.config.coordinator_url);
    println!("  Capabilities: {}", state.config.capabilities.join(", "));
    println!(
        "  Registration: {}",
        if state.config.register_on_startup { "enabled" } else { "disabled" }
    );
    println!("Press Ctrl+C to stop.\n");

    server.start_with_shutdown(shutdown_signal()).await?;

    println!("Worker server stopped.");
    Ok(())
}
