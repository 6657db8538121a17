use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campusnet::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "campusnet",
    version,
    about = "University management coordinator with delegating worker nodes",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file; environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator REST service
    Coordinator {
        /// Address to bind, e.g. 0.0.0.0:8000
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Maximum registered workers
        #[arg(long)]
        max_workers: Option<usize>,

        /// Delegation timeout in seconds
        #[arg(long)]
        request_timeout: Option<u64>,

        /// Disable CORS headers
        #[arg(long, default_value = "false")]
        no_cors: bool,
    },

    /// Run a worker node
    Worker {
        /// Address to bind, e.g. 0.0.0.0:8001
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// Coordinator base URL
        #[arg(long)]
        coordinator_url: Option<String>,

        /// Fixed worker id
        #[arg(long)]
        node_id: Option<String>,

        /// Host announced to the coordinator
        #[arg(long)]
        advertise_host: Option<String>,

        /// Skip registration with the coordinator
        #[arg(long, default_value = "false")]
        no_register: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    if let Err(e) = campusnet::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics unavailable");
    }

    match cli.command {
        Commands::Coordinator {
            bind,
            database,
            max_workers,
            request_timeout,
            no_cors,
        } => {
            tracing::info!(bind = ?bind, database = ?database, "Starting coordinator command");
            commands::coordinator_server(
                config,
                commands::CoordinatorParams {
                    bind,
                    database,
                    max_workers,
                    request_timeout,
                    disable_cors: no_cors,
                },
            )
            .await?;
        }

        Commands::Worker {
            bind,
            coordinator_url,
            node_id,
            advertise_host,
            no_register,
        } => {
            tracing::info!(bind = ?bind, coordinator_url = ?coordinator_url, "Starting worker command");
            commands::worker_server(
                config,
                commands::WorkerParams {
                    bind,
                    coordinator_url,
                    node_id,
                    advertise_host,
                    no_register,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("campusnet=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("campusnet={level},tower_http=info,warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
