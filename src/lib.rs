//! campusnet - University management with delegating workers
//!
//! A coordinator REST service owns universities, courses and students in
//! SQLite and keeps an in-memory registry of workers. Student creation is
//! offered to a worker first and processed locally when no worker takes it.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`coordinator`] - Coordinator API, worker registry and delegation
//! - [`worker`] - Worker API with simulated processing and analytics
//! - [`storage`] - SQLite schema, seeding and queries
//! - [`models`] - Core data structures and types
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use campusnet::coordinator::{CoordinatorConfig, CoordinatorServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = CoordinatorServer::new(CoordinatorConfig::default())?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod metrics;
pub mod models;
pub mod storage;
pub mod utils;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::coordinator::{CoordinatorConfig, CoordinatorServer};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Course, Student, StudentCreate, University, UniversityType};
    pub use crate::storage::Database;
    pub use crate::worker::{WorkerConfig, WorkerServer};
}
