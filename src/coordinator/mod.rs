//! Coordinator service
//!
//! Owns the relational store and an in-memory registry of workers, and
//! offers student creation to a worker before processing it locally.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │          Coordinator Server           │
//! │                                       │
//! │  ┌─────────────────────────────────┐  │
//! │  │        Worker Registry          │  │
//! │  │  - Upsert by node_id            │  │
//! │  │  - Capacity bound               │  │
//! │  └─────────────────────────────────┘  │
//! │                                       │
//! │  ┌─────────────────────────────────┐  │
//! │  │          Delegator              │  │
//! │  │  - One POST /process_student    │  │
//! │  │  - Fallback on any failure      │  │
//! │  └─────────────────────────────────┘  │
//! │                                       │
//! │  ┌─────────────────────────────────┐  │
//! │  │           REST API              │  │
//! │  │  /universities  /courses        │  │
//! │  │  /students      /workers        │  │
//! │  │  /health /stats /metrics        │  │
//! │  └─────────────────────────────────┘  │
//! └───────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use campusnet::coordinator::{CoordinatorConfig, CoordinatorServer};
//!
//! let config = CoordinatorConfig::default();
//! let server = CoordinatorServer::new(config)?;
//! server.start().await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod delegation;
pub mod registry;
pub mod server;

// Re-export main types
pub use client::{ClientConfig, CoordinatorClient};
pub use config::CoordinatorConfig;
pub use delegation::{DelegationOutcome, Delegator, HttpWorkerGateway, WorkerGateway};
pub use registry::{WorkerNode, WorkerRegistry, WorkerStatus};
pub use server::{AppState, CoordinatorServer};
