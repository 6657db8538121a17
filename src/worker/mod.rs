//! Worker service
//!
//! Simulates student validation and enrichment, fabricates illustrative
//! analytics, and announces itself to the coordinator once at startup.
//! All state is process-local and lost on restart.

pub mod analytics;
pub mod api;
pub mod config;
pub mod processor;
pub mod server;

pub use config::WorkerConfig;
pub use processor::{ProcessOutcome, ProcessResponse, StudentProcessor};
pub use server::{WorkerServer, WorkerState};
