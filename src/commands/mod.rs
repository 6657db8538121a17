pub mod serve;

// Re-export command functions for convenience
pub use serve::{coordinator_server, worker_server, CoordinatorParams, WorkerParams};
