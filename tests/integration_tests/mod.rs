//! Integration tests module
//!
//! End-to-end tests for the coordinator and worker services, including:
//! - University, course and student routes over an in-memory store
//! - Worker processing, history and analytics routes
//! - Delegate-then-fallback against mock and real workers

pub mod coordinator_api_test;
pub mod delegation_test;
pub mod fixtures;
pub mod worker_api_test;
