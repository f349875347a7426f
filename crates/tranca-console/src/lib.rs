//! Tranca Console - Management console backend
//!
//! This crate provides:
//! - Console API endpoints for the lock coordinator
//! - Shared application state for HTTP handlers
//! - The response envelope used by every endpoint

pub mod model;
pub mod v1;

// Re-export commonly used types
pub use model::{ApiResult, AppState};
pub use v1::route::routes as v1_routes;
