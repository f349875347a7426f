//! Tranca Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all Tranca
//! components:
//! - Error types and error codes
//! - Lock mode definitions
//! - Identifier validation
//! - Common constants

use serde::{Deserialize, Serialize};

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, TrancaError};
pub use utils::is_valid;

/// Default deadline for a queued lock request, in milliseconds
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5000;

/// Default capacity of the in-memory audit ring buffer
pub const DEFAULT_AUDIT_CAPACITY: usize = 200;

/// Query parameter names
pub const RESOURCE_ID: &str = "resourceId";
pub const HOLD_MS: &str = "holdMs";

/// Shared vs. exclusive access to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LockMode {
    #[default]
    Read,
    Write,
}

impl LockMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LockMode::Read => "READ",
            LockMode::Write => "WRITE",
        }
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READ" => Ok(LockMode::Read),
            "WRITE" => Ok(LockMode::Write),
            _ => Err(format!("unknown lock mode '{}'", s)),
        }
    }
}
