//! Error types and error codes for Tranca
//!
//! This module defines:
//! - `TrancaError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use serde::{Deserialize, Serialize};

use crate::LockMode;

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum TrancaError {
    #[error("lock acquisition timed out for resource '{resource}' ({mode} requested by session '{session}')")]
    LockTimeout {
        resource: String,
        mode: LockMode,
        session: String,
    },

    #[error("lock request cancelled for resource '{resource}' (session '{session}')")]
    LockCancelled { resource: String, session: String },

    #[error("invalid resource: {0}")]
    InvalidResource(String),
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

// General success and error codes
pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter missing",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};
