//! Shared models for the console backend

use std::sync::Arc;

use actix_web::{HttpResponse, http::StatusCode};
use serde::{Deserialize, Serialize};

use tranca_common::error;
use tranca_core::service::lock::LockService;

/// Application state shared across all handlers
///
/// The lock service is a single instance constructed at startup and injected
/// here; handlers never reach for a module-level global.
pub struct AppState {
    pub lock_service: Arc<LockService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("lock_service", &"<LockService>")
            .finish()
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            lock_service: self.lock_service.clone(),
        }
    }
}

/// API result wrapper
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error::SUCCESS.code,
            message: error::SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self::success(data))
    }

    pub fn http_response(status: u16, code: i32, message: String, data: T) -> HttpResponse {
        HttpResponse::build(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .json(Self {
            code,
            message,
            data,
        })
    }
}

impl ApiResult<String> {
    /// Bad request response for a missing required parameter
    pub fn http_parameter_missing(name: &str) -> HttpResponse {
        Self::http_response(
            400,
            error::PARAMETER_MISSING.code,
            format!("required parameter '{}' is missing", name),
            String::new(),
        )
    }

    /// Bad request response for a malformed parameter
    pub fn http_parameter_invalid(message: String) -> HttpResponse {
        Self::http_response(
            400,
            error::PARAMETER_VALIDATE_ERROR.code,
            message,
            String::new(),
        )
    }
}
