//! Console V1 routing configuration

use actix_web::{Scope, web};

use super::locks;

/// Create the v1 console routes
pub fn routes() -> Scope {
    web::scope("/v1").service(locks::routes())
}
