//! Main entry point for the Tranca lock coordinator server.
//!
//! Sets up logging, constructs the single lock service instance, and starts
//! the HTTP management surface.

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use tracing::info;

use tranca_console::model::AppState;
use tranca_core::service::audit::{AuditService, FileAuditStore};
use tranca_core::service::lock::{LockService, LockServiceConfig};
use tranca_server::model::Configuration;
use tranca_server::startup::{self, LoggingConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new();

    let _logging_guard = startup::init_logging(&LoggingConfig::from_env())?;

    let audit = Arc::new(AuditService::with_store(
        configuration.audit_capacity(),
        Arc::new(FileAuditStore::new(configuration.audit_log_path())),
    ));
    let lock_service = Arc::new(LockService::with_config(
        audit,
        LockServiceConfig {
            acquire_timeout: configuration.acquire_timeout(),
        },
    ));

    let address = configuration.server_address();
    let port = configuration.server_port();
    let context_path = configuration.context_path();

    info!(
        "Tranca server listening on {}:{} (context path '/{}')",
        address, port, context_path
    );
    info!(
        audit_log = %configuration.audit_log_path(),
        acquire_timeout_ms = configuration.acquire_timeout().as_millis() as u64,
        "Lock coordinator initialized"
    );

    let app_state = web::Data::new(AppState { lock_service });
    let scope_path = format!("/{}", context_path);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .service(web::scope(&scope_path).service(tranca_console::v1_routes()))
    })
    .bind((address, port))?
    .run()
    .await?;

    Ok(())
}
