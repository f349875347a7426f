//! Configuration management for the Tranca server
//!
//! This module handles loading and accessing application configuration.

use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};

use tranca_common::{DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_AUDIT_CAPACITY};

const DEFAULT_SERVER_PORT: u16 = 8848;
const DEFAULT_CONTEXT_PATH: &str = "tranca";

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command()]
struct Cli {
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    #[arg(long = "audit-log", env = "TRANCA_AUDIT_LOG")]
    audit_log: Option<String>,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> Self {
        let args = Cli::parse();
        let mut config_builder = Config::builder()
            .add_source(
                Environment::with_prefix("tranca")
                    .separator(".")
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("conf/application").required(false));

        if let Some(v) = args.port {
            config_builder = config_builder
                .set_override("server.port", i64::from(v))
                .expect("Failed to set server port override");
        }
        if let Some(v) = args.audit_log {
            config_builder = config_builder
                .set_override("tranca.audit.path", v)
                .expect("Failed to set audit log path override");
        }

        let app_config = config_builder
            .build()
            .expect("Failed to build configuration");

        Configuration { config: app_config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .unwrap_or(DEFAULT_SERVER_PORT.into()) as u16
    }

    pub fn context_path(&self) -> String {
        self.config
            .get_string("tranca.server.contextPath")
            .unwrap_or(DEFAULT_CONTEXT_PATH.to_string())
    }

    // ========================================================================
    // Lock Coordinator Configuration
    // ========================================================================

    pub fn acquire_timeout(&self) -> Duration {
        let millis = self
            .config
            .get_int("tranca.lock.acquireTimeoutMs")
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS as i64);
        Duration::from_millis(millis.max(1) as u64)
    }

    // ========================================================================
    // Audit Configuration
    // ========================================================================

    pub fn audit_capacity(&self) -> usize {
        self.config
            .get_int("tranca.audit.capacity")
            .unwrap_or(DEFAULT_AUDIT_CAPACITY as i64) as usize
    }

    pub fn audit_log_path(&self) -> String {
        self.config
            .get_string("tranca.audit.path")
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                format!("{}/tranca/logs/lock-audit.log", home)
            })
    }
}
