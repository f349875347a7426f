//! Server startup modules

pub mod logging;

pub use logging::{LoggingConfig, LoggingGuard, init_logging};
