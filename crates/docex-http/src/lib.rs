//! # docex-http
//!
//! HTTP API of the docex extraction service: document upload, health check,
//! error envelope, structured logging and graceful shutdown on top of axum.

pub mod config;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod server;

pub use config::HttpConfig;
pub use errors::{HttpError, HttpResult};
pub use logging::{init_logging, log_shutdown_info, log_startup_info, LoggingConfig};
pub use routes::ExtractResponse;
pub use server::{build_router, serve_until, start_server, AppState};
