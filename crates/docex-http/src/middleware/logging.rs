//! # Logging Middleware
//!
//! HTTP request/response logging for observability.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const SENSITIVE_HEADERS: [&str; 7] = [
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
    "x-auth-token",
    "ocp-apim-subscription-key",
];

/// Logs method, path, status and latency of every request.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let start_time = Instant::now();

    info!("→ {} {}", request.method(), request.uri().path());

    for (name, value) in request.headers() {
        if is_sensitive_header(name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            debug!("  {}: {}", name, value);
        }
    }

    let response = next.run(request).await;

    let duration_ms = start_time.elapsed().as_millis();
    let status = response.status();
    if status.is_server_error() {
        error!("← {} {}ms (Server Error)", status.as_u16(), duration_ms);
    } else if status.is_client_error() {
        warn!("← {} {}ms (Client Error)", status.as_u16(), duration_ms);
    } else {
        info!("← {} {}ms", status.as_u16(), duration_ms);
    }

    response
}

/// Check if a header name is sensitive and should not be logged
fn is_sensitive_header(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| name_lower.contains(sensitive))
}
