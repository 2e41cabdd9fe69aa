//! Server lifecycle management - router assembly, startup, shutdown and signal handling

use super::health::health_check_handler;
use super::AppState;
use crate::errors::{HttpError, HttpResult};
use crate::middleware::request_logging;
use crate::routes::{extract_information, not_found, root};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Assemble the API router with its middleware stack
pub fn build_router(state: AppState) -> Router {
    let config = state.http_config.clone();

    let mut router = Router::new()
        .route("/", get(root))
        .route(&config.health_check_path, get(health_check_handler))
        .route("/extract/", post(extract_information))
        .route("/extract", post(extract_information))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_request_size))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(config.max_request_size))
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
        .layer(axum::middleware::from_fn(request_logging))
        .with_state(state);

    if config.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if config.enable_tracing {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Start the server, shutting down gracefully on Ctrl+C or SIGTERM
pub async fn start_server(
    addr: SocketAddr,
    router: Router,
    shutdown_timeout: Duration,
) -> HttpResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| HttpError::startup(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    serve_until(listener, router, shutdown_signal(), shutdown_timeout).await
}

/// Serve until `signal` resolves, then drain connections for at most `shutdown_timeout`.
pub async fn serve_until<F>(
    listener: TcpListener,
    router: Router,
    signal: F,
    shutdown_timeout: Duration,
) -> HttpResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => return flatten(result),
        _ = signal => {}
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(shutdown_timeout, &mut server).await {
        Ok(result) => flatten(result),
        Err(_) => {
            warn!(
                "Graceful shutdown did not finish within {}s, dropping open connections",
                shutdown_timeout.as_secs()
            );
            server.abort();
            Ok(())
        }
    }
}

fn flatten(result: Result<std::io::Result<()>, tokio::task::JoinError>) -> HttpResult<()> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(HttpError::internal(format!("Server error: {}", e))),
        Err(e) => Err(HttpError::internal(format!("Server task failed: {}", e))),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            warn!("Received terminate signal, shutting down gracefully...");
        },
    }
}
