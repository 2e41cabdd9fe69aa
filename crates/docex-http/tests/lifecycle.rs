use docex_core::PipelineConfig;
use docex_extract::testing::{sample_analyze_result, BlankRenderer, ScriptedChat, StaticAnalyzer};
use docex_extract::{ExtractionPipeline, MappingCatalog};
use docex_http::{build_router, serve_until, AppState, HttpConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

fn router() -> axum::Router {
    let pipeline = ExtractionPipeline::new(
        Arc::new(ScriptedChat::new(vec![])),
        &MappingCatalog::builtin(),
        "dock_management",
    )
    .unwrap();
    let state = AppState::new(
        Arc::new(StaticAnalyzer::new(sample_analyze_result())),
        Arc::new(BlankRenderer::new(1)),
        pipeline,
        PipelineConfig::default(),
        HttpConfig::default(),
    );
    build_router(state)
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        path
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_until_shutdown_signal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_until(
        listener,
        router(),
        async move {
            let _ = stop_rx.await;
        },
        Duration::from_secs(5),
    ));

    let response = get(addr, "/").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("Your application is up!"));

    let response = get(addr, "/health").await;
    assert!(response.contains("\"status\":\"healthy\""));

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_shutdown_gives_up_on_stuck_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_until(
        listener,
        router(),
        async move {
            let _ = stop_rx.await;
        },
        Duration::from_millis(200),
    ));

    // half-written request keeps the connection busy through shutdown
    let mut idle = TcpStream::connect(addr).await.unwrap();
    idle.write_all(b"GET / HTTP/1.1\r\nHost: local").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
