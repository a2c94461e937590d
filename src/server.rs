//! HTTP Server
//!
//! Axum server exposing a single route, `GET /metrics`.
//!
//! # Responses
//!
//! - `200 OK` with one metric line per measured volume, streamed as probes complete
//! - `200 OK` with an empty body when the collection budget is exhausted
//! - `500 Internal Server Error` when the volume list cannot be fetched
//!
//! Collection runs in its own task writing into an in-memory pipe that backs the
//! response body. If the client goes away the pipe closes, the next write fails
//! and the collection stops early, dropping (and killing) its in-flight probes.

use crate::collector::ParallelCollector;
use crate::config::Config;
use crate::docker::DockerClient;
use crate::handler::CollectionHandler;
use crate::probe::CommandProbe;
use crate::throttle::BudgetThrottle;
use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::stream::{self, Stream};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{error, info};

const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
const BODY_PIPE_CAPACITY: usize = 64 * 1024;
const BODY_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Clone)]
struct AppState {
    handler: CollectionHandler,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let app = router(build_handler(&config));

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

/// Wires the production collaborators together from configuration
pub fn build_handler(config: &Config) -> CollectionHandler {
    let collection = &config.collection;

    let throttle = Arc::new(BudgetThrottle::new(
        collection.volume_computation_limit_ms,
        collection.window(),
    ));
    let source = Arc::new(DockerClient::new(&config.docker.socket_path));
    let probe = Arc::new(CommandProbe::du(collection.probe_timeout()));
    let collector = ParallelCollector::new(
        probe,
        collection.rootfs_directory.clone(),
        collection.volume_concurrency,
    );

    CollectionHandler::new(throttle, source, collector)
}

pub fn router(handler: CollectionHandler) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(AppState { handler })
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let collection = match state.handler.begin().await {
        Ok(Some(collection)) => collection,
        Ok(None) => return text_response(Body::empty()),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error listing volumes: {}", e),
            )
                .into_response()
        }
    };

    let (mut writer, reader) = tokio::io::duplex(BODY_PIPE_CAPACITY);
    tokio::spawn(async move {
        collection.emit(&mut writer).await;
    });

    text_response(Body::from_stream(read_chunks(reader)))
}

fn text_response(body: Body) -> Response {
    ([(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)], body).into_response()
}

/// Turns the read half of the body pipe into a stream of chunks ending at EOF
fn read_chunks<R>(reader: R) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send + 'static
where
    R: AsyncRead + Unpin + Send + 'static,
{
    stream::unfold(Some(reader), |reader| async move {
        let mut reader = reader?;
        let mut chunk = vec![0u8; BODY_CHUNK_SIZE];
        match reader.read(&mut chunk).await {
            Ok(0) => None,
            Ok(n) => {
                chunk.truncate(n);
                Some((Ok(chunk), Some(reader)))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
