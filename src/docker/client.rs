//! Docker Engine API Client
//!
//! Minimal HTTP client for the Docker Engine API over its Unix socket.
//!
//! # Protocol
//!
//! - **Transport**: a fresh `UnixStream` per request, closed after the response
//! - **Request**: plain `HTTP/1.0` so the daemon answers with an un-chunked body
//!   and closes the connection, letting us read to EOF
//! - **Versioning**: unversioned paths, which the daemon serves at its own API version
//!
//! # Example
//!
//! ```no_run
//! use docker_volume_exporter::docker::{DockerClient, VolumeSource};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DockerClient::new("/var/run/docker.sock");
//! let volumes = client.list_volumes().await?;
//! # Ok(())
//! # }
//! ```

use super::types::{ApiErrorBody, Volume, VolumeListResponse};
use super::VolumeSource;
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, warn};

/// Client for the Docker Engine API
pub struct DockerClient {
    socket_path: PathBuf,
}

/// A parsed HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl DockerClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send an HTTP GET request over the Unix socket
    async fn get(&self, path: &str) -> Result<HttpResponse> {
        let mut stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            ExporterError::DockerApi(format!(
                "failed to connect to {}: {}",
                self.socket_path.display(),
                e
            ))
        })?;

        let request = format!(
            "GET {} HTTP/1.0\r\nHost: docker\r\nAccept: application/json\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;

        debug!("GET {} returned {} bytes", path, raw.len());
        parse_http_response(&raw)
    }
}

#[async_trait]
impl VolumeSource for DockerClient {
    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let response = self.get("/volumes").await?;

        if !(200..300).contains(&response.status) {
            let message = serde_json::from_str::<ApiErrorBody>(&response.body)
                .map(|body| body.message)
                .unwrap_or_else(|_| response.body.trim().to_string());
            return Err(ExporterError::DockerApi(format!(
                "GET /volumes returned status {}: {}",
                response.status, message
            )));
        }

        let list: VolumeListResponse = serde_json::from_str(&response.body)?;
        for warning in &list.warnings {
            warn!("Docker volume list warning: {}", warning);
        }
        Ok(list.volumes)
    }
}

/// Splits a raw HTTP/1.x response into status code and body
pub fn parse_http_response(raw: &[u8]) -> Result<HttpResponse> {
    let text = String::from_utf8_lossy(raw);

    let (head, body) = text
        .split_once("\r\n\r\n")
        .ok_or_else(|| ExporterError::DockerApi("incomplete HTTP response".to_string()))?;

    let status_line = head.lines().next().unwrap_or_default();
    let mut parts = status_line.split_whitespace();
    let status = match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => {
            code.parse::<u16>().map_err(|_| {
                ExporterError::DockerApi(format!("invalid status line {:?}", status_line))
            })?
        }
        _ => {
            return Err(ExporterError::DockerApi(format!(
                "invalid status line {:?}",
                status_line
            )))
        }
    };

    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}
