use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Docker API error: {0}")]
    DockerApi(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Size probe failed for {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Size probe timed out for {path} after {timeout:?}")]
    ProbeTimeout { path: String, timeout: Duration },

    #[error("Unexpected size probe output: {0:?}")]
    MalformedProbeOutput(String),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
