use crate::error::{ExporterError, Result as ExporterResult};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_ROOTFS_DIRECTORY: &str = "/rootfs";
pub const DEFAULT_VOLUME_CONCURRENCY: usize = 10;
pub const DEFAULT_VOLUME_COMPUTATION_LIMIT_MS: u64 = 10_000;
pub const DEFAULT_WINDOW_SECONDS: u64 = 60;
pub const DEFAULT_PROBE_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub docker: DockerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionConfig {
    /// Prefix prepended to every volume mount point before probing
    #[serde(default = "default_rootfs_directory")]
    pub rootfs_directory: String,
    #[serde(default = "default_volume_concurrency")]
    pub volume_concurrency: usize,
    /// Cost budget in milliseconds of measured collection time per window
    #[serde(default = "default_volume_computation_limit_ms")]
    pub volume_computation_limit_ms: u64,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default = "default_probe_timeout_seconds")]
    pub probe_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DockerConfig {
    #[serde(default = "default_docker_socket")]
    pub socket_path: String,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9100
}

fn default_rootfs_directory() -> String {
    DEFAULT_ROOTFS_DIRECTORY.to_string()
}

fn default_volume_concurrency() -> usize {
    DEFAULT_VOLUME_CONCURRENCY
}

fn default_volume_computation_limit_ms() -> u64 {
    DEFAULT_VOLUME_COMPUTATION_LIMIT_MS
}

fn default_window_seconds() -> u64 {
    DEFAULT_WINDOW_SECONDS
}

fn default_probe_timeout_seconds() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECONDS
}

fn default_docker_socket() -> String {
    DEFAULT_DOCKER_SOCKET.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            rootfs_directory: default_rootfs_directory(),
            volume_concurrency: default_volume_concurrency(),
            volume_computation_limit_ms: default_volume_computation_limit_ms(),
            window_seconds: default_window_seconds(),
            probe_timeout_seconds: default_probe_timeout_seconds(),
        }
    }
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_docker_socket(),
        }
    }
}

impl CollectionConfig {
    /// Replaces zero values, which are never meaningful, with their defaults
    pub fn normalize(&mut self) {
        if self.rootfs_directory.is_empty() {
            self.rootfs_directory = default_rootfs_directory();
        }
        if self.volume_concurrency == 0 {
            self.volume_concurrency = default_volume_concurrency();
        }
        if self.volume_computation_limit_ms == 0 {
            self.volume_computation_limit_ms = default_volume_computation_limit_ms();
        }
        if self.window_seconds == 0 {
            self.window_seconds = default_window_seconds();
        }
        if self.probe_timeout_seconds == 0 {
            self.probe_timeout_seconds = default_probe_timeout_seconds();
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("DOCKER_VOLUME_EXPORTER").separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.collection.normalize();
        Ok(config)
    }
}

/// Parses a numeric override, falling back to `default` when the value is
/// empty, zero or not a number.
pub fn parse_nonzero_or<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + PartialEq + Default + Display + Copy,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return default;
    }
    match raw.parse::<T>() {
        Ok(value) if value != T::default() => value,
        Ok(_) => {
            warn!("{} is zero, using default {}", name, default);
            default
        }
        Err(_) => {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }
    }
}

/// Extracts the socket path from a `DOCKER_HOST` value.
///
/// Only `unix://` endpoints are supported; a bare path is accepted as-is.
pub fn socket_from_docker_host(host: &str) -> ExporterResult<String> {
    let host = host.trim();
    if let Some(path) = host.strip_prefix("unix://") {
        if path.is_empty() {
            return Err(ExporterError::Config(
                "DOCKER_HOST has an empty unix socket path".to_string(),
            ));
        }
        return Ok(path.to_string());
    }
    if host.starts_with('/') {
        return Ok(host.to_string());
    }
    Err(ExporterError::Config(format!(
        "unsupported DOCKER_HOST {:?}, only unix:// sockets are supported",
        host
    )))
}

/// Parses a `PORT` override. Empty values mean "keep the configured port".
pub fn parse_port(raw: &str) -> ExporterResult<Option<u16>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u16>()
        .map(Some)
        .map_err(|_| ExporterError::Config(format!("invalid PORT {:?}", raw)))
}
