//! Volume Size Probe
//!
//! Computes the on-disk size of a directory tree by running an external
//! recursive size command (`du -bs <path>` by default) and parsing its
//! `<bytes>\t<path>` output.
//!
//! Every failure mode (spawn error, non-zero exit, timeout, malformed output)
//! is returned as an error for the caller to treat as a per-volume soft failure.

use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Measures the size in bytes of the tree rooted at an absolute path
#[async_trait]
pub trait SizeProbe: Send + Sync {
    async fn size_of(&self, path: &str) -> Result<u64>;
}

/// Size probe backed by an external command
///
/// The probed path is appended as the last argument. Children are spawned with
/// `kill_on_drop`, so a timed-out or cancelled probe does not leave a process behind.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new<I, S>(program: impl Into<String>, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    /// `du -bs`: apparent size in bytes, summarized
    pub fn du(timeout: Duration) -> Self {
        Self::new("du", ["-bs"], timeout)
    }
}

#[async_trait]
impl SizeProbe for CommandProbe {
    async fn size_of(&self, path: &str) -> Result<u64> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ExporterError::ProbeFailed {
                    path: path.to_string(),
                    reason: format!("failed to run {}: {}", self.program, e),
                })
            }
            Err(_) => {
                return Err(ExporterError::ProbeTimeout {
                    path: path.to_string(),
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExporterError::ProbeFailed {
                path: path.to_string(),
                reason: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        let size = parse_du_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!("{} is {} bytes", path, size);
        Ok(size)
    }
}

/// Parses `<bytes>\t<path>` keeping only the byte count
pub fn parse_du_output(output: &str) -> Result<u64> {
    let (bytes, _path) = output
        .split_once('\t')
        .ok_or_else(|| ExporterError::MalformedProbeOutput(output.to_string()))?;

    if bytes.is_empty() || !bytes.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExporterError::MalformedProbeOutput(output.to_string()));
    }

    bytes
        .parse::<u64>()
        .map_err(|_| ExporterError::MalformedProbeOutput(output.to_string()))
}

/// Absolute path of a volume as seen from inside the exporter's filesystem
///
/// Mount points are absolute, so the root prefix is concatenated rather than joined.
pub fn probe_path(rootfs: &str, mount_point: &str) -> String {
    let rootfs = if mount_point.starts_with('/') {
        rootfs.trim_end_matches('/')
    } else {
        rootfs
    };
    format!("{}{}", rootfs, mount_point)
}
