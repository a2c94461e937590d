//! Docker volume enumeration
//!
//! The exporter only needs one thing from the container runtime: the list of
//! volumes with their host mount points and labels. [`VolumeSource`] is the seam
//! the collection handler depends on; [`DockerClient`] is the production
//! implementation talking to the Docker Engine API over its Unix socket.

pub mod client;
pub mod types;

pub use client::DockerClient;
pub use types::Volume;

use crate::error::Result;
use async_trait::async_trait;

/// Anything that can enumerate the volumes to measure
#[async_trait]
pub trait VolumeSource: Send + Sync {
    async fn list_volumes(&self) -> Result<Vec<Volume>>;
}
