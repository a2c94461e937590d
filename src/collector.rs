//! Parallel Volume Size Collection
//!
//! Fans out one size probe per volume with a hard cap on how many probes are in
//! flight at once; the remaining volumes wait for a free slot.
//!
//! # Error Handling
//!
//! A failed probe is logged and its volume is left out of the results. Partial
//! results are the normal outcome of a collection, not an error.
//!
//! # Ordering
//!
//! Results are produced in completion order, which has no relation to the input order.

use crate::config::DEFAULT_VOLUME_CONCURRENCY;
use crate::docker::Volume;
use crate::error::Result;
use crate::probe::{probe_path, SizeProbe};
use futures_util::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::warn;

/// Size of one volume measured during a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub volume: Volume,
    /// Absolute path that was probed (root prefix + mount point)
    pub path: String,
    pub size_bytes: u64,
}

/// Runs size probes for a batch of volumes under a concurrency cap
#[derive(Clone)]
pub struct ParallelCollector {
    probe: Arc<dyn SizeProbe>,
    rootfs: String,
    max_concurrency: usize,
}

impl ParallelCollector {
    /// A `max_concurrency` of zero falls back to the default of 10.
    pub fn new(probe: Arc<dyn SizeProbe>, rootfs: impl Into<String>, max_concurrency: usize) -> Self {
        let max_concurrency = if max_concurrency == 0 {
            DEFAULT_VOLUME_CONCURRENCY
        } else {
            max_concurrency
        };
        Self {
            probe,
            rootfs: rootfs.into(),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Probes every volume, yielding each outcome as soon as it completes.
    ///
    /// Probes are only started while the stream is polled, and dropping the stream
    /// drops the in-flight probes with it.
    pub fn results(&self, volumes: Vec<Volume>) -> impl Stream<Item = Result<ProbeResult>> + Send + '_ {
        stream::iter(volumes)
            .map(move |volume| self.probe_volume(volume))
            .buffer_unordered(self.max_concurrency)
    }

    /// Probes every volume and returns the successful results
    pub async fn collect(&self, volumes: Vec<Volume>) -> Vec<ProbeResult> {
        self.results(volumes)
            .filter_map(|outcome| async move { outcome.ok() })
            .collect()
            .await
    }

    async fn probe_volume(&self, volume: Volume) -> Result<ProbeResult> {
        let path = probe_path(&self.rootfs, &volume.mount_point);

        match self.probe.size_of(&path).await {
            Ok(size_bytes) => Ok(ProbeResult {
                volume,
                path,
                size_bytes,
            }),
            Err(e) => {
                warn!("Failed to get size of volume {}: {}", volume.name, e);
                Err(e)
            }
        }
    }
}
