//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use docker_volume_exporter::collector::ParallelCollector;
use docker_volume_exporter::docker::{Volume, VolumeSource};
use docker_volume_exporter::error::{ExporterError, Result};
use docker_volume_exporter::handler::CollectionHandler;
use docker_volume_exporter::probe::SizeProbe;
use docker_volume_exporter::throttle::BudgetThrottle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Volume source returning a fixed list, or failing like an unreachable daemon
pub struct FakeSource {
    volumes: Option<Vec<Volume>>,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_volumes(volumes: Vec<Volume>) -> Self {
        Self {
            volumes: Some(volumes),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            volumes: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VolumeSource for FakeSource {
    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.volumes
            .clone()
            .ok_or_else(|| ExporterError::DockerApi("connection refused".to_string()))
    }
}

/// Size probe answering from a path → size table; unknown paths fail
pub struct FakeProbe {
    sizes: HashMap<String, u64>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new<'a>(sizes: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            sizes: sizes
                .into_iter()
                .map(|(path, size)| (path.to_string(), size))
                .collect(),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SizeProbe for FakeProbe {
    async fn size_of(&self, path: &str) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sizes
            .get(path)
            .copied()
            .ok_or_else(|| ExporterError::ProbeFailed {
                path: path.to_string(),
                reason: "exit status: 1".to_string(),
            })
    }
}

/// The three volumes of the reference round-trip scenario: v3 cannot be measured
pub fn scenario_volumes() -> Vec<Volume> {
    vec![
        Volume::new("v1", "/data1"),
        Volume::new("v2", "/data2").with_label("com.docker.compose.project", "p"),
        Volume::new("v3", "/data3"),
    ]
}

pub fn scenario_probe() -> FakeProbe {
    FakeProbe::new([("/rootfs/data1", 100), ("/rootfs/data2", 200)])
}

pub fn build_handler(
    source: Arc<FakeSource>,
    probe: Arc<FakeProbe>,
    limit_ms: u64,
    concurrency: usize,
) -> CollectionHandler {
    let throttle = Arc::new(BudgetThrottle::new(limit_ms, Duration::from_secs(60)));
    let collector = ParallelCollector::new(probe, "/rootfs", concurrency);
    CollectionHandler::new(throttle, source, collector)
}

/// Splits a response body into its set of lines, ignoring order
pub fn sorted_lines(body: &str) -> Vec<String> {
    let mut lines: Vec<String> = body.lines().map(str::to_string).collect();
    lines.sort();
    lines
}
