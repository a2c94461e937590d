//! Scrape Orchestration
//!
//! One scrape moves through `ENTRY → (REJECTED | COLLECTING → EMITTING) → DONE`:
//!
//! 1. **Entry**: only one collection runs at a time; a scrape arriving while
//!    another is in flight is skipped. Otherwise the [`BudgetThrottle`] decides
//!    whether a collection may run. A rejected scrape is a silent no-op, not an error.
//! 2. **Collecting**: the volume list is fetched. A failure here ends the scrape
//!    with an error before any probe is started.
//! 3. **Emitting**: probe results are formatted and written as they complete.
//!    The first write failure abandons the remaining writes and drops the
//!    in-flight probes.
//! 4. **Done**: the elapsed time since entry is recorded as the collection's cost.
//!
//! The first two phases live in [`CollectionHandler::begin`] so the HTTP layer can
//! pick a status code before it starts streaming the body from [`Collection::emit`].

use crate::collector::ParallelCollector;
use crate::docker::{Volume, VolumeSource};
use crate::error::Result;
use crate::format::format_metric;
use crate::throttle::BudgetThrottle;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

/// Shared, cheaply cloneable entry point for scrapes
#[derive(Clone)]
pub struct CollectionHandler {
    throttle: Arc<BudgetThrottle>,
    source: Arc<dyn VolumeSource>,
    collector: ParallelCollector,
    // Held from admission until the cost is recorded
    in_flight: Arc<Semaphore>,
}

/// An admitted scrape whose volume list has been fetched
pub struct Collection {
    handler: CollectionHandler,
    started: Instant,
    volumes: Vec<Volume>,
    _permit: OwnedSemaphorePermit,
}

/// What happened during one emitted collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSummary {
    pub volumes: usize,
    pub emitted: usize,
    pub failed: usize,
    pub elapsed: Duration,
    /// A write failed and the remaining results were abandoned
    pub aborted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Throttled,
    Collected(CollectionSummary),
}

impl CollectionHandler {
    pub fn new(
        throttle: Arc<BudgetThrottle>,
        source: Arc<dyn VolumeSource>,
        collector: ParallelCollector,
    ) -> Self {
        Self {
            throttle,
            source,
            collector,
            in_flight: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn throttle(&self) -> &BudgetThrottle {
        &self.throttle
    }

    pub async fn begin(&self) -> Result<Option<Collection>> {
        self.begin_at(Instant::now()).await
    }

    /// Runs the admission check as of `now` and fetches the volume list.
    ///
    /// Returns `Ok(None)` when the scrape is throttled or another collection is
    /// still running. The collection's cost is measured on the real clock from
    /// this call onwards.
    pub async fn begin_at(&self, now: Instant) -> Result<Option<Collection>> {
        let started = Instant::now();

        let permit = match self.in_flight.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("Skipping volume collection, another collection is in progress");
                return Ok(None);
            }
        };

        if !self.throttle.admit(now) {
            debug!(
                "Skipping volume collection, budget exhausted ({} ms consumed)",
                self.throttle.snapshot().consumed_cost_ms
            );
            return Ok(None);
        }

        let volumes = match self.source.list_volumes().await {
            Ok(volumes) => volumes,
            Err(e) => {
                error!("Failed to list volumes: {}", e);
                return Err(e);
            }
        };

        Ok(Some(Collection {
            handler: self.clone(),
            started,
            volumes,
            _permit: permit,
        }))
    }

    /// Runs a whole scrape, writing metric lines to `writer`
    pub async fn scrape<W>(&self, writer: &mut W) -> Result<ScrapeOutcome>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.scrape_at(Instant::now(), writer).await
    }

    pub async fn scrape_at<W>(&self, now: Instant, writer: &mut W) -> Result<ScrapeOutcome>
    where
        W: AsyncWrite + Unpin + Send,
    {
        match self.begin_at(now).await? {
            Some(collection) => Ok(ScrapeOutcome::Collected(collection.emit(writer).await)),
            None => Ok(ScrapeOutcome::Throttled),
        }
    }
}

impl Collection {
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// Probes all volumes and writes one line per successful probe, then records
    /// the elapsed cost with the throttle.
    pub async fn emit<W>(self, writer: &mut W) -> CollectionSummary
    where
        W: AsyncWrite + Unpin + Send,
    {
        let Collection {
            handler,
            started,
            volumes,
            _permit,
        } = self;

        let total = volumes.len();
        let mut emitted = 0;
        let mut failed = 0;
        let mut aborted = false;

        {
            let mut results = std::pin::pin!(handler.collector.results(volumes));

            while let Some(outcome) = results.next().await {
                let result = match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        failed += 1;
                        continue;
                    }
                };

                if let Err(e) = writer.write_all(format_metric(&result).as_bytes()).await {
                    warn!("Failed to write metric for volume {}: {}", result.volume.name, e);
                    aborted = true;
                    break;
                }
                emitted += 1;
            }
        }

        if !aborted {
            if let Err(e) = writer.flush().await {
                warn!("Failed to flush metrics: {}", e);
                aborted = true;
            }
        }

        let elapsed = started.elapsed();
        handler.throttle.record_cost(elapsed);

        info!(
            "Collected {} of {} volumes ({} failed) in {} ms",
            emitted,
            total,
            failed,
            elapsed.as_millis()
        );

        CollectionSummary {
            volumes: total,
            emitted,
            failed,
            elapsed,
            aborted,
        }
    }
}
