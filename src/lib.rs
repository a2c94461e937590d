//! Docker Volume Size Prometheus Exporter
//!
//! Answers Prometheus scrapes with the on-disk size of every Docker volume.
//!
//! # Overview
//!
//! Measuring volume sizes means walking whole directory trees, which can be very
//! expensive. Each scrape is therefore gated by a cost budget: the measured
//! duration of every collection is charged against a per-window limit, and scrapes
//! arriving while the budget is exhausted get an empty response instead of
//! triggering another walk.
//!
//! # Architecture
//!
//! ```text
//!                  ┌───────────────────────────── Exporter ────────────────────────────┐
//! ┌────────────┐   │ ┌─────────┐   ┌──────────┐   ┌───────────┐   ┌────────┐           │
//! │ Prometheus │ ──┼►│ Handler │ ─►│ Throttle │   │ Collector │ ─►│ du -bs │ × N       │
//! └────────────┘   │ └─────────┘   └──────────┘   └───────────┘   └────────┘           │
//!    /metrics      │      │                             ▲                               │
//!                  │      └──── Docker API (/volumes) ──┘                               │
//!                  └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`throttle`] - Cost budget admission control
//! - [`collector`] - Bounded-concurrency size probing
//! - [`probe`] - External size command adapter
//! - [`format`] - Metric line rendering
//! - [`handler`] - Per-scrape orchestration
//! - [`docker`] - Volume enumeration via the Docker Engine API
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use docker_volume_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod docker;
pub mod error;
pub mod format;
pub mod handler;
pub mod probe;
pub mod server;
pub mod throttle;
