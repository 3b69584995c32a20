//! Fronius Symo Prometheus Exporter
//!
//! A Prometheus metrics exporter for Fronius Symo inverters and their smart meters.
//!
//! # Overview
//!
//! On every scrape the exporter polls the device's Solar API v1 over HTTP,
//! fetching each enabled sub-endpoint concurrently, and republishes the values as
//! Prometheus gauges and counters.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     HTTP GET × N     ┌──────────────┐
//! │  Fronius    │ ◄─────────────────►  │   Exporter   │
//! │   Symo      │   Solar API (JSON)   │              │
//! └─────────────┘                      │  ┌────────┐  │      HTTP      ┌────────────┐
//!                                      │  │Scraper │  │ ◄────────────► │ Prometheus │
//!                                      │  └────────┘  │   /metrics     └────────────┘
//!                                      │  ┌────────┐  │
//!                                      │  │Metrics │  │
//!                                      │  └────────┘  │
//!                                      └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`symo`] - Solar API client and payload types
//! - [`collectors`] - Mapping of payloads onto metrics
//! - [`metrics`] - Prometheus metric definitions
//! - [`scraper`] - Concurrent fan-out of one scrape cycle
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use fronius_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     config.validate()?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - ✅ Site power flow, autonomy and self consumption
//! - ✅ Per-inverter power, battery charge and energy
//! - ✅ DC string current and voltage (archive and realtime)
//! - ✅ Smart meter energy counters with calibration offsets
//! - ✅ Partial failures keep the last known values

pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scraper;
pub mod server;
pub mod symo;
