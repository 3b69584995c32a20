//! Metrics Collectors
//!
//! This module maps decoded Solar API payloads onto Prometheus metrics. There is
//! one mapping function per sub-endpoint; each writes only the metrics owned by
//! its sub-endpoint.
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Accept a `CollectionContext` containing shared state
//! - Take an already decoded payload (fetching is done by the scraper)
//! - Update Prometheus metrics, overwriting the previous values
//!
//! # Error Handling
//!
//! Failed fetches never reach a mapping function. [`collect_with_handler`] logs
//! them as warnings and reports `CollectionStatus::Failed`, leaving the metrics
//! of that sub-endpoint at their last successful value.

use crate::metrics::MetricsCollector;
use crate::symo::Payload;
use tracing::{info, warn};

/// Shared context passed to all collectors
///
/// This struct uses public fields for ergonomic access patterns.
/// All fields are immutable, so no invariants can be violated.
#[derive(Clone, Copy)]
pub struct CollectionContext<'a> {
    /// Metrics collector for updating Prometheus metrics
    pub metrics: &'a MetricsCollector,
    /// Calibration offsets added to the smart meter energy counters
    pub offsets: EnergyOffsets,
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Metrics were successfully collected and updated
    Success,
    /// Collection failed (already logged as warning), metrics left untouched
    Failed,
}

/// Await a fetch and hand its result to `process`
///
/// - On success: processes data, logs success, returns `CollectionStatus::Success`
/// - On error: logs warning, returns `CollectionStatus::Failed` without calling `process`
///
/// # Examples
///
/// ```no_run
/// # use fronius_exporter::collectors::*;
/// # use fronius_exporter::symo::SymoClient;
/// async fn example(client: &SymoClient, ctx: &CollectionContext<'_>) -> CollectionStatus {
///     collect_with_handler("power_flow", client.power_flow(), |data| {
///         record_power_flow(ctx, &data)
///     })
///     .await
/// }
/// ```
pub async fn collect_with_handler<T, F, P, E>(
    name: &str,
    query_future: F,
    process: P,
) -> CollectionStatus
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: FnOnce(T),
{
    match query_future.await {
        Ok(data) => {
            process(data);
            info!("Updated {} metrics", name);
            CollectionStatus::Success
        }
        Err(e) => {
            warn!("Failed to query {}: {}", name, e);
            CollectionStatus::Failed
        }
    }
}

/// Write a payload into the metrics owned by its sub-endpoint
pub fn record(ctx: &CollectionContext<'_>, payload: &Payload) {
    match payload {
        Payload::PowerFlow(data) => record_power_flow(ctx, data),
        Payload::Archive(data) => record_archive(ctx, data),
        Payload::InverterRealtime(data) => record_inverter_realtime(ctx, data),
        Payload::MeterRealtime(data) => record_meter(ctx, data),
    }
}

// Collector modules
pub mod archive;
pub mod inverter_realtime;
pub mod meter;
pub mod power_flow;

// Re-export collector functions for convenient access
pub use archive::record_archive;
pub use inverter_realtime::record_inverter_realtime;
pub use meter::{record_meter, EnergyOffsets};
pub use power_flow::record_power_flow;
