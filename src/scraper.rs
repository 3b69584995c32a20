//! Scrape Orchestration
//!
//! One [`Scraper::collect_once`] call is one scrape cycle:
//!
//! 1. Spawn one task per enabled sub-endpoint, each doing a single GET
//! 2. Wait for all of them (each bounded by the client timeout, so the cycle
//!    takes about as long as the slowest fetch, not the sum)
//! 3. Map every successful payload into the registry, in completion order
//! 4. Count every failed fetch in `fronius_scrape_error_count`
//! 5. Record `fronius_up` and `fronius_scrape_duration_seconds`
//!
//! # Error Handling
//!
//! Failures are isolated per sub-endpoint and never surface to the caller. The
//! metrics of a failed sub-endpoint keep their previous values.
//!
//! If the cycle is dropped before it completes (e.g. the HTTP client gave up),
//! the pending fetches are aborted and nothing is recorded for them.

use crate::collectors::{
    self, collect_with_handler, CollectionContext, CollectionStatus, EnergyOffsets,
};
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use crate::symo::{SubEndpointKind, SymoClient};
use futures_util::future;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::debug;

pub struct Scraper {
    client: Arc<SymoClient>,
    metrics: MetricsCollector,
    offsets: EnergyOffsets,
    kinds: Vec<SubEndpointKind>,
}

impl Scraper {
    /// The set of polled sub-endpoints is taken from the client once, here.
    pub fn new(client: SymoClient, metrics: MetricsCollector, offsets: EnergyOffsets) -> Self {
        let kinds = client.enabled_kinds();
        Self {
            client: Arc::new(client),
            metrics,
            offsets,
            kinds,
        }
    }

    pub fn enabled_kinds(&self) -> &[SubEndpointKind] {
        &self.kinds
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub async fn collect_once(&self) {
        let start = Instant::now();
        debug!(
            url = %self.client.options().url,
            timeout = ?self.client.options().timeout,
            kinds = ?self.kinds,
            "Requesting data"
        );

        // Dropping the set aborts fetches still in flight
        let mut tasks = JoinSet::new();
        let mut kinds_by_task = HashMap::with_capacity(self.kinds.len());
        for &kind in &self.kinds {
            let client = Arc::clone(&self.client);
            let handle = tasks.spawn(async move { client.fetch(kind).await });
            kinds_by_task.insert(handle.id(), kind);
        }

        let ctx = CollectionContext {
            metrics: &self.metrics,
            offsets: self.offsets,
        };
        let mut any_success = false;

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, fetched) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => (e.id(), Err(ExporterError::Task(e.to_string()))),
            };
            let name = kinds_by_task
                .get(&id)
                .map_or("unknown", |kind| kind.as_str());

            let status = collect_with_handler(name, future::ready(fetched), |payload| {
                collectors::record(&ctx, &payload)
            })
            .await;

            match status {
                CollectionStatus::Success => any_success = true,
                CollectionStatus::Failed => self.metrics.scrape_error_count.inc(),
            }
        }

        self.metrics.up.set(if any_success { 1.0 } else { 0.0 });
        self.metrics
            .scrape_duration_seconds
            .set(start.elapsed().as_secs_f64());
    }
}
