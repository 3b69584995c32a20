//! Smart Meter Metrics Collector
//!
//! Collects the grid energy counters of every smart meter.
//!
//! # Metrics Produced
//! - `fronius_meter_energy_consumed_wh_total` - Energy drawn from the grid in Wh,
//!   plus the configured consumed offset
//!   - Labels: device
//! - `fronius_meter_energy_produced_wh_total` - Energy fed into the grid in Wh,
//!   plus the configured produced offset
//!   - Labels: device
//! - `fronius_meter_power_real_watts` - Labels: device

use super::CollectionContext;
use crate::symo::types::MeterData;
use tracing::debug;

/// Constant corrections added to the meter energy counters
///
/// Used to line the exported counters up with a reference meter when the
/// device's own counter is known to be off by a fixed amount.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyOffsets {
    pub consumed: f64,
    pub produced: f64,
}

pub fn record_meter(ctx: &CollectionContext<'_>, data: &MeterData) {
    debug!("Parsing meter data: {:?}", data);
    let metrics = ctx.metrics;

    for (device, meter) in &data.meters {
        let device = device.as_str();
        metrics.set_gauge(
            &metrics.meter_energy_consumed_wh_total,
            &[device],
            meter.energy_real_sum_consumed + ctx.offsets.consumed,
        );
        metrics.set_gauge(
            &metrics.meter_energy_produced_wh_total,
            &[device],
            meter.energy_real_sum_produced + ctx.offsets.produced,
        );
        metrics.set_gauge(
            &metrics.meter_power_real_watts,
            &[device],
            meter.power_real_sum,
        );
    }
}
