//! Power Flow Metrics Collector
//!
//! Maps `GetPowerFlowRealtimeData` onto site and inverter metrics.
//!
//! # Metrics Produced
//! - `fronius_site_power_load`, `fronius_site_power_grid`,
//!   `fronius_site_power_accu`, `fronius_site_power_photovoltaic` - Power in W
//! - `fronius_site_autonomy_ratio` - `rel_Autonomy / 100`
//! - `fronius_site_selfconsumption_ratio` - `rel_SelfConsumption / 100`, or 1
//!   while the photovoltaic power is 0
//! - `fronius_site_energy_consumption` - Produced energy in Wh
//!   - Labels: time_frame (day, year, total)
//! - `fronius_inverter_power` - Labels: inverter
//! - `fronius_inverter_soc` - `SOC / 100`, Labels: inverter
//! - `fronius_inverter_energy` - Labels: inverter, time_frame

use super::CollectionContext;
use crate::symo::types::{PowerFlowData, Site};
use tracing::debug;

/// Self consumption as a ratio
///
/// The device reports 0 (or `null`) while nothing is produced, which would read
/// as "everything exported". Without production all of it is consumed on site.
pub fn self_consumption_ratio(site: &Site) -> f64 {
    if site.power_photovoltaic == 0.0 {
        1.0
    } else {
        site.relative_self_consumption / 100.0
    }
}

pub fn record_power_flow(ctx: &CollectionContext<'_>, data: &PowerFlowData) {
    debug!("Parsing power flow data: {:?}", data);
    let metrics = ctx.metrics;

    for (id, inverter) in &data.inverters {
        let id = id.as_str();
        metrics.set_gauge(&metrics.inverter_power, &[id], inverter.power);
        metrics.set_gauge(&metrics.inverter_soc, &[id], inverter.battery_soc / 100.0);
        metrics.set_gauge(&metrics.inverter_energy, &[id, "day"], inverter.energy_day);
        metrics.set_gauge(&metrics.inverter_energy, &[id, "year"], inverter.energy_year);
        metrics.set_gauge(&metrics.inverter_energy, &[id, "total"], inverter.energy_total);
    }

    let site = &data.site;
    metrics.site_power_accu.set(site.power_accu);
    metrics.site_power_grid.set(site.power_grid);
    metrics.site_power_load.set(site.power_load);
    metrics.site_power_photovoltaic.set(site.power_photovoltaic);

    metrics.set_gauge(&metrics.site_energy_consumption, &["day"], site.energy_day);
    metrics.set_gauge(&metrics.site_energy_consumption, &["year"], site.energy_year);
    metrics.set_gauge(&metrics.site_energy_consumption, &["total"], site.energy_total);

    metrics
        .site_autonomy_ratio
        .set(site.relative_autonomy / 100.0);
    metrics
        .site_selfconsumption_ratio
        .set(self_consumption_ratio(site));
}
