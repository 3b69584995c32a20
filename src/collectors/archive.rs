//! Archive Metrics Collector
//!
//! Maps `GetArchiveData` DC string channels onto MPPT metrics.
//!
//! # Metrics Produced
//! - `fronius_site_mppt_current_dc` - DC current per string in A
//!   - Labels: inverter, mppt
//! - `fronius_site_mppt_voltage` - DC voltage per string in V
//!   - Labels: inverter, mppt

use super::CollectionContext;
use crate::symo::types::ArchiveData;
use tracing::debug;

/// Archive device keys look like `inverter/1`; the label is the id alone.
pub fn inverter_label(device_key: &str) -> &str {
    device_key
        .strip_prefix("inverter/")
        .unwrap_or(device_key)
}

pub fn record_archive(ctx: &CollectionContext<'_>, data: &ArchiveData) {
    debug!("Parsing archive data: {:?}", data);
    let metrics = ctx.metrics;

    for (key, archive) in &data.devices {
        let inverter = inverter_label(key);
        let channels = &archive.data;

        metrics.set_gauge(
            &metrics.site_mppt_current_dc,
            &[inverter, "1"],
            channels.current_dc_string_1.first_value(),
        );
        metrics.set_gauge(
            &metrics.site_mppt_current_dc,
            &[inverter, "2"],
            channels.current_dc_string_2.first_value(),
        );
        metrics.set_gauge(
            &metrics.site_mppt_voltage,
            &[inverter, "1"],
            channels.voltage_dc_string_1.first_value(),
        );
        metrics.set_gauge(
            &metrics.site_mppt_voltage,
            &[inverter, "2"],
            channels.voltage_dc_string_2.first_value(),
        );
    }
}
