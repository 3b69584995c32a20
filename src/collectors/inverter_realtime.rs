//! Inverter Realtime Metrics Collector
//!
//! # Metrics Produced
//! - `fronius_inverter_dc_current` - Labels: inverter, mppt (1-4)
//! - `fronius_inverter_dc_voltage` - Labels: inverter, mppt (1-4)

use super::CollectionContext;
use crate::symo::client::INVERTER_REALTIME_DEVICE_ID;
use crate::symo::types::InverterRealtimeData;
use tracing::debug;

const MPPT_INPUTS: [&str; 4] = ["1", "2", "3", "4"];

pub fn record_inverter_realtime(ctx: &CollectionContext<'_>, data: &InverterRealtimeData) {
    debug!("Parsing inverter realtime data: {:?}", data);
    let metrics = ctx.metrics;

    for (mppt, current) in MPPT_INPUTS.into_iter().zip(data.currents()) {
        metrics.set_gauge(
            &metrics.inverter_dc_current,
            &[INVERTER_REALTIME_DEVICE_ID, mppt],
            current,
        );
    }
    for (mppt, voltage) in MPPT_INPUTS.into_iter().zip(data.voltages()) {
        metrics.set_gauge(
            &metrics.inverter_dc_voltage,
            &[INVERTER_REALTIME_DEVICE_ID, mppt],
            voltage,
        );
    }
}
