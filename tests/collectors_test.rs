//! Collector tests: payload to metric mapping

mod common;

use common::{archive_json, assert_close, create_test_metrics, meter_json, power_flow_json};
use fronius_exporter::collectors::*;
use fronius_exporter::error::ExporterError;
use fronius_exporter::metrics::MetricsCollector;
use fronius_exporter::symo::types::*;
use fronius_exporter::symo::{Payload, SubEndpointKind};
use serde_json::{json, Value};

fn ctx(metrics: &MetricsCollector, offsets: EnergyOffsets) -> CollectionContext<'_> {
    CollectionContext { metrics, offsets }
}

fn decode<T>(value: Value) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    decode_body(value.to_string().as_bytes()).expect("Failed to decode body")
}

#[tokio::test]
async fn test_collect_with_handler_success() {
    // Given: A successful fetch returning data
    // When: The handler processes it
    let status = collect_with_handler(
        "test",
        async { Ok::<Vec<String>, ExporterError>(vec!["data".to_string()]) },
        |data| {
            assert_eq!(data.len(), 1);
            assert_eq!(data[0], "data");
        },
    )
    .await;

    // Then: Collection should succeed
    assert_eq!(status, CollectionStatus::Success);
}

#[tokio::test]
async fn test_collect_with_handler_error() {
    // Given: A fetch that fails
    // When: The handler processes the failure
    let status = collect_with_handler(
        "test",
        async { Err::<Vec<String>, ExporterError>(ExporterError::Task("boom".to_string())) },
        |_data| {
            panic!("Should not process data on error");
        },
    )
    .await;

    // Then: Collection should fail gracefully without panic
    assert_eq!(status, CollectionStatus::Failed);
}

#[test]
fn test_self_consumption_forced_to_one_without_production() {
    // Given: No photovoltaic production but a stale self consumption value
    let metrics = create_test_metrics();
    let data: PowerFlowData = decode(power_flow_json(json!(0), json!(0.42)));

    // When: Recording the power flow
    record_power_flow(&ctx(&metrics, EnergyOffsets::default()), &data);

    // Then: The ratio is 1, not 0.42 or 0.0042
    assert_eq!(metrics.site_selfconsumption_ratio.get(), 1.0);
}

#[test]
fn test_self_consumption_forced_to_one_when_pv_is_null() {
    let metrics = create_test_metrics();
    let data: PowerFlowData = decode(power_flow_json(Value::Null, Value::Null));

    record_power_flow(&ctx(&metrics, EnergyOffsets::default()), &data);

    assert_eq!(metrics.site_selfconsumption_ratio.get(), 1.0);
    assert_eq!(metrics.site_power_photovoltaic.get(), 0.0);
}

#[test]
fn test_self_consumption_scaled_with_production() {
    let metrics = create_test_metrics();
    let data: PowerFlowData = decode(power_flow_json(json!(2500), json!(42)));

    record_power_flow(&ctx(&metrics, EnergyOffsets::default()), &data);

    assert_close(metrics.site_selfconsumption_ratio.get(), 0.42);
    assert_eq!(metrics.site_power_photovoltaic.get(), 2500.0);
}

#[test]
fn test_power_flow_site_and_inverter_metrics() {
    let metrics = create_test_metrics();
    let data: PowerFlowData = decode(power_flow_json(json!(2500), json!(42)));

    record_power_flow(&ctx(&metrics, EnergyOffsets::default()), &data);

    assert_eq!(metrics.site_power_grid.get(), 611.4);
    assert_eq!(metrics.site_power_load.get(), -611.4);
    assert_eq!(metrics.site_power_accu.get(), 0.0);
    assert_eq!(metrics.site_autonomy_ratio.get(), 1.0);

    let energy = |frame: &str| {
        metrics
            .site_energy_consumption
            .with_label_values(&[frame])
            .get()
    };
    assert_eq!(energy("day"), 22997.0);
    assert_eq!(energy("year"), 3525577.75);
    assert_eq!(energy("total"), 43059100.0);

    assert_eq!(metrics.inverter_power.with_label_values(&["1"]).get(), 1200.0);
    assert_close(metrics.inverter_soc.with_label_values(&["1"]).get(), 0.55);
    assert_eq!(
        metrics
            .inverter_energy
            .with_label_values(&["1", "total"])
            .get(),
        43059100.0
    );
}

#[test]
fn test_archive_strips_inverter_prefix() {
    // Given: Archive data for "inverter/1"
    let metrics = create_test_metrics();
    let data: ArchiveData = decode(archive_json(13.0, 15.92, 425.6, 408.9));

    // When: Recording the archive
    record_archive(&ctx(&metrics, EnergyOffsets::default()), &data);

    // Then: Four series labeled with inverter "1"
    let current = |mppt: &str| {
        metrics
            .site_mppt_current_dc
            .with_label_values(&["1", mppt])
            .get()
    };
    let voltage = |mppt: &str| {
        metrics
            .site_mppt_voltage
            .with_label_values(&["1", mppt])
            .get()
    };
    assert_eq!(current("1"), 13.0);
    assert_eq!(current("2"), 15.92);
    assert_eq!(voltage("1"), 425.6);
    assert_eq!(voltage("2"), 408.9);

    let rendered = metrics.render().expect("Failed to render");
    assert!(rendered.contains("inverter=\"1\""));
    assert!(!rendered.contains("inverter/1"));
}

#[test]
fn test_inverter_label_without_prefix_is_kept() {
    assert_eq!(archive::inverter_label("inverter/1"), "1");
    assert_eq!(archive::inverter_label("inverter/12"), "12");
    assert_eq!(archive::inverter_label("meter/0"), "meter/0");
}

#[test]
fn test_inverter_realtime_metrics() {
    let metrics = create_test_metrics();
    let data: InverterRealtimeData = decode(common::inverter_realtime_json());

    record_inverter_realtime(&ctx(&metrics, EnergyOffsets::default()), &data);

    let current = |mppt: &str| {
        metrics
            .inverter_dc_current
            .with_label_values(&["1", mppt])
            .get()
    };
    assert_eq!(current("1"), 4.5);
    assert_eq!(current("2"), 3.25);
    assert_eq!(current("3"), 0.0);
    assert_eq!(current("4"), 0.0);
    assert_eq!(
        metrics
            .inverter_dc_voltage
            .with_label_values(&["1", "1"])
            .get(),
        512.3
    );
}

#[test]
fn test_meter_offsets_applied() {
    // Given: Offsets of +100 and -50
    let metrics = create_test_metrics();
    let data: MeterData = decode(meter_json(7654.32, 12345.67));
    let offsets = EnergyOffsets {
        consumed: 100.0,
        produced: -50.0,
    };

    // When: Recording the meter data
    record_meter(&ctx(&metrics, offsets), &data);

    // Then: Offsets are added to the raw counters
    assert_close(
        metrics
            .meter_energy_consumed_wh_total
            .with_label_values(&["0"])
            .get(),
        7754.32,
    );
    assert_close(
        metrics
            .meter_energy_produced_wh_total
            .with_label_values(&["0"])
            .get(),
        12295.67,
    );
    assert_eq!(
        metrics
            .meter_power_real_watts
            .with_label_values(&["0"])
            .get(),
        -1520.5
    );
}

#[test]
fn test_meter_zero_offset_is_identity() {
    let metrics = create_test_metrics();
    let data: MeterData = decode(meter_json(7654.32, 12345.67));

    record_meter(&ctx(&metrics, EnergyOffsets::default()), &data);

    assert_eq!(
        metrics
            .meter_energy_consumed_wh_total
            .with_label_values(&["0"])
            .get(),
        7654.32
    );
    assert_eq!(
        metrics
            .meter_energy_produced_wh_total
            .with_label_values(&["0"])
            .get(),
        12345.67
    );
}

#[test]
fn test_each_kind_only_touches_its_own_metrics() {
    // Given: One payload per kind, recorded into separate registries
    let payloads = vec![
        Payload::PowerFlow(decode(power_flow_json(json!(2500), json!(42)))),
        Payload::Archive(decode(archive_json(13.0, 15.92, 425.6, 408.9))),
        Payload::InverterRealtime(decode(common::inverter_realtime_json())),
        Payload::MeterRealtime(decode(meter_json(7654.32, 12345.67))),
    ];

    let owned = |kind: SubEndpointKind| -> &'static [&'static str] {
        match kind {
            SubEndpointKind::PowerFlow => &[
                "fronius_inverter_power{",
                "fronius_inverter_soc{",
                "fronius_inverter_energy{",
                "fronius_site_energy_consumption{",
            ],
            SubEndpointKind::Archive => &[
                "fronius_site_mppt_current_dc{",
                "fronius_site_mppt_voltage{",
            ],
            SubEndpointKind::InverterRealtime => &[
                "fronius_inverter_dc_current{",
                "fronius_inverter_dc_voltage{",
            ],
            SubEndpointKind::MeterRealtime => &[
                "fronius_meter_energy_consumed_wh_total{",
                "fronius_meter_energy_produced_wh_total{",
                "fronius_meter_power_real_watts{",
            ],
        }
    };

    for payload in &payloads {
        let metrics = create_test_metrics();
        record(&ctx(&metrics, EnergyOffsets::default()), payload);
        let rendered = metrics.render().expect("Failed to render");

        // Then: Only the payload's own labeled series exist
        for kind in SubEndpointKind::ALL {
            for series in owned(kind) {
                assert_eq!(
                    rendered.contains(series),
                    kind == payload.kind(),
                    "{} after recording {}",
                    series,
                    payload.kind()
                );
            }
        }

        // And the site gauges are only written by the power flow
        if payload.kind() != SubEndpointKind::PowerFlow {
            assert_eq!(metrics.site_power_load.get(), 0.0);
            assert_eq!(metrics.site_power_grid.get(), 0.0);
            assert_eq!(metrics.site_selfconsumption_ratio.get(), 0.0);
        }
        assert_eq!(metrics.scrape_error_count.get(), 0.0);
    }
}
