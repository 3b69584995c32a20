//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the Fronius exporter.
//! The registry is created once at startup and shared (by `Clone`, backed by
//! `Arc`) between the scraper, which writes, and the HTTP handler, which renders.
//!
//! # Metric Categories
//!
//! ## Scrape
//! - Duration of the last scrape, failed sub-endpoint fetches, device reachability
//!
//! ## Power Flow
//! - Site power (load, grid, accumulator, photovoltaic) and ratios
//! - Produced energy by time frame
//! - Per-inverter power, battery charge and energy
//!
//! ## Archive
//! - DC current and voltage per inverter and MPPT string
//!
//! ## Inverter Realtime
//! - DC current and voltage per MPPT input of inverter 1
//!
//! ## Smart Meter
//! - Consumed/produced energy counters (with configured offsets) and real power
//!
//! Each metric is written by exactly one sub-endpoint. A metric keeps its
//! last value when the fetch of its sub-endpoint fails.
//!
//! All metrics use the `fronius_` namespace prefix. When a site name is
//! configured it is attached to every series as the constant label `site`.

use prometheus::{Counter, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::Arc;

const NAMESPACE: &str = "fronius";

/// Metrics collector for a Fronius Symo site
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Scrape metrics
    pub scrape_duration_seconds: Arc<Gauge>,
    pub scrape_error_count: Arc<Counter>,
    pub up: Arc<Gauge>,

    // Power flow: inverters
    pub inverter_power: Arc<GaugeVec>,
    pub inverter_soc: Arc<GaugeVec>,
    pub inverter_energy: Arc<GaugeVec>,

    // Power flow: site
    pub site_power_load: Arc<Gauge>,
    pub site_power_grid: Arc<Gauge>,
    pub site_power_accu: Arc<Gauge>,
    pub site_power_photovoltaic: Arc<Gauge>,
    pub site_autonomy_ratio: Arc<Gauge>,
    pub site_selfconsumption_ratio: Arc<Gauge>,
    pub site_energy_consumption: Arc<GaugeVec>,

    // Archive
    pub site_mppt_voltage: Arc<GaugeVec>,
    pub site_mppt_current_dc: Arc<GaugeVec>,

    // Inverter realtime
    pub inverter_dc_voltage: Arc<GaugeVec>,
    pub inverter_dc_current: Arc<GaugeVec>,

    // Smart meter
    pub meter_energy_consumed_wh_total: Arc<GaugeVec>,
    pub meter_energy_produced_wh_total: Arc<GaugeVec>,
    pub meter_power_real_watts: Arc<GaugeVec>,
}

fn gauge(name: &str, help: &str) -> prometheus::Result<Gauge> {
    Gauge::with_opts(Opts::new(name, help).namespace(NAMESPACE))
}

fn gauge_vec(name: &str, help: &str, labels: &[&str]) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        Self::build(Registry::new())
    }

    /// Create a collector whose series all carry `site="<site>"`.
    ///
    /// An empty site name adds no label.
    pub fn with_site(site: &str) -> anyhow::Result<Self> {
        if site.is_empty() {
            return Self::new();
        }
        let labels = HashMap::from([("site".to_string(), site.to_string())]);
        Self::build(Registry::new_custom(None, Some(labels))?)
    }

    fn build(registry: Registry) -> anyhow::Result<Self> {
        // Scrape metrics
        let scrape_duration_seconds = gauge(
            "scrape_duration_seconds",
            "Time it took to scrape the device in seconds",
        )?;

        let scrape_error_count = Counter::with_opts(
            Opts::new("scrape_error_count", "Number of scrape errors").namespace(NAMESPACE),
        )?;

        let up = gauge(
            "up",
            "Whether the last scrape reached the device (1=up, 0=down)",
        )?;

        // Power flow: inverters
        let inverter_power = gauge_vec(
            "inverter_power",
            "Power flow of the inverter in Watt",
            &["inverter"],
        )?;

        let inverter_soc = gauge_vec(
            "inverter_soc",
            "State of charge of the battery attached to the inverter as ratio",
            &["inverter"],
        )?;

        let inverter_energy = gauge_vec(
            "inverter_energy",
            "Energy produced by the inverter in Wh",
            &["inverter", "time_frame"],
        )?;

        // Power flow: site
        let site_power_load = gauge("site_power_load", "Site power load in Watt")?;

        let site_power_grid = gauge(
            "site_power_grid",
            "Site power supplied to or provided from the grid in Watt",
        )?;

        let site_power_accu = gauge(
            "site_power_accu",
            "Site power supplied to or provided from the accumulator(s) in Watt",
        )?;

        let site_power_photovoltaic = gauge(
            "site_power_photovoltaic",
            "Site power from photovoltaic in Watt",
        )?;

        let site_autonomy_ratio = gauge(
            "site_autonomy_ratio",
            "Relative autonomy ratio of the site",
        )?;

        let site_selfconsumption_ratio = gauge(
            "site_selfconsumption_ratio",
            "Relative self consumption ratio of the site",
        )?;

        let site_energy_consumption = gauge_vec(
            "site_energy_consumption",
            "Energy produced by the site in Wh",
            &["time_frame"],
        )?;

        // Archive
        let site_mppt_voltage = gauge_vec(
            "site_mppt_voltage",
            "Site mppt voltage in V",
            &["inverter", "mppt"],
        )?;

        let site_mppt_current_dc = gauge_vec(
            "site_mppt_current_dc",
            "Site mppt current DC in A",
            &["inverter", "mppt"],
        )?;

        // Inverter realtime
        let inverter_dc_voltage = gauge_vec(
            "inverter_dc_voltage",
            "Realtime DC voltage of the inverter input in V",
            &["inverter", "mppt"],
        )?;

        let inverter_dc_current = gauge_vec(
            "inverter_dc_current",
            "Realtime DC current of the inverter input in A",
            &["inverter", "mppt"],
        )?;

        // Smart meter
        let meter_energy_consumed_wh_total = gauge_vec(
            "meter_energy_consumed_wh_total",
            "Meter consumed energy from grid in Wh",
            &["device"],
        )?;

        let meter_energy_produced_wh_total = gauge_vec(
            "meter_energy_produced_wh_total",
            "Meter produced energy to grid in Wh",
            &["device"],
        )?;

        let meter_power_real_watts = gauge_vec(
            "meter_power_real_watts",
            "Meter real power summed over all phases in Watt",
            &["device"],
        )?;

        // Register all metrics
        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(scrape_error_count.clone()))?;
        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(inverter_power.clone()))?;
        registry.register(Box::new(inverter_soc.clone()))?;
        registry.register(Box::new(inverter_energy.clone()))?;
        registry.register(Box::new(site_power_load.clone()))?;
        registry.register(Box::new(site_power_grid.clone()))?;
        registry.register(Box::new(site_power_accu.clone()))?;
        registry.register(Box::new(site_power_photovoltaic.clone()))?;
        registry.register(Box::new(site_autonomy_ratio.clone()))?;
        registry.register(Box::new(site_selfconsumption_ratio.clone()))?;
        registry.register(Box::new(site_energy_consumption.clone()))?;
        registry.register(Box::new(site_mppt_voltage.clone()))?;
        registry.register(Box::new(site_mppt_current_dc.clone()))?;
        registry.register(Box::new(inverter_dc_voltage.clone()))?;
        registry.register(Box::new(inverter_dc_current.clone()))?;
        registry.register(Box::new(meter_energy_consumed_wh_total.clone()))?;
        registry.register(Box::new(meter_energy_produced_wh_total.clone()))?;
        registry.register(Box::new(meter_power_real_watts.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            scrape_duration_seconds: Arc::new(scrape_duration_seconds),
            scrape_error_count: Arc::new(scrape_error_count),
            up: Arc::new(up),
            inverter_power: Arc::new(inverter_power),
            inverter_soc: Arc::new(inverter_soc),
            inverter_energy: Arc::new(inverter_energy),
            site_power_load: Arc::new(site_power_load),
            site_power_grid: Arc::new(site_power_grid),
            site_power_accu: Arc::new(site_power_accu),
            site_power_photovoltaic: Arc::new(site_power_photovoltaic),
            site_autonomy_ratio: Arc::new(site_autonomy_ratio),
            site_selfconsumption_ratio: Arc::new(site_selfconsumption_ratio),
            site_energy_consumption: Arc::new(site_energy_consumption),
            site_mppt_voltage: Arc::new(site_mppt_voltage),
            site_mppt_current_dc: Arc::new(site_mppt_current_dc),
            inverter_dc_voltage: Arc::new(inverter_dc_voltage),
            inverter_dc_current: Arc::new(inverter_dc_current),
            meter_energy_consumed_wh_total: Arc::new(meter_energy_consumed_wh_total),
            meter_energy_produced_wh_total: Arc::new(meter_energy_produced_wh_total),
            meter_power_real_watts: Arc::new(meter_power_real_watts),
        })
    }

    /// Set one labeled series of a gauge vector
    pub fn set_gauge(&self, gauge: &GaugeVec, labels: &[&str], value: f64) {
        gauge.with_label_values(labels).set(value);
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
