//! Fronius Solar API Type Definitions
//!
//! Rust models of the JSON documents returned by the Solar API v1. Every
//! response shares the envelope `{"Head": {...}, "Body": {"Data": ...}}`; only
//! `Body.Data` is decoded, its shape depends on the sub-endpoint.
//!
//! # Design Notes
//!
//! - **Lenient below the root**: the device reports `null` for values it cannot
//!   measure (e.g. `P_PV` at night) and firmware versions differ in which fields
//!   they send. Every field therefore goes through `lenient`, which falls back
//!   to the type's default (0 for numbers, empty for maps) instead of failing.
//! - **Strict at the root**: a document that is not a JSON object fails the
//!   whole decode.
//! - **Completeness**: units and mode strings are decoded even though no metric
//!   is derived from them; they show up in debug logs.
//!
//! # API Endpoints Covered
//!
//! - `GetPowerFlowRealtimeData.fcgi` → [`PowerFlowData`], [`Site`], [`Inverter`]
//! - `GetArchiveData.cgi` → [`ArchiveData`], [`InverterArchive`], [`Channel`]
//! - `GetInverterRealtimeData.cgi` → [`InverterRealtimeData`], [`RealtimeValue`]
//! - `GetMeterRealtimeData.cgi` → [`MeterData`], [`MeterReading`]

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Deserialize any value, falling back to `T::default()` if it does not fit.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Like `lenient`, but per map entry: one malformed entry does not drop its siblings.
pub(crate) fn lenient_map<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let entries: HashMap<String, Value> = lenient(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, serde_json::from_value(value).unwrap_or_default()))
        .collect())
}

/// Solar API response envelope
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned + Default"))]
struct Envelope<T> {
    #[serde(rename = "Body", default, deserialize_with = "lenient")]
    body: Body<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned + Default"))]
struct Body<T> {
    #[serde(rename = "Data", default, deserialize_with = "lenient")]
    data: T,
}

/// Decode `Body.Data` of a Solar API response
///
/// Fails only if `body` is not a JSON object; everything inside is lenient.
pub fn decode_body<T>(body: &[u8]) -> crate::error::Result<T>
where
    T: DeserializeOwned + Default,
{
    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    Ok(envelope.body.data)
}

/// Realtime power flow of the whole site
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PowerFlowData {
    #[serde(rename = "Site", default, deserialize_with = "lenient")]
    pub site: Site,
    #[serde(rename = "Inverters", default, deserialize_with = "lenient_map")]
    pub inverters: HashMap<String, Inverter>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Site {
    #[serde(rename = "Mode", default, deserialize_with = "lenient")]
    pub mode: String,
    #[serde(rename = "Meter_Location", default, deserialize_with = "lenient")]
    pub meter_location: String,
    /// Power exchanged with the grid in W. Negative when feeding in.
    #[serde(rename = "P_Grid", default, deserialize_with = "lenient")]
    pub power_grid: f64,
    /// Current load in W.
    #[serde(rename = "P_Load", default, deserialize_with = "lenient")]
    pub power_load: f64,
    /// Power from or to the accumulator in W.
    #[serde(rename = "P_Akku", default, deserialize_with = "lenient")]
    pub power_accu: f64,
    /// Photovoltaic production in W. The device sends `null` when idle.
    #[serde(rename = "P_PV", default, deserialize_with = "lenient")]
    pub power_photovoltaic: f64,
    /// Share of the production consumed on site, 0-100.
    #[serde(rename = "rel_SelfConsumption", default, deserialize_with = "lenient")]
    pub relative_self_consumption: f64,
    /// Share of the load covered by the site itself, 0-100.
    #[serde(rename = "rel_Autonomy", default, deserialize_with = "lenient")]
    pub relative_autonomy: f64,
    /// Energy produced today in Wh, reset at midnight device time.
    #[serde(rename = "E_Day", default, deserialize_with = "lenient")]
    pub energy_day: f64,
    /// Energy produced this year in Wh.
    #[serde(rename = "E_Year", default, deserialize_with = "lenient")]
    pub energy_year: f64,
    /// Energy produced since installation in Wh.
    #[serde(rename = "E_Total", default, deserialize_with = "lenient")]
    pub energy_total: f64,
}

/// One inverter as listed in the power flow
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Inverter {
    #[serde(rename = "DT", default, deserialize_with = "lenient")]
    pub device_type: f64,
    #[serde(rename = "P", default, deserialize_with = "lenient")]
    pub power: f64,
    /// Battery state of charge, 0-100.
    #[serde(rename = "SOC", default, deserialize_with = "lenient")]
    pub battery_soc: f64,
    #[serde(rename = "E_Day", default, deserialize_with = "lenient")]
    pub energy_day: f64,
    #[serde(rename = "E_Year", default, deserialize_with = "lenient")]
    pub energy_year: f64,
    #[serde(rename = "E_Total", default, deserialize_with = "lenient")]
    pub energy_total: f64,
}

/// Archive data keyed by device, e.g. `inverter/1`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveData {
    pub devices: HashMap<String, InverterArchive>,
}

impl<'de> Deserialize<'de> for ArchiveData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_map(deserializer).map(|devices| Self { devices })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InverterArchive {
    #[serde(rename = "Data", default, deserialize_with = "lenient")]
    pub data: ArchiveChannels,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArchiveChannels {
    #[serde(rename = "Current_DC_String_1", default, deserialize_with = "lenient")]
    pub current_dc_string_1: Channel,
    #[serde(rename = "Current_DC_String_2", default, deserialize_with = "lenient")]
    pub current_dc_string_2: Channel,
    #[serde(rename = "Voltage_DC_String_1", default, deserialize_with = "lenient")]
    pub voltage_dc_string_1: Channel,
    #[serde(rename = "Voltage_DC_String_2", default, deserialize_with = "lenient")]
    pub voltage_dc_string_2: Channel,
}

/// Time-indexed samples of one archive channel
///
/// `Values` is keyed by the offset in seconds from `StartDate`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Channel {
    #[serde(rename = "Unit", default, deserialize_with = "lenient")]
    pub unit: String,
    #[serde(rename = "Values", default, deserialize_with = "lenient_map")]
    pub values: HashMap<String, f64>,
}

impl Channel {
    /// Sample at the start of the window, 0 if the device sent none.
    pub fn first_value(&self) -> f64 {
        self.values.get("0").copied().unwrap_or_default()
    }
}

/// DC side readings of a single inverter
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InverterRealtimeData {
    #[serde(rename = "IDC", default, deserialize_with = "lenient")]
    pub idc_1: RealtimeValue,
    #[serde(rename = "IDC_2", default, deserialize_with = "lenient")]
    pub idc_2: RealtimeValue,
    #[serde(rename = "IDC_3", default, deserialize_with = "lenient")]
    pub idc_3: RealtimeValue,
    #[serde(rename = "IDC_4", default, deserialize_with = "lenient")]
    pub idc_4: RealtimeValue,
    #[serde(rename = "UDC", default, deserialize_with = "lenient")]
    pub udc_1: RealtimeValue,
    #[serde(rename = "UDC_2", default, deserialize_with = "lenient")]
    pub udc_2: RealtimeValue,
    #[serde(rename = "UDC_3", default, deserialize_with = "lenient")]
    pub udc_3: RealtimeValue,
    #[serde(rename = "UDC_4", default, deserialize_with = "lenient")]
    pub udc_4: RealtimeValue,
}

impl InverterRealtimeData {
    /// DC currents per MPPT input, in input order.
    pub fn currents(&self) -> [f64; 4] {
        [
            self.idc_1.value,
            self.idc_2.value,
            self.idc_3.value,
            self.idc_4.value,
        ]
    }

    /// DC voltages per MPPT input, in input order.
    pub fn voltages(&self) -> [f64; 4] {
        [
            self.udc_1.value,
            self.udc_2.value,
            self.udc_3.value,
            self.udc_4.value,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RealtimeValue {
    #[serde(rename = "Unit", default, deserialize_with = "lenient")]
    pub unit: String,
    #[serde(rename = "Value", default, deserialize_with = "lenient")]
    pub value: f64,
}

/// Smart meter readings keyed by meter device id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterData {
    pub meters: HashMap<String, MeterReading>,
}

impl<'de> Deserialize<'de> for MeterData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_map(deserializer).map(|meters| Self { meters })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MeterReading {
    /// Energy drawn from the grid in Wh.
    #[serde(
        rename = "EnergyReal_WAC_Sum_Consumed",
        default,
        deserialize_with = "lenient"
    )]
    pub energy_real_sum_consumed: f64,
    /// Energy fed into the grid in Wh.
    #[serde(
        rename = "EnergyReal_WAC_Sum_Produced",
        default,
        deserialize_with = "lenient"
    )]
    pub energy_real_sum_produced: f64,
    #[serde(rename = "PowerReal_P_Sum", default, deserialize_with = "lenient")]
    pub power_real_sum: f64,
}
