//! Fronius Solar API Client
//!
//! This module provides a client for the REST "Solar API v1" exposed by Fronius
//! Symo inverters (and the Datamanager card inside them).
//!
//! # Architecture
//!
//! - **Transport**: one plain HTTP GET per sub-endpoint, no session or login
//! - **Authentication**: none on the device itself; static headers from the
//!   configuration are attached to every request (e.g. for a reverse proxy)
//! - **Timeout**: applied per request, so one slow sub-endpoint only fails itself
//!
//! # Example
//!
//! ```no_run
//! use fronius_exporter::symo::{ClientOptions, EnabledEndpoints, SymoClient};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = SymoClient::new(ClientOptions {
//!     url: "http://symo.local".to_string(),
//!     headers: Default::default(),
//!     timeout: Duration::from_secs(5),
//!     enabled: EnabledEndpoints::default(),
//! })?;
//!
//! let data = client.power_flow().await?;
//! println!("Current load: {} W", data.site.power_load);
//! # Ok(())
//! # }
//! ```

use crate::error::{ExporterError, Result};
use crate::symo::types::{
    decode_body, ArchiveData, InverterRealtimeData, MeterData, PowerFlowData,
};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Realtime power flow of the site and all inverters
pub const POWER_FLOW_PATH: &str = "/solar_api/v1/GetPowerFlowRealtimeData.fcgi";
/// DC string current and voltage of all inverters, needs `StartDate`/`EndDate`
pub const ARCHIVE_PATH: &str = "/solar_api/v1/GetArchiveData.cgi?Scope=System&Channel=Voltage_DC_String_1&Channel=Current_DC_String_1&Channel=Voltage_DC_String_2&Channel=Current_DC_String_2&HumanReadable=false";
/// Common realtime data of inverter 1
pub const INVERTER_REALTIME_PATH: &str =
    "/solar_api/v1/GetInverterRealtimeData.cgi?Scope=Device&DeviceId=1&DataCollection=CommonInverterData";
/// Realtime data of all smart meters
pub const METER_REALTIME_PATH: &str = "/solar_api/v1/GetMeterRealtimeData.cgi?Scope=System";

/// Length of the archive window requested per scrape.
pub const ARCHIVE_WINDOW_SECONDS: i64 = 300;

/// Device id queried by the inverter realtime endpoint.
pub const INVERTER_REALTIME_DEVICE_ID: &str = "1";

/// One of the Solar API endpoints the exporter can poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubEndpointKind {
    PowerFlow,
    Archive,
    InverterRealtime,
    MeterRealtime,
}

impl SubEndpointKind {
    pub const ALL: [SubEndpointKind; 4] = [
        SubEndpointKind::PowerFlow,
        SubEndpointKind::Archive,
        SubEndpointKind::InverterRealtime,
        SubEndpointKind::MeterRealtime,
    ];

    /// Path and fixed query of the endpoint, appended to the base URL.
    pub fn path(self) -> &'static str {
        match self {
            SubEndpointKind::PowerFlow => POWER_FLOW_PATH,
            SubEndpointKind::Archive => ARCHIVE_PATH,
            SubEndpointKind::InverterRealtime => INVERTER_REALTIME_PATH,
            SubEndpointKind::MeterRealtime => METER_REALTIME_PATH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubEndpointKind::PowerFlow => "power_flow",
            SubEndpointKind::Archive => "archive",
            SubEndpointKind::InverterRealtime => "inverter_realtime",
            SubEndpointKind::MeterRealtime => "meter",
        }
    }
}

impl fmt::Display for SubEndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which sub-endpoints are polled, fixed for the process lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnabledEndpoints {
    pub power_flow: bool,
    pub archive: bool,
    pub inverter_realtime: bool,
    pub meter: bool,
}

impl EnabledEndpoints {
    pub fn is_enabled(&self, kind: SubEndpointKind) -> bool {
        match kind {
            SubEndpointKind::PowerFlow => self.power_flow,
            SubEndpointKind::Archive => self.archive,
            SubEndpointKind::InverterRealtime => self.inverter_realtime,
            SubEndpointKind::MeterRealtime => self.meter,
        }
    }

    /// Enabled kinds in declaration order.
    pub fn kinds(&self) -> Vec<SubEndpointKind> {
        SubEndpointKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

/// Immutable settings of a [`SymoClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the device, e.g. `http://192.168.1.20`
    pub url: String,
    /// Headers sent with every request
    pub headers: HeaderMap,
    /// Timeout of each individual request
    pub timeout: Duration,
    pub enabled: EnabledEndpoints,
}

/// Decoded response of one sub-endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    PowerFlow(PowerFlowData),
    Archive(ArchiveData),
    InverterRealtime(InverterRealtimeData),
    MeterRealtime(MeterData),
}

impl Payload {
    pub fn kind(&self) -> SubEndpointKind {
        match self {
            Payload::PowerFlow(_) => SubEndpointKind::PowerFlow,
            Payload::Archive(_) => SubEndpointKind::Archive,
            Payload::InverterRealtime(_) => SubEndpointKind::InverterRealtime,
            Payload::MeterRealtime(_) => SubEndpointKind::MeterRealtime,
        }
    }
}

/// Time range sent to the archive endpoint
///
/// The window is the epoch-aligned 5 minute bucket (in UTC) that contains the
/// given instant, so every request within the same bucket asks for the same range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ArchiveWindow {
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let seconds_into_bucket = instant.timestamp().rem_euclid(ARCHIVE_WINDOW_SECONDS);
        let into_bucket = TimeDelta::seconds(seconds_into_bucket)
            + TimeDelta::nanoseconds(i64::from(instant.timestamp_subsec_nanos()));
        let start = instant - into_bucket;
        Self {
            start,
            end: start + TimeDelta::seconds(ARCHIVE_WINDOW_SECONDS),
        }
    }

    /// `StartDate` query value, RFC 3339 with a `Z` suffix.
    pub fn start_param(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// `EndDate` query value, RFC 3339 with a `Z` suffix.
    pub fn end_param(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Client for the Fronius Solar API
///
/// Holds a single `reqwest::Client` (connection pool, default headers and
/// timeout) and can be shared between tasks behind an `Arc`.
pub struct SymoClient {
    http: reqwest::Client,
    options: ClientOptions,
}

impl SymoClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(options.headers.clone())
            .timeout(options.timeout)
            .build()?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn enabled_kinds(&self) -> Vec<SubEndpointKind> {
        self.options.enabled.kinds()
    }

    /// Build the full request URL of `kind`, using `now` for the archive window.
    pub fn request_url(&self, kind: SubEndpointKind, now: DateTime<Utc>) -> Result<Url> {
        let raw = format!("{}{}", self.options.url.trim_end_matches('/'), kind.path());
        let mut url =
            Url::parse(&raw).map_err(|e| ExporterError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if kind == SubEndpointKind::Archive {
            let window = ArchiveWindow::containing(now);
            url.query_pairs_mut()
                .append_pair("StartDate", &window.start_param())
                .append_pair("EndDate", &window.end_param());
        }

        Ok(url)
    }

    /// Fetch and decode one sub-endpoint. A single attempt, no retry.
    pub async fn fetch(&self, kind: SubEndpointKind) -> Result<Payload> {
        match kind {
            SubEndpointKind::PowerFlow => self.power_flow().await.map(Payload::PowerFlow),
            SubEndpointKind::Archive => self.archive().await.map(Payload::Archive),
            SubEndpointKind::InverterRealtime => self
                .inverter_realtime()
                .await
                .map(Payload::InverterRealtime),
            SubEndpointKind::MeterRealtime => self.meter().await.map(Payload::MeterRealtime),
        }
    }

    pub async fn power_flow(&self) -> Result<PowerFlowData> {
        self.get(SubEndpointKind::PowerFlow).await
    }

    pub async fn archive(&self) -> Result<ArchiveData> {
        self.get(SubEndpointKind::Archive).await
    }

    pub async fn inverter_realtime(&self) -> Result<InverterRealtimeData> {
        self.get(SubEndpointKind::InverterRealtime).await
    }

    pub async fn meter(&self) -> Result<MeterData> {
        self.get(SubEndpointKind::MeterRealtime).await
    }

    /// Issue the GET and decode `Body.Data`
    ///
    /// Fails on transport errors, timeouts, non-2xx statuses and on a body
    /// that is not a JSON object. Anything below the envelope is decoded
    /// leniently (see [`crate::symo::types`]).
    async fn get<T>(&self, kind: SubEndpointKind) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.request_url(kind, Utc::now())?;
        debug!("Requesting {} data from {}", kind, url);

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        decode_body(&body)
    }
}
