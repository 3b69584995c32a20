use crate::collectors::EnergyOffsets;
use crate::error::{ExporterError, Result as ExporterResult};
use crate::symo::{ClientOptions, EnabledEndpoints};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub symo: SymoConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SymoConfig {
    /// Base URL of the device, without the `/solar_api` path
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// `key=value` headers sent with every request
    #[serde(default)]
    pub headers: Vec<SecretString>,
    /// Value of the constant `site` label, defaults to the host of `url`
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub offset_consumed: f64,
    #[serde(default)]
    pub offset_produced: f64,
    #[serde(default = "default_true")]
    pub power_flow_enabled: bool,
    #[serde(default = "default_true")]
    pub archive_enabled: bool,
    #[serde(default)]
    pub inverter_realtime_enabled: bool,
    #[serde(default)]
    pub meter_enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_url() -> String {
    "http://symo.ip.or.hostname".to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for SymoConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: default_timeout(),
            headers: Vec::new(),
            site: None,
            offset_consumed: 0.0,
            offset_produced: 0.0,
            power_flow_enabled: true,
            archive_enabled: true,
            inverter_realtime_enabled: false,
            meter_enabled: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

/// `FRONIUS_EXPORTER__<SECTION>__<KEY>` variables
///
/// `FRONIUS_EXPORTER__SYMO__HEADERS` holds comma separated `key=value` pairs.
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("FRONIUS_EXPORTER")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("symo.headers")
        .try_parsing(true)
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        Self::load_with(path, environment())
    }

    /// Load `path` layered under the given environment source
    pub fn load_with(path: &str, environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(environment)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject configurations the exporter cannot run with
    pub fn validate(&self) -> ExporterResult<()> {
        let symo = &self.symo;

        if symo.enabled_endpoints().kinds().is_empty() {
            return Err(ExporterError::Config(
                "all sub-endpoints are disabled, enable at least one".to_string(),
            ));
        }

        if symo.timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "symo.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        let url = Url::parse(&symo.url).map_err(|e| {
            ExporterError::Config(format!("invalid symo.url '{}': {}", symo.url, e))
        })?;
        if url.host_str().is_none() {
            return Err(ExporterError::Config(format!(
                "symo.url '{}' has no host",
                symo.url
            )));
        }

        Ok(())
    }
}

impl SymoConfig {
    pub fn enabled_endpoints(&self) -> EnabledEndpoints {
        EnabledEndpoints {
            power_flow: self.power_flow_enabled,
            archive: self.archive_enabled,
            inverter_realtime: self.inverter_realtime_enabled,
            meter: self.meter_enabled,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn offsets(&self) -> EnergyOffsets {
        EnergyOffsets {
            consumed: self.offset_consumed,
            produced: self.offset_produced,
        }
    }

    /// Configured site name, or `host[:port]` of the device URL, or empty.
    pub fn site_name(&self) -> String {
        if let Some(site) = self.site.as_deref().filter(|s| !s.is_empty()) {
            return site.to_string();
        }
        let Ok(url) = Url::parse(&self.url) else {
            return String::new();
        };
        match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        }
    }

    /// Parse the configured headers, skipping malformed entries with a warning
    pub fn header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for entry in &self.headers {
            match parse_header(entry.expose_secret()) {
                Ok((name, value)) => {
                    debug!("Using header {}", name);
                    headers.insert(name, value);
                }
                Err(e) => warn!("Could not parse header, ignoring: {}", e),
            }
        }
        headers
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            url: self.url.clone(),
            headers: self.header_map(),
            timeout: self.timeout(),
            enabled: self.enabled_endpoints(),
        }
    }
}

/// Parse a `key=value` header, trimming both sides
///
/// The value is marked sensitive so it never shows up in debug output.
pub fn parse_header(entry: &str) -> ExporterResult<(HeaderName, HeaderValue)> {
    let (key, value) = entry.split_once('=').ok_or_else(|| {
        ExporterError::Config("cannot split header: missing equal sign".to_string())
    })?;

    let key = key.trim();
    let name = HeaderName::from_bytes(key.as_bytes())
        .map_err(|e| ExporterError::Config(format!("invalid header name '{}': {}", key, e)))?;
    let mut value = HeaderValue::from_str(value.trim()).map_err(|e| {
        ExporterError::Config(format!("invalid value for header '{}': {}", name, e))
    })?;
    value.set_sensitive(true);

    Ok((name, value))
}
