//! Shared test helpers: a fake Fronius device served by axum and sample payloads.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use fronius_exporter::metrics::MetricsCollector;
use fronius_exporter::symo::{ClientOptions, EnabledEndpoints, SubEndpointKind, SymoClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// How the fake device answers one sub-endpoint
#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Raw(&'static str),
    Status(StatusCode),
    Slow(Duration, Value),
}

/// A request as seen by the fake device
#[derive(Clone, Debug)]
pub struct Recorded {
    pub path_and_query: String,
    pub headers: HeaderMap,
}

#[derive(Clone, Default)]
pub struct FakeDevice {
    replies: Arc<Mutex<HashMap<&'static str, Reply>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

fn route_path(kind: SubEndpointKind) -> &'static str {
    kind.path().split('?').next().unwrap_or_default()
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, kind: SubEndpointKind, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(route_path(kind), reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Serve on an ephemeral local port and return the base URL
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Like `spawn`, but on a runtime of its own thread, so the device's
    /// tasks do not count towards the caller's runtime
    pub fn spawn_on_own_runtime(&self) -> String {
        let device = self.clone();
        let (url_tx, url_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                url_tx.send(device.spawn().await).unwrap();
                std::future::pending::<()>().await;
            });
        });
        url_rx.recv().unwrap()
    }
}

async fn handle(State(device): State<FakeDevice>, uri: Uri, headers: HeaderMap) -> Response {
    device.requests.lock().unwrap().push(Recorded {
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        headers,
    });

    let reply = device.replies.lock().unwrap().get(uri.path()).cloned();
    match reply {
        Some(Reply::Json(body)) => axum::Json(body).into_response(),
        Some(Reply::Raw(body)) => body.into_response(),
        Some(Reply::Status(status)) => status.into_response(),
        Some(Reply::Slow(delay, body)) => {
            tokio::time::sleep(delay).await;
            axum::Json(body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn enabled(kinds: &[SubEndpointKind]) -> EnabledEndpoints {
    EnabledEndpoints {
        power_flow: kinds.contains(&SubEndpointKind::PowerFlow),
        archive: kinds.contains(&SubEndpointKind::Archive),
        inverter_realtime: kinds.contains(&SubEndpointKind::InverterRealtime),
        meter: kinds.contains(&SubEndpointKind::MeterRealtime),
    }
}

pub fn client_options(url: &str, kinds: &[SubEndpointKind], timeout: Duration) -> ClientOptions {
    ClientOptions {
        url: url.to_string(),
        headers: Default::default(),
        timeout,
        enabled: enabled(kinds),
    }
}

pub fn create_client(url: &str, kinds: &[SubEndpointKind], timeout: Duration) -> SymoClient {
    SymoClient::new(client_options(url, kinds, timeout)).expect("Failed to create client")
}

pub fn create_test_metrics() -> MetricsCollector {
    MetricsCollector::new().expect("Failed to create metrics")
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Power flow as reported by a Symo with one inverter and a battery
pub fn power_flow_json(p_pv: Value, rel_self_consumption: Value) -> Value {
    json!({
        "Body": {
            "Data": {
                "Inverters": {
                    "1": {
                        "DT": 99,
                        "E_Day": 22997,
                        "E_Total": 43059100,
                        "E_Year": 3525577.75,
                        "P": 1200,
                        "SOC": 55
                    }
                },
                "Site": {
                    "E_Day": 22997,
                    "E_Total": 43059100,
                    "E_Year": 3525577.75,
                    "Meter_Location": "grid",
                    "Mode": "meter",
                    "P_Akku": null,
                    "P_Grid": 611.4,
                    "P_Load": -611.4,
                    "P_PV": p_pv,
                    "rel_Autonomy": 100,
                    "rel_SelfConsumption": rel_self_consumption
                },
                "Version": "12"
            }
        },
        "Head": {
            "RequestArguments": {},
            "Status": { "Code": 0, "Reason": "", "UserMessage": "" },
            "Timestamp": "2024-05-01T12:07:11+02:00"
        }
    })
}

/// Archive data for `inverter/1` with two DC strings
pub fn archive_json(current_1: f64, current_2: f64, voltage_1: f64, voltage_2: f64) -> Value {
    json!({
        "Body": {
            "Data": {
                "inverter/1": {
                    "Data": {
                        "Current_DC_String_1": { "Unit": "A", "Values": { "0": current_1 } },
                        "Current_DC_String_2": { "Unit": "A", "Values": { "0": current_2 } },
                        "Voltage_DC_String_1": { "Unit": "V", "Values": { "0": voltage_1 } },
                        "Voltage_DC_String_2": { "Unit": "V", "Values": { "0": voltage_2 } }
                    },
                    "DeviceType": 99,
                    "End": "2024-05-01T12:10:00+00:00",
                    "NodeType": 97,
                    "Start": "2024-05-01T12:05:00+00:00"
                }
            }
        }
    })
}

pub fn inverter_realtime_json() -> Value {
    json!({
        "Body": {
            "Data": {
                "IDC": { "Unit": "A", "Value": 4.5 },
                "IDC_2": { "Unit": "A", "Value": 3.25 },
                "IDC_3": { "Unit": "A", "Value": null },
                "UDC": { "Unit": "V", "Value": 512.3 },
                "UDC_2": { "Unit": "V", "Value": 498.1 },
                "PAC": { "Unit": "W", "Value": 3990 }
            }
        }
    })
}

pub fn meter_json(consumed: f64, produced: f64) -> Value {
    json!({
        "Body": {
            "Data": {
                "0": {
                    "EnergyReal_WAC_Sum_Consumed": consumed,
                    "EnergyReal_WAC_Sum_Produced": produced,
                    "PowerReal_P_Sum": -1520.5,
                    "Meter_Location_Current": 0
                }
            }
        }
    })
}
