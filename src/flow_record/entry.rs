//! Raw log entries as returned by the logging backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The monitored resource an entry was written against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoredResource {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// A single, still untyped, log entry.
///
/// Only the fields the reader cares about are kept; anything else in the
/// backend's JSON is ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default)]
    pub log_name: Option<String>,
    #[serde(default)]
    pub insert_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub resource: Option<MonitoredResource>,
    #[serde(default)]
    pub json_payload: Option<Map<String, Value>>,
}

impl LogEntry {
    /// Wraps a bare `jsonPayload` map, mostly useful for tests and replays.
    pub fn from_payload(payload: Map<String, Value>) -> Self {
        Self {
            json_payload: Some(payload),
            ..Default::default()
        }
    }
}
