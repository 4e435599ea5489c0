//! Strongly typed flow record and its optional structured groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error_handling::types::FieldProblem;

/// Which side of the connection emitted the log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Reporter {
    Src,
    Dest,
}

impl FromStr for Reporter {
    type Err = FieldProblem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SRC" => Ok(Reporter::Src),
            "DEST" => Ok(Reporter::Dest),
            other => Err(FieldProblem::InvalidReporter(other.to_string())),
        }
    }
}

impl fmt::Display for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reporter::Src => write!(f, "SRC"),
            Reporter::Dest => write!(f, "DEST"),
        }
    }
}

/// VM instance on one end of the flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceDetails {
    pub project_id: String,
    pub vm_name: String,
    pub region: String,
    pub zone: String,
}

/// VPC network on one end of the flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VpcDetails {
    pub project_id: String,
    pub vpc_name: String,
    pub subnetwork_name: String,
}

/// Geographic annotation for an endpoint outside the VPC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeographicDetails {
    pub continent: String,
    pub country: String,
    pub region: String,
    pub city: String,
}

/// Labels of the `gce_subnetwork` monitored resource the entry was logged against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLabels {
    pub project_id: String,
    pub subnetwork_id: String,
    pub subnetwork_name: String,
    pub location: String,
}

/// One VPC flow observation.
///
/// Records are produced by [`FlowRecord::from_payload`] or
/// [`FlowRecord::from_entry`] and compare and hash by value, so they can be
/// deduplicated or collected into sets directly.
///
/// Each optional group (`*_instance`, `*_vpc`, `*_location`, `resource_labels`)
/// is either fully populated or `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FlowRecord {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dest_ip: IpAddr,
    pub dest_port: u16,
    pub protocol: u8,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub rtt_msec: Option<u64>,
    pub reporter: Option<Reporter>,
    pub src_instance: Option<InstanceDetails>,
    pub dest_instance: Option<InstanceDetails>,
    pub src_vpc: Option<VpcDetails>,
    pub dest_vpc: Option<VpcDetails>,
    pub src_location: Option<GeographicDetails>,
    pub dest_location: Option<GeographicDetails>,
    pub resource_labels: Option<ResourceLabels>,
}

impl FlowRecord {
    /// `src_ip:src_port/proto->dest_ip:dest_port/proto`
    pub fn short_form(&self) -> String {
        format!(
            "{}:{}/{}->{}:{}/{}",
            self.src_ip, self.src_port, self.protocol, self.dest_ip, self.dest_port, self.protocol
        )
    }

    /// True when `ip` is either endpoint of the flow.
    pub fn involves(&self, ip: &IpAddr) -> bool {
        self.src_ip == *ip || self.dest_ip == *ip
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Every field serializes infallibly (strings, integers and options of those).
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for FlowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "src_ip: {}, src_port: {}, dest_ip: {}, dest_port: {}, protocol: {}, \
             start_time: {}, end_time: {}, bytes_sent: {}, packets_sent: {}",
            self.src_ip,
            self.src_port,
            self.dest_ip,
            self.dest_port,
            self.protocol,
            self.start_time.format("%Y-%m-%d %H:%M:%S"),
            self.end_time.format("%Y-%m-%d %H:%M:%S"),
            self.bytes_sent,
            self.packets_sent
        )
    }
}
