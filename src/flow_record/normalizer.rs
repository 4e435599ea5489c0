//! Record normalizer: untyped JSON payload in, [`FlowRecord`] out.
//!
//! Required fields: `connection.{src_ip,dest_ip,src_port,dest_port,protocol}`,
//! `start_time` and `end_time`. Counters (`bytes_sent`, `packets_sent`) read
//! as zero when absent. Everything else is optional and maps to `None` when
//! missing. A field that is present but cannot be coerced is always an error.

use chrono::{DateTime, Utc};
use log::trace;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::net::IpAddr;

use super::entry::LogEntry;
use super::timestamp::coerce_instant;
use super::types::*;
use crate::error_handling::types::{FieldProblem, NormalizationError};

type Payload = Map<String, Value>;

/// Looks up a dotted path; `null` counts as absent.
fn lookup<'a>(payload: &'a Payload, path: &str) -> Result<Option<&'a Value>, NormalizationError> {
    let mut current = payload;
    let mut segments = path.split('.').peekable();
    let mut walked = String::new();
    while let Some(segment) = segments.next() {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);
        let value = match current.get(segment) {
            None | Some(Value::Null) => return Ok(None),
            Some(v) => v,
        };
        if segments.peek().is_none() {
            return Ok(Some(value));
        }
        current = value
            .as_object()
            .ok_or_else(|| NormalizationError::new(walked.clone(), FieldProblem::NotAnObject))?;
    }
    Ok(None)
}

fn required<'a>(payload: &'a Payload, path: &str) -> Result<&'a Value, NormalizationError> {
    lookup(payload, path)?.ok_or_else(|| NormalizationError::missing(path))
}

fn integral_float(f: f64, raw: &str, path: &str) -> Result<u64, NormalizationError> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(NormalizationError::new(path, FieldProblem::InvalidNumber(raw.to_string())));
    }
    // 2^64 is the first float past u64::MAX; `as` would saturate silently.
    if f < 0.0 || f >= 18_446_744_073_709_551_616.0 {
        return Err(NormalizationError::new(path, FieldProblem::OutOfRange(raw.to_string())));
    }
    Ok(f as u64)
}

/// Accepts JSON integers, integral floats (`3389.0`) and decimal strings (`"491"`).
fn coerce_u64(value: &Value, path: &str) -> Result<u64, NormalizationError> {
    match value {
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(u), _) => Ok(u),
            (None, Some(f)) => integral_float(f, &n.to_string(), path),
            (None, None) => Err(NormalizationError::new(
                path,
                FieldProblem::InvalidNumber(n.to_string()),
            )),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(u) = trimmed.parse::<u64>() {
                return Ok(u);
            }
            match trimmed.parse::<f64>() {
                Ok(f) => integral_float(f, s, path),
                Err(_) => Err(NormalizationError::new(path, FieldProblem::InvalidNumber(s.clone()))),
            }
        }
        other => Err(NormalizationError::new(
            path,
            FieldProblem::InvalidNumber(other.to_string()),
        )),
    }
}

fn coerce_narrow<T: TryFrom<u64>>(value: &Value, path: &str) -> Result<T, NormalizationError> {
    let wide = coerce_u64(value, path)?;
    T::try_from(wide)
        .map_err(|_| NormalizationError::new(path, FieldProblem::OutOfRange(wide.to_string())))
}

fn required_ip(payload: &Payload, path: &str) -> Result<IpAddr, NormalizationError> {
    let value = required(payload, path)?;
    let raw = match value {
        Value::String(s) => s.as_str(),
        other => {
            return Err(NormalizationError::new(
                path,
                FieldProblem::InvalidAddress(other.to_string()),
            ))
        }
    };
    raw.trim()
        .parse()
        .map_err(|_| NormalizationError::new(path, FieldProblem::InvalidAddress(raw.to_string())))
}

fn required_time(payload: &Payload, path: &str) -> Result<DateTime<Utc>, NormalizationError> {
    coerce_instant(required(payload, path)?).map_err(|problem| NormalizationError::new(path, problem))
}

fn counter(payload: &Payload, path: &str) -> Result<u64, NormalizationError> {
    match lookup(payload, path)? {
        Some(value) => coerce_u64(value, path),
        None => Ok(0),
    }
}

fn optional_u64(payload: &Payload, path: &str) -> Result<Option<u64>, NormalizationError> {
    lookup(payload, path)?.map(|v| coerce_u64(v, path)).transpose()
}

fn optional_reporter(payload: &Payload, path: &str) -> Result<Option<Reporter>, NormalizationError> {
    match lookup(payload, path)? {
        None => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|problem| NormalizationError::new(path, problem)),
        Some(other) => Err(NormalizationError::new(
            path,
            FieldProblem::InvalidReporter(other.to_string()),
        )),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extracts every named key of a nested group, or nothing at all.
fn group<const N: usize>(payload: &Payload, key: &str, names: [&str; N]) -> Option<[String; N]> {
    let obj = payload.get(key)?.as_object()?;
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = scalar_string(obj.get(name)?)?;
    }
    Some(out)
}

fn instance(payload: &Payload, key: &str) -> Option<InstanceDetails> {
    let [project_id, vm_name, region, zone] =
        group(payload, key, ["project_id", "vm_name", "region", "zone"])?;
    Some(InstanceDetails {
        project_id,
        vm_name,
        region,
        zone,
    })
}

fn vpc(payload: &Payload, key: &str) -> Option<VpcDetails> {
    let [project_id, vpc_name, subnetwork_name] =
        group(payload, key, ["project_id", "vpc_name", "subnetwork_name"])?;
    Some(VpcDetails {
        project_id,
        vpc_name,
        subnetwork_name,
    })
}

fn location(payload: &Payload, key: &str) -> Option<GeographicDetails> {
    let [continent, country, region, city] =
        group(payload, key, ["continent", "country", "region", "city"])?;
    Some(GeographicDetails {
        continent,
        country,
        region,
        city,
    })
}

fn resource_labels(labels: &BTreeMap<String, String>) -> Option<ResourceLabels> {
    Some(ResourceLabels {
        project_id: labels.get("project_id")?.clone(),
        subnetwork_id: labels.get("subnetwork_id")?.clone(),
        subnetwork_name: labels.get("subnetwork_name")?.clone(),
        location: labels.get("location")?.clone(),
    })
}

/// Normalizes a bare `jsonPayload` map.
pub fn normalize_payload(payload: &Payload) -> Result<FlowRecord, NormalizationError> {
    let record = FlowRecord {
        src_ip: required_ip(payload, "connection.src_ip")?,
        src_port: coerce_narrow(required(payload, "connection.src_port")?, "connection.src_port")?,
        dest_ip: required_ip(payload, "connection.dest_ip")?,
        dest_port: coerce_narrow(required(payload, "connection.dest_port")?, "connection.dest_port")?,
        protocol: coerce_narrow(required(payload, "connection.protocol")?, "connection.protocol")?,
        start_time: required_time(payload, "start_time")?,
        end_time: required_time(payload, "end_time")?,
        bytes_sent: counter(payload, "bytes_sent")?,
        packets_sent: counter(payload, "packets_sent")?,
        rtt_msec: optional_u64(payload, "rtt_msec")?,
        reporter: optional_reporter(payload, "reporter")?,
        src_instance: instance(payload, "src_instance"),
        dest_instance: instance(payload, "dest_instance"),
        src_vpc: vpc(payload, "src_vpc"),
        dest_vpc: vpc(payload, "dest_vpc"),
        src_location: location(payload, "src_location"),
        dest_location: location(payload, "dest_location"),
        resource_labels: None,
    };
    trace!("Normalized flow {}", record.short_form());
    Ok(record)
}

/// Normalizes a full log entry, picking up the monitored resource labels as well.
pub fn normalize_entry(entry: &LogEntry) -> Result<FlowRecord, NormalizationError> {
    let payload = entry
        .json_payload
        .as_ref()
        .ok_or_else(|| NormalizationError::missing("jsonPayload"))?;
    let mut record = normalize_payload(payload)?;
    record.resource_labels = entry
        .resource
        .as_ref()
        .and_then(|resource| resource_labels(&resource.labels));
    Ok(record)
}

impl FlowRecord {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, NormalizationError> {
        normalize_payload(payload)
    }

    pub fn from_entry(entry: &LogEntry) -> Result<Self, NormalizationError> {
        normalize_entry(entry)
    }
}
