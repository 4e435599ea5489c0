//! Flow records and the normalizer that builds them.
//!
//! Components:
//! - `types`: [`FlowRecord`] and its optional structured groups.
//! - `entry`: the raw, untyped [`LogEntry`] shape returned by the backend.
//! - `timestamp`: coercion of the supported timestamp encodings.
//! - `normalizer`: payload → [`FlowRecord`] conversion.

pub mod entry;
pub mod normalizer;
pub mod timestamp;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use entry::{LogEntry, MonitoredResource};
pub use normalizer::{normalize_entry, normalize_payload};
pub use types::{
    FlowRecord, GeographicDetails, InstanceDetails, Reporter, ResourceLabels, VpcDetails,
};
