use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::IpAddr;

use crate::error_handling::types::ReaderError;
use crate::flow_record::FlowRecord;

/// One component of the 5-tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyField {
    SrcIp,
    SrcPort,
    DestIp,
    DestPort,
    Protocol,
}

impl KeyField {
    pub const FIVE_TUPLE: [KeyField; 5] = [
        KeyField::SrcIp,
        KeyField::SrcPort,
        KeyField::DestIp,
        KeyField::DestPort,
        KeyField::Protocol,
    ];
}

/// Aggregation key. Components outside the aggregator's key fields are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub src_ip: Option<IpAddr>,
    pub src_port: Option<u16>,
    pub dest_ip: Option<IpAddr>,
    pub dest_port: Option<u16>,
    pub protocol: Option<u8>,
}

impl FlowKey {
    /// The full 5-tuple of `record`.
    pub fn of(record: &FlowRecord) -> Self {
        Self::project(record, &KeyField::FIVE_TUPLE)
    }

    pub fn project(record: &FlowRecord, fields: &[KeyField]) -> Self {
        let mut key = FlowKey::default();
        for field in fields {
            match field {
                KeyField::SrcIp => key.src_ip = Some(record.src_ip),
                KeyField::SrcPort => key.src_port = Some(record.src_port),
                KeyField::DestIp => key.dest_ip = Some(record.dest_ip),
                KeyField::DestPort => key.dest_port = Some(record.dest_port),
                KeyField::Protocol => key.protocol = Some(record.protocol),
            }
        }
        key
    }
}

fn merge_into(total: &mut FlowRecord, record: &FlowRecord) {
    total.bytes_sent = total.bytes_sent.saturating_add(record.bytes_sent);
    total.packets_sent = total.packets_sent.saturating_add(record.packets_sent);
    total.start_time = earliest(total.start_time, record.start_time);
    total.end_time = latest(total.end_time, record.end_time);
}

fn earliest(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a.min(b)
}

fn latest(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a.max(b)
}

/// Folds records sharing a key into one record per key.
///
/// Byte and packet counts are summed, the time span widens to the earliest
/// start and latest end, and every other field comes from the first record
/// seen for the key. Output keeps first-occurrence order.
#[derive(Debug, Clone)]
pub struct Aggregator {
    fields: Vec<KeyField>,
    index: HashMap<FlowKey, usize>,
    entries: Vec<(FlowKey, FlowRecord)>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Aggregates by the full 5-tuple.
    pub fn new() -> Self {
        Self::with_key_fields(&KeyField::FIVE_TUPLE)
    }

    pub fn with_key_fields(fields: &[KeyField]) -> Self {
        let mut unique = Vec::with_capacity(fields.len());
        for field in fields {
            if !unique.contains(field) {
                unique.push(*field);
            }
        }
        Self {
            fields: unique,
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn key_fields(&self) -> &[KeyField] {
        &self.fields
    }

    pub fn add(&mut self, record: FlowRecord) {
        let key = FlowKey::project(&record, &self.fields);
        match self.index.get(&key) {
            Some(&slot) => merge_into(&mut self.entries[slot].1, &record),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, record));
            }
        }
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowRecord> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(FlowKey, FlowRecord)> {
        self.entries
    }

    pub fn into_records(self) -> Vec<FlowRecord> {
        self.entries.into_iter().map(|(_, record)| record).collect()
    }

    pub fn into_map(self) -> HashMap<FlowKey, FlowRecord> {
        self.entries.into_iter().collect()
    }
}

impl Extend<FlowRecord> for Aggregator {
    fn extend<I: IntoIterator<Item = FlowRecord>>(&mut self, records: I) {
        for record in records {
            self.add(record);
        }
    }
}

impl FromIterator<FlowRecord> for Aggregator {
    fn from_iter<I: IntoIterator<Item = FlowRecord>>(records: I) -> Self {
        let mut aggregator = Aggregator::new();
        aggregator.extend(records);
        aggregator
    }
}

/// Aggregates a Reader's output by 5-tuple, stopping at the first error.
pub fn aggregate<I>(records: I) -> Result<Vec<FlowRecord>, ReaderError>
where
    I: IntoIterator<Item = Result<FlowRecord, ReaderError>>,
{
    let mut aggregator = Aggregator::new();
    for record in records {
        aggregator.add(record?);
    }
    Ok(aggregator.into_records())
}
