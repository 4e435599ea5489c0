use std::collections::BTreeSet;
use std::net::IpAddr;

use crate::error_handling::types::ReaderError;
use crate::flow_record::FlowRecord;

/// Every source and destination address seen, deduplicated and sorted.
///
/// Stops at the first error.
pub fn ip_set<I>(records: I) -> Result<BTreeSet<IpAddr>, ReaderError>
where
    I: IntoIterator<Item = Result<FlowRecord, ReaderError>>,
{
    let mut addresses = BTreeSet::new();
    for record in records {
        let record = record?;
        addresses.insert(record.src_ip);
        addresses.insert(record.dest_ip);
    }
    Ok(addresses)
}

/// Keeps the records where any of `targets` is the source or destination.
/// Errors pass through untouched.
pub fn find_by_ip<I>(
    records: I,
    targets: Vec<IpAddr>,
) -> impl Iterator<Item = Result<FlowRecord, ReaderError>>
where
    I: IntoIterator<Item = Result<FlowRecord, ReaderError>>,
{
    records.into_iter().filter(move |item| match item {
        Ok(record) => targets.iter().any(|ip| record.involves(ip)),
        Err(_) => true,
    })
}
