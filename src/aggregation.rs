//! Post-processing over a record stream: 5-tuple aggregation, IP-set
//! collection and find-by-IP.

pub mod aggregator;
pub mod ip_helpers;

pub use aggregator::{aggregate, Aggregator, FlowKey, KeyField};
pub use ip_helpers::{find_by_ip, ip_set};
