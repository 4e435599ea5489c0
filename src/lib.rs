pub mod aggregation;
pub use aggregation::{aggregate, find_by_ip, ip_set, Aggregator, FlowKey, KeyField};

pub mod cli;

pub mod configuration;
pub use configuration::ReaderConfig;

pub mod credentials;

pub mod error_handling;
pub use error_handling::types::{
    ConfigError, CredentialError, NormalizationError, QueryError, ReaderError,
};

pub mod flow_record;
pub use flow_record::{FlowRecord, Reporter};

pub mod http;

pub mod query;
pub use query::{QueryPlan, QueryWindow, Reader};
