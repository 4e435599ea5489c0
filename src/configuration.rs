//! Reader configuration: TOML file plus command-line overrides.

pub mod config;
pub mod types;

pub use config::{parse_time, split_filters, Args, DEFAULT_TIME_FORMAT};
pub use types::ReaderConfig;
