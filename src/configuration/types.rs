use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error_handling::types::ConfigError;
use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::query::backend::{DEFAULT_ORDER_BY, DEFAULT_PAGE_SIZE};

/// Every Query Driver option.
///
/// All fields are optional in the TOML file:
///
/// ```toml
/// project_ids = ["yoyodyne-102010"]
/// start_time = "2018-04-03T09:51:22Z"
/// filters = ['jsonPayload.reporter="SRC"']
/// collect_multiple_projects = false
/// page_size = 500
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    pub project_ids: Vec<String>,
    /// Replaces the per-project default log names.
    pub log_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Extra filter fragments, AND-ed in front of the flow log predicates.
    pub filters: Vec<String>,
    pub collect_multiple_projects: bool,
    pub credentials_file: Option<PathBuf>,
    pub page_size: u32,
    pub order_by: String,
    pub logging_endpoint: Option<String>,
    pub resource_manager_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            project_ids: Vec::new(),
            log_name: None,
            start_time: None,
            end_time: None,
            filters: Vec::new(),
            collect_multiple_projects: false,
            credentials_file: None,
            page_size: DEFAULT_PAGE_SIZE,
            order_by: DEFAULT_ORDER_BY.to_string(),
            logging_endpoint: None,
            resource_manager_endpoint: None,
            token_endpoint: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ReaderConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
