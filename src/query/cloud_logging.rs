//! Cloud Logging and Resource Manager over HTTP.

use log::{debug, trace};
use serde::Deserialize;
use std::sync::Arc;

use super::backend::{LogBackend, LogPage, PageRequest, ProjectDirectory};
use crate::credentials::TokenSource;
use crate::error_handling::types::QueryError;
use crate::flow_record::LogEntry;
use crate::http::HttpTransport;

pub const DEFAULT_LOGGING_ENDPOINT: &str = "https://logging.googleapis.com";
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://cloudresourcemanager.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesResponse {
    #[serde(default)]
    entries: Vec<LogEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectSummary {
    project_id: String,
    #[serde(default)]
    lifecycle_state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsResponse {
    #[serde(default)]
    projects: Vec<ProjectSummary>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct CloudLoggingClient {
    transport: Arc<HttpTransport>,
    tokens: Box<dyn TokenSource>,
    logging_endpoint: String,
    resource_manager_endpoint: String,
}

impl CloudLoggingClient {
    pub fn new(transport: Arc<HttpTransport>, tokens: Box<dyn TokenSource>) -> Self {
        Self {
            transport,
            tokens,
            logging_endpoint: DEFAULT_LOGGING_ENDPOINT.to_string(),
            resource_manager_endpoint: DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string(),
        }
    }

    pub fn with_logging_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.logging_endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_resource_manager_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.resource_manager_endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn bearer(&mut self) -> Result<String, QueryError> {
        Ok(self.tokens.access_token()?)
    }
}

impl LogBackend for CloudLoggingClient {
    fn list_entries(&mut self, request: &PageRequest) -> Result<LogPage, QueryError> {
        let token = self.bearer()?;
        let url = format!("{}/v2/entries:list", self.logging_endpoint);
        trace!("POST {} (page token {:?})", url, request.page_token);
        let builder = self
            .transport
            .client()
            .post(&url)
            .bearer_auth(token)
            .json(request);
        let response = self.transport.send(builder)?.error_for_status()?;
        let decoded: ListEntriesResponse = response.json()?;
        let mut page = LogPage::new(decoded.entries, decoded.next_page_token);
        page.bytes = response.body.len();
        debug!(
            "Fetched {} entries ({} bytes), more pages: {}",
            page.entries.len(),
            page.bytes,
            page.next_page_token.is_some()
        );
        Ok(page)
    }
}

impl ProjectDirectory for CloudLoggingClient {
    fn list_projects(&mut self) -> Result<Vec<String>, QueryError> {
        let url = format!("{}/v1/projects", self.resource_manager_endpoint);
        let mut projects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let token = self.bearer()?;
            let mut builder = self.transport.client().get(&url).bearer_auth(token);
            if let Some(next) = &page_token {
                builder = builder.query(&[("pageToken", next.as_str())]);
            }
            let response = self.transport.send(builder)?.error_for_status()?;
            let decoded: ListProjectsResponse = response.json()?;
            projects.extend(
                decoded
                    .projects
                    .into_iter()
                    .filter(|p| p.lifecycle_state.as_deref().map_or(true, |s| s == "ACTIVE"))
                    .map(|p| p.project_id),
            );
            page_token = decoded.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }
        debug!("Discovered {} accessible project(s)", projects.len());
        Ok(projects)
    }
}
