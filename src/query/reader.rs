//! The Reader: a lazy, single-pass iterator over the flow records in a window.
//!
//! Pages are fetched on demand. Only the current page and the continuation
//! token are held, so memory stays bounded by one page. The first error
//! (backend or normalization) is yielded once and then the iterator is done;
//! nothing is retried.

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::backend::{LogBackend, PageRequest, ProjectDirectory, DEFAULT_ORDER_BY, DEFAULT_PAGE_SIZE};
use super::cloud_logging::CloudLoggingClient;
use super::filter::{flow_log_filter, Filter};
use super::window::{Clock, QueryWindow, SystemClock};
use crate::configuration::ReaderConfig;
use crate::credentials;
use crate::error_handling::types::{ConfigError, ReaderError};
use crate::flow_record::{normalize_entry, FlowRecord, LogEntry};
use crate::http::HttpTransport;

/// Log written by VPC flow logging in `project`.
pub fn default_log_name(project: &str) -> String {
    format!("projects/{}/logs/compute.googleapis.com%2Fvpc_flows", project)
}

/// Decides which projects a query covers.
///
/// Without multi-project collection exactly one project must be configured.
/// With it, a single configured project is expanded to every project the
/// directory lists; when that listing fails or comes back empty the
/// configured project is used on its own.
pub fn resolve_projects(
    configured: Vec<String>,
    collect_multiple: bool,
    directory: Option<&mut dyn ProjectDirectory>,
) -> Result<Vec<String>, ConfigError> {
    match configured.len() {
        0 => return Err(ConfigError::NoProject),
        n if n > 1 && !collect_multiple => return Err(ConfigError::TooManyProjects(n)),
        _ => {}
    }
    if !collect_multiple || configured.len() > 1 {
        return Ok(configured);
    }
    let directory = match directory {
        Some(d) => d,
        None => return Ok(configured),
    };
    match directory.list_projects() {
        Ok(found) if !found.is_empty() => {
            info!("Collecting flow logs from {} project(s)", found.len());
            Ok(found)
        }
        Ok(_) => {
            warn!("No accessible projects listed, querying {} only", configured[0]);
            Ok(configured)
        }
        Err(e) => {
            warn!("Unable to list projects ({}), querying {} only", e, configured[0]);
            Ok(configured)
        }
    }
}

/// Everything needed to issue the page requests of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    resource_names: Vec<String>,
    log_names: Vec<String>,
    window: QueryWindow,
    filter: Filter,
    order_by: String,
    page_size: u32,
}

impl QueryPlan {
    /// An explicit `log_name` replaces the per-project defaults.
    pub fn new(
        projects: &[String],
        log_name: Option<&str>,
        fragments: &[String],
        window: QueryWindow,
    ) -> Result<Self, ConfigError> {
        if projects.is_empty() {
            return Err(ConfigError::NoProject);
        }
        let log_names: Vec<String> = match log_name {
            Some(name) => vec![name.to_string()],
            None => projects.iter().map(|p| default_log_name(p)).collect(),
        };
        let filter = flow_log_filter(fragments, &log_names, &window);
        Ok(Self {
            resource_names: projects.iter().map(|p| format!("projects/{}", p)).collect(),
            log_names,
            window,
            filter,
            order_by: DEFAULT_ORDER_BY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn from_config(
        config: &ReaderConfig,
        projects: &[String],
        clock: &dyn Clock,
    ) -> Result<Self, ConfigError> {
        let window = QueryWindow::resolve(config.start_time, config.end_time, clock)?;
        debug!(
            "Query window {} .. {}",
            window.start().to_rfc3339(),
            window.end().to_rfc3339()
        );
        Ok(Self::new(projects, config.log_name.as_deref(), &config.filters, window)?
            .with_page_size(config.page_size)
            .with_order_by(config.order_by.clone()))
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_order_by<S: Into<String>>(mut self, order_by: S) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn window(&self) -> &QueryWindow {
        &self.window
    }

    pub fn log_names(&self) -> &[String] {
        &self.log_names
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn request(&self, page_token: Option<String>) -> PageRequest {
        PageRequest {
            resource_names: self.resource_names.clone(),
            filter: self.filter.render(),
            order_by: self.order_by.clone(),
            page_size: self.page_size,
            page_token,
        }
    }
}

pub struct Reader<B: LogBackend> {
    backend: B,
    plan: QueryPlan,
    buffered: VecDeque<LogEntry>,
    next_page_token: Option<String>,
    started: bool,
    done: bool,
    pages_fetched: usize,
    bytes_processed: usize,
}

impl<B: LogBackend> Reader<B> {
    pub fn new(backend: B, plan: QueryPlan) -> Self {
        Self {
            backend,
            plan,
            buffered: VecDeque::new(),
            next_page_token: None,
            started: false,
            done: false,
            pages_fetched: 0,
            bytes_processed: 0,
        }
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of page requests issued so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Total size of the response bodies received so far.
    pub fn bytes_processed(&self) -> usize {
        self.bytes_processed
    }

    fn finish(&mut self) {
        self.done = true;
        self.buffered.clear();
        self.next_page_token = None;
    }

    fn fetch_page(&mut self) -> Result<(), ReaderError> {
        let request = self.plan.request(self.next_page_token.take());
        let page = self.backend.list_entries(&request)?;
        self.started = true;
        self.pages_fetched += 1;
        self.bytes_processed += page.bytes;
        debug!(
            "Page {} holds {} entries",
            self.pages_fetched,
            page.entries.len()
        );
        self.next_page_token = page.next_page_token;
        self.buffered.extend(page.entries);
        Ok(())
    }
}

impl Reader<CloudLoggingClient> {
    /// Builds a Reader against Cloud Logging from a configuration.
    ///
    /// Credentials come from `config.credentials_file` or the environment; the
    /// project defaults to the one named in the credentials.
    pub fn connect(config: &ReaderConfig) -> Result<Self, ReaderError> {
        let transport = Arc::new(HttpTransport::new(Duration::from_secs(
            config.request_timeout_secs,
        ))?);
        let loaded = credentials::load(
            config.credentials_file.as_deref(),
            Arc::clone(&transport),
            config.token_endpoint.clone(),
        )?;
        let configured = if config.project_ids.is_empty() {
            loaded.project_id.into_iter().collect()
        } else {
            config.project_ids.clone()
        };

        let mut client = CloudLoggingClient::new(transport, Box::new(loaded.token_source));
        if let Some(endpoint) = &config.logging_endpoint {
            client = client.with_logging_endpoint(endpoint.as_str());
        }
        if let Some(endpoint) = &config.resource_manager_endpoint {
            client = client.with_resource_manager_endpoint(endpoint.as_str());
        }

        let projects = resolve_projects(
            configured,
            config.collect_multiple_projects,
            Some(&mut client as &mut dyn ProjectDirectory),
        )?;
        let plan = QueryPlan::from_config(config, &projects, &SystemClock)?;
        Ok(Reader::new(client, plan))
    }
}

impl<B: LogBackend> Iterator for Reader<B> {
    type Item = Result<FlowRecord, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(entry) = self.buffered.pop_front() {
                return match normalize_entry(&entry) {
                    Ok(record) => Some(Ok(record)),
                    Err(e) => {
                        self.finish();
                        Some(Err(e.into()))
                    }
                };
            }
            if self.started && self.next_page_token.is_none() {
                self.finish();
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.finish();
                return Some(Err(e));
            }
        }
    }
}
