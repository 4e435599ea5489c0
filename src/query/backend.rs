//! Backend seam
//!
//! The Reader only needs two things from the outside world: one page of log
//! entries for a filter and continuation token, and (for multi-project
//! collection) the list of projects the caller can see. Both are traits so
//! the HTTP client can be replaced by an in-memory stub.

use serde::Serialize;

use crate::error_handling::types::QueryError;
use crate::flow_record::LogEntry;

pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_ORDER_BY: &str = "timestamp desc";

/// One `entries:list` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub resource_names: Vec<String>,
    pub filter: String,
    pub order_by: String,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    /// `None` once the backend has nothing more to return.
    pub next_page_token: Option<String>,
    /// Size of the response body the page was decoded from.
    pub bytes: usize,
}

impl LogPage {
    pub fn new(entries: Vec<LogEntry>, next_page_token: Option<String>) -> Self {
        Self {
            entries,
            // an empty token means the same as no token
            next_page_token: next_page_token.filter(|t| !t.is_empty()),
            bytes: 0,
        }
    }
}

/// A paged, filtered log query service.
pub trait LogBackend {
    fn list_entries(&mut self, request: &PageRequest) -> Result<LogPage, QueryError>;
}

impl<B: LogBackend + ?Sized> LogBackend for Box<B> {
    fn list_entries(&mut self, request: &PageRequest) -> Result<LogPage, QueryError> {
        (**self).list_entries(request)
    }
}

impl<B: LogBackend + ?Sized> LogBackend for &mut B {
    fn list_entries(&mut self, request: &PageRequest) -> Result<LogPage, QueryError> {
        (**self).list_entries(request)
    }
}

/// Lists the project ids visible to the current credentials.
pub trait ProjectDirectory {
    fn list_projects(&mut self) -> Result<Vec<String>, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_end_of_stream() {
        assert_eq!(LogPage::new(Vec::new(), Some(String::new())).next_page_token, None);
        assert_eq!(
            LogPage::new(Vec::new(), Some("abc".into())).next_page_token,
            Some("abc".to_string())
        );
    }

    #[test]
    fn request_serializes_in_wire_shape() {
        let request = PageRequest {
            resource_names: vec!["projects/p".into()],
            filter: "x".into(),
            order_by: DEFAULT_ORDER_BY.into(),
            page_size: DEFAULT_PAGE_SIZE,
            page_token: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "resourceNames": ["projects/p"],
                "filter": "x",
                "orderBy": "timestamp desc",
                "pageSize": 1000,
            })
        );
    }
}
