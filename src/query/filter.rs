//! Logging filter expressions.
//!
//! Filters are built as a small expression tree and rendered once, so
//! quoting and grouping are handled in one place instead of being spread
//! over string concatenations.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use super::window::QueryWindow;

/// Resource type every VPC flow log entry is written against.
pub const FLOW_RESOURCE_TYPE: &str = "gce_subnetwork";

/// Timestamp format understood by the logging filter language.
pub const FILTER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ge,
    Lt,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Eq => write!(f, "="),
            Comparison::Ge => write!(f, ">="),
            Comparison::Lt => write!(f, "<"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// A caller-supplied fragment, rendered verbatim.
    Raw(String),
    Compare {
        field: String,
        op: Comparison,
        value: String,
    },
    All(Vec<Filter>),
    Any(Vec<Filter>),
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format(FILTER_TIME_FORMAT).to_string()
}

impl Filter {
    pub fn raw<S: Into<String>>(fragment: S) -> Self {
        Filter::Raw(fragment.into())
    }

    pub fn compare<F: Into<String>, V: Into<String>>(field: F, op: Comparison, value: V) -> Self {
        Filter::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    pub fn at_or_after<F: Into<String>>(field: F, instant: DateTime<Utc>) -> Self {
        Self::compare(field, Comparison::Ge, format_instant(instant))
    }

    pub fn before<F: Into<String>>(field: F, instant: DateTime<Utc>) -> Self {
        Self::compare(field, Comparison::Lt, format_instant(instant))
    }

    pub fn render(&self) -> String {
        match self {
            Filter::Raw(fragment) => fragment.clone(),
            Filter::Compare { field, op, value } => format!("{} {} {}", field, op, quote(value)),
            Filter::All(children) => children
                .iter()
                .map(|child| match child {
                    Filter::All(_) => format!("({})", child.render()),
                    _ => child.render(),
                })
                .collect::<Vec<_>>()
                .join(" AND "),
            Filter::Any(children) => format!(
                "({})",
                children
                    .iter()
                    .map(|child| match child {
                        Filter::All(_) => format!("({})", child.render()),
                        _ => child.render(),
                    })
                    .collect::<Vec<_>>()
                    .join(" OR ")
            ),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// `logName = "..."` for each log, OR-ed together.
pub fn by_log_names(log_names: &[String]) -> Filter {
    Filter::Any(
        log_names
            .iter()
            .map(|name| Filter::eq("logName", name.as_str()))
            .collect(),
    )
}

/// Window restriction: the indexed `timestamp` field padded by `padding` on
/// each side narrows the scan, then the payload start time is matched exactly.
pub fn by_window(window: &QueryWindow, padding: Duration) -> Vec<Filter> {
    let padded = window.padded(padding);
    vec![
        Filter::at_or_after("timestamp", padded.start()),
        Filter::before("timestamp", padded.end()),
        Filter::at_or_after("jsonPayload.start_time", window.start()),
        Filter::before("jsonPayload.start_time", window.end()),
    ]
}

/// The complete flow log filter: user fragments first, then the fixed predicates.
pub fn flow_log_filter(fragments: &[String], log_names: &[String], window: &QueryWindow) -> Filter {
    let mut clauses: Vec<Filter> = fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(Filter::raw)
        .collect();
    clauses.push(Filter::eq("resource.type", FLOW_RESOURCE_TYPE));
    clauses.push(by_log_names(log_names));
    clauses.extend(by_window(window, Duration::minutes(1)));
    Filter::All(clauses)
}
