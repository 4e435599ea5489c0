//! Query Driver
//!
//! Components:
//! - `window`: the `[start, end)` query window and its defaults.
//! - `filter`: the logging filter expression tree.
//! - `backend`: the paged backend and project directory traits.
//! - `cloud_logging`: the HTTP implementation of both traits.
//! - `reader`: [`Reader`], the iterator that drives pagination.

pub mod backend;
pub mod cloud_logging;
pub mod filter;
pub mod reader;
pub mod window;

pub use backend::{LogBackend, LogPage, PageRequest, ProjectDirectory};
pub use cloud_logging::CloudLoggingClient;
pub use filter::Filter;
pub use reader::{default_log_name, resolve_projects, QueryPlan, Reader};
pub use window::{Clock, FixedClock, QueryWindow, SystemClock};
