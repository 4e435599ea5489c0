//! Credentials
//!
//! Locates a credentials JSON file (explicit path or
//! `GOOGLE_APPLICATION_CREDENTIALS`), parses it and turns it into a
//! [`TokenSource`] that hands out bearer tokens for the logging API.

pub mod token_source;
pub mod types;

pub use token_source::{OAuthTokenSource, StaticToken, TokenSource};
pub use types::{credentials_path, CredentialsFile, CREDENTIALS_ENV};

use log::debug;
use std::path::Path;
use std::sync::Arc;

use crate::error_handling::types::CredentialError;
use crate::http::HttpTransport;

/// Token source plus the project the credentials belong to, if any.
pub struct LoadedCredentials {
    pub token_source: OAuthTokenSource,
    pub project_id: Option<String>,
}

/// Resolves, reads and parses the credentials file.
pub fn load(
    explicit: Option<&Path>,
    transport: Arc<HttpTransport>,
    token_uri: Option<String>,
) -> Result<LoadedCredentials, CredentialError> {
    let path = credentials_path(explicit)?;
    debug!("Loading credentials from {}", path.display());
    let file = CredentialsFile::from_path(&path)?;
    let project_id = file.project_id();
    Ok(LoadedCredentials {
        token_source: OAuthTokenSource::new(file, transport, token_uri),
        project_id,
    })
}
