use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error_handling::types::CredentialError;

/// Environment variable pointing at the default credentials file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

// Keys must never end up in logs.
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: Option<String>,
}

impl fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("quota_project_id", &self.quota_project_id)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// The supported shapes of a credentials JSON file, keyed by its `type`.
#[derive(Debug, Clone)]
pub enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

impl CredentialsFile {
    pub fn from_json(text: &str) -> Result<Self, CredentialError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CredentialError::MalformedFile(e.to_string()))?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CredentialError::MalformedFile("missing `type`".to_string()))?
            .to_string();
        let malformed = |e: serde_json::Error| CredentialError::MalformedFile(e.to_string());
        match kind.as_str() {
            "service_account" => Ok(CredentialsFile::ServiceAccount(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            "authorized_user" => Ok(CredentialsFile::AuthorizedUser(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            _ => Err(CredentialError::UnsupportedType(kind)),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CredentialError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// The project the credentials belong to, if they name one.
    pub fn project_id(&self) -> Option<String> {
        match self {
            CredentialsFile::ServiceAccount(key) => key.project_id.clone(),
            CredentialsFile::AuthorizedUser(user) => user.quota_project_id.clone(),
        }
    }
}

/// Explicit path first, then `GOOGLE_APPLICATION_CREDENTIALS`.
pub fn credentials_path(explicit: Option<&Path>) -> Result<PathBuf, CredentialError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match std::env::var_os(CREDENTIALS_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Err(CredentialError::NotConfigured),
    }
}
