//! OAuth2 access tokens for the logging and resource manager APIs.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::{AuthorizedUser, CredentialsFile, ServiceAccountKey};
use crate::error_handling::types::CredentialError;
use crate::http::HttpTransport;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only scopes: reading log entries and listing projects.
pub const READ_SCOPES: &str = "https://www.googleapis.com/auth/logging.read \
                               https://www.googleapis.com/auth/cloudplatformprojects.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Anything that can hand out a bearer token.
pub trait TokenSource {
    fn access_token(&mut self) -> Result<String, CredentialError>;
}

/// A pre-issued token, used as-is.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn access_token(&mut self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Exchanges a credentials file for access tokens at the OAuth2 token endpoint,
/// caching each token until shortly before it expires.
pub struct OAuthTokenSource {
    credentials: CredentialsFile,
    transport: Arc<HttpTransport>,
    token_uri: String,
    cached: Option<CachedToken>,
}

impl OAuthTokenSource {
    /// `token_uri` overrides the endpoint named in the file (or the default).
    pub fn new(
        credentials: CredentialsFile,
        transport: Arc<HttpTransport>,
        token_uri: Option<String>,
    ) -> Self {
        let token_uri = token_uri
            .or_else(|| match &credentials {
                CredentialsFile::ServiceAccount(key) => key.token_uri.clone(),
                CredentialsFile::AuthorizedUser(_) => None,
            })
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        Self {
            credentials,
            transport,
            token_uri,
            cached: None,
        }
    }

    fn signed_assertion(&self, key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String, CredentialError> {
        let claims = Claims {
            iss: &key.client_email,
            scope: READ_SCOPES,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CredentialError::SigningFailed(e.to_string()))?;
        jsonwebtoken::encode(&header, &claims, &signing_key)
            .map_err(|e| CredentialError::SigningFailed(e.to_string()))
    }

    fn grant_params(&self, now: DateTime<Utc>) -> Result<Vec<(&'static str, String)>, CredentialError> {
        match &self.credentials {
            CredentialsFile::ServiceAccount(key) => Ok(vec![
                ("grant_type", JWT_BEARER_GRANT.to_string()),
                ("assertion", self.signed_assertion(key, now)?),
            ]),
            CredentialsFile::AuthorizedUser(AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                ..
            }) => Ok(vec![
                ("grant_type", "refresh_token".to_string()),
                ("client_id", client_id.clone()),
                ("client_secret", client_secret.clone()),
                ("refresh_token", refresh_token.clone()),
            ]),
        }
    }

    fn request_token(&self, now: DateTime<Utc>) -> Result<CachedToken, CredentialError> {
        let params = self.grant_params(now)?;
        let request = self.transport.client().post(&self.token_uri).form(&params);
        let failed = |e: crate::error_handling::types::QueryError| {
            CredentialError::TokenRequestFailed(e.to_string())
        };
        let response: TokenResponse = self
            .transport
            .send(request)
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(failed)?;
        let expires_at = Some(response.expires_in)
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                CredentialError::TokenRequestFailed(format!(
                    "unusable token lifetime: {}",
                    response.expires_in
                ))
            })?;
        Ok(CachedToken {
            value: response.access_token,
            expires_at,
        })
    }
}

impl TokenSource for OAuthTokenSource {
    fn access_token(&mut self) -> Result<String, CredentialError> {
        let now = Utc::now();
        if let Some(cached) = self.cached.as_ref().filter(|c| c.is_fresh(now)) {
            return Ok(cached.value.clone());
        }
        debug!("Requesting access token from {}", self.token_uri);
        let token = self.request_token(now)?;
        info!("Obtained access token valid until {}", token.expires_at.to_rfc3339());
        let value = token.value.clone();
        self.cached = Some(token);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::types::CredentialsFile;

    fn transport() -> Arc<HttpTransport> {
        Arc::new(HttpTransport::new(std::time::Duration::from_secs(5)).unwrap())
    }

    fn authorized_user() -> CredentialsFile {
        CredentialsFile::from_json(
            r#"{"type": "authorized_user", "client_id": "cid", "client_secret": "secret",
                "refresh_token": "refresh"}"#,
        )
        .unwrap()
    }

    #[test]
    fn static_token_is_returned_verbatim() {
        let mut source = StaticToken("ya29.static".into());
        assert_eq!(source.access_token().unwrap(), "ya29.static");
    }

    #[test]
    fn refresh_token_exchange_is_cached() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "refresh".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "ya29.fresh", "expires_in": 3600, "token_type": "Bearer"}"#)
            .expect(1)
            .create();

        let mut source = OAuthTokenSource::new(
            authorized_user(),
            transport(),
            Some(format!("{}/token", server.url())),
        );
        assert_eq!(source.access_token().unwrap(), "ya29.fresh");
        assert_eq!(source.access_token().unwrap(), "ya29.fresh");
        mock.assert();
    }

    #[test]
    fn nearly_expired_token_is_refreshed() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token": "ya29.short", "expires_in": 30}"#)
            .expect(2)
            .create();

        let mut source = OAuthTokenSource::new(
            authorized_user(),
            transport(),
            Some(format!("{}/token", server.url())),
        );
        source.access_token().unwrap();
        source.access_token().unwrap();
        mock.assert();
    }

    #[test]
    fn unusable_lifetime_is_credential_error() {
        for lifetime in ["9223372036854775807", "-5", "0"] {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("POST", "/token")
                .with_status(200)
                .with_body(format!(
                    r#"{{"access_token": "ya29.odd", "expires_in": {}}}"#,
                    lifetime
                ))
                .create();

            let mut source = OAuthTokenSource::new(
                authorized_user(),
                transport(),
                Some(format!("{}/token", server.url())),
            );
            match source.access_token() {
                Err(CredentialError::TokenRequestFailed(msg)) => assert!(msg.contains(lifetime)),
                other => panic!("unexpected result for {}: {:?}", lifetime, other),
            }
        }
    }

    #[test]
    fn rejected_exchange_is_credential_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/token")
            .with_status(401)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create();

        let mut source = OAuthTokenSource::new(
            authorized_user(),
            transport(),
            Some(format!("{}/token", server.url())),
        );
        match source.access_token() {
            Err(CredentialError::TokenRequestFailed(msg)) => assert!(msg.contains("401")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn bad_private_key_fails_to_sign() {
        let creds = CredentialsFile::from_json(
            r#"{"type": "service_account", "private_key": "not a pem",
                "client_email": "reader@example.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        let mut source = OAuthTokenSource::new(creds, transport(), Some("http://127.0.0.1:9/token".into()));
        assert!(matches!(source.access_token(), Err(CredentialError::SigningFailed(_))));
    }

    #[test]
    fn token_uri_defaults() {
        let source = OAuthTokenSource::new(authorized_user(), transport(), None);
        assert_eq!(source.token_uri, DEFAULT_TOKEN_URI);
    }
}
