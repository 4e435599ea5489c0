//! Blocking HTTP transport.
//!
//! The public API of this crate is synchronous, so the transport owns a
//! current-thread tokio runtime and drives one `reqwest` future at a time
//! with `block_on`. The runtime and client are shared (behind an `Arc`)
//! between the token source and the logging client.

use log::{debug, trace};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error_handling::types::QueryError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const BODY_EXCERPT_LEN: usize = 512;

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The first few hundred characters of the body, for error messages.
    pub fn excerpt(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        text.chars().take(BODY_EXCERPT_LEN).collect()
    }

    /// Maps non-2xx statuses onto [`QueryError`].
    pub fn error_for_status(self) -> Result<Self, QueryError> {
        if self.status.is_success() {
            return Ok(self);
        }
        if self.status == StatusCode::TOO_MANY_REQUESTS {
            return Err(QueryError::RateLimited(self.excerpt()));
        }
        Err(QueryError::Status {
            code: self.status.as_u16(),
            body: self.excerpt(),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, QueryError> {
        serde_json::from_slice(&self.body).map_err(|e| QueryError::Decode(e.to_string()))
    }
}

pub struct HttpTransport {
    rt: tokio::runtime::Runtime,
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, QueryError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| QueryError::RuntimeUnavailable(e.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Transport(e.to_string()))?;
        debug!("HTTP transport ready (timeout {:?})", timeout);
        Ok(Self { rt, client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends the request and waits for the whole body.
    pub fn send(&self, request: RequestBuilder) -> Result<HttpResponse, QueryError> {
        self.rt.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|e| QueryError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| QueryError::Transport(e.to_string()))?
                .to_vec();
            trace!("HTTP {} with {} byte(s)", status, body.len());
            Ok(HttpResponse { status, body })
        })
    }
}
