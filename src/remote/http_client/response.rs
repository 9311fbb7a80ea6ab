//! HTTP response wrapper.

use std::collections::HashMap;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::remote::RemoteError;

/// HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub(crate) url: String,
    pub(crate) response: Response,
}

impl HttpResponse {
    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the server explicitly asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        is_rate_limit_status(self.status)
    }

    /// Get the Retry-After header.
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get("retry-after").map(|s| s.as_str())
    }

    /// Turn a non-success status into the matching error.
    pub fn error_for_status(self) -> Result<Self, RemoteError> {
        if self.is_rate_limited() {
            debug!(
                "Rate limited by {} (retry-after: {})",
                self.url,
                self.retry_after().unwrap_or("unset")
            );
            Err(RemoteError::RateLimited { url: self.url })
        } else if !self.is_success() {
            Err(RemoteError::Status {
                status: self.status.as_u16(),
                url: self.url,
            })
        } else {
            Ok(self)
        }
    }

    /// Read the body and decode it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, RemoteError> {
        let url = self.url;
        let text = self.response.text().await?;
        serde_json::from_str(&text).map_err(|source| RemoteError::Decode { url, source })
    }
}

/// Only 429 is treated as an explicit rate-limit signal; 503 and other
/// server errors are ordinary transient failures.
pub fn is_rate_limit_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
}
