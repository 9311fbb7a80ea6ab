//! HTTP client with request timing and header capture.

mod response;

pub use response::{is_rate_limit_status, HttpResponse};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use tracing::debug;

use super::RemoteError;

/// Default user agent for catalog requests.
pub const USER_AGENT: &str = concat!("reelscout/", env!("CARGO_PKG_VERSION"));

/// Resolve user agent from config value: `None` uses [`USER_AGENT`].
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

fn extract_response_headers(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

/// Thin wrapper over `reqwest::Client` shared by all catalog requests.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request. Only transport failures are errors here; the
    /// status is left for the caller to interpret.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, RemoteError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let duration = start.elapsed();

        debug!(
            "GET {} -> HTTP {} in {}ms",
            redact_api_key(url),
            response.status().as_u16(),
            duration.as_millis()
        );

        Ok(HttpResponse {
            status: response.status(),
            headers: extract_response_headers(&response),
            url: redact_api_key(url),
            response,
        })
    }
}

/// Replace the `api_key` query value so URLs can be logged and surfaced in errors.
pub fn redact_api_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    if k == "api_key" {
                        (k.into_owned(), "***".to_string())
                    } else {
                        (k.into_owned(), v.into_owned())
                    }
                })
                .collect();
            if pairs.is_empty() {
                return url.to_string();
            }
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}
