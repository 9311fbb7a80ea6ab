//! Remote catalog access.
//!
//! [`CatalogSource`] is the seam between the crawler and the remote service:
//! [`TmdbClient`] talks HTTP, tests substitute a scripted source.

pub mod http_client;
mod tmdb;

use async_trait::async_trait;

use crate::models::{CategoryMap, LanguageMap, RawRecord};

pub use http_client::HttpClient;
pub use tmdb::{TmdbClient, DEFAULT_BASE_URL};

/// Result type for remote catalog operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors from the remote catalog.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Rate limited by {url}")]
    RateLimited { url: String },
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("No TMDb API key configured (set TMDB_API_KEY or api_key in the config file)")]
    MissingApiKey,
}

impl RemoteError {
    /// Whether this is an explicit rate-limit signal from the service.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteError::RateLimited { .. })
    }
}

/// Read-only access to the remote catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the genre id to name table.
    async fn fetch_categories(&self) -> RemoteResult<CategoryMap>;

    /// Fetch the full language code to name table.
    async fn fetch_languages(&self) -> RemoteResult<LanguageMap>;

    /// Fetch one discover page for a language.
    async fn fetch_page(&self, language_code: &str, page: u32) -> RemoteResult<Vec<RawRecord>>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for std::sync::Arc<T> {
    async fn fetch_categories(&self) -> RemoteResult<CategoryMap> {
        (**self).fetch_categories().await
    }

    async fn fetch_languages(&self) -> RemoteResult<LanguageMap> {
        (**self).fetch_languages().await
    }

    async fn fetch_page(&self, language_code: &str, page: u32) -> RemoteResult<Vec<RawRecord>> {
        (**self).fetch_page(language_code, page).await
    }
}
