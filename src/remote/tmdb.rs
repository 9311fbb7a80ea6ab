//! TMDb implementation of [`CatalogSource`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{CatalogSource, HttpClient, RemoteError, RemoteResult};
use crate::models::{CategoryMap, LanguageMap, RawRecord};

/// Public TMDb v3 API root.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Language {
    #[serde(default)]
    iso_639_1: Option<String>,
    #[serde(default)]
    english_name: Option<String>,
}

/// A discover page without `results` is malformed, not empty.
#[derive(Debug, Deserialize)]
struct DiscoverPage {
    results: Vec<serde_json::Value>,
}

impl DiscoverPage {
    /// Decode each result on its own, skipping entries without a usable id.
    fn into_records(self) -> Vec<RawRecord> {
        self.results
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RawRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping undecodable discover result: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Client for the three TMDb endpoints the crawler needs.
#[derive(Clone)]
pub struct TmdbClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl TmdbClient {
    /// Create a client. Without an API key every request fails with
    /// [`RemoteError::MissingApiKey`] before touching the network.
    pub fn new(http: HttpClient, base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        }
    }

    /// Build an endpoint URL with the api key and extra query parameters.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> RemoteResult<String> {
        let api_key = self.api_key.as_deref().ok_or(RemoteError::MissingApiKey)?;
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", api_key);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    /// URL of one discover page for a language, most popular first.
    pub fn discover_url(&self, language_code: &str, page: u32) -> RemoteResult<String> {
        self.endpoint(
            "discover/movie",
            &[
                ("sort_by", "popularity.desc".to_string()),
                ("language", language_code.to_string()),
                ("page", page.to_string()),
            ],
        )
    }
}

/// Key languages by code, skipping entries without one.
fn language_map(languages: Vec<Language>) -> LanguageMap {
    languages
        .into_iter()
        .filter_map(|l| {
            let code = l.iso_639_1.filter(|c| !c.is_empty())?;
            Some((code, l.english_name.unwrap_or_default()))
        })
        .collect()
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn fetch_categories(&self) -> RemoteResult<CategoryMap> {
        let url = self.endpoint("genre/movie/list", &[])?;
        let list: GenreList = self.http.get(&url).await?.error_for_status()?.json().await?;

        let map: CategoryMap = list.genres.into_iter().map(|g| (g.id, g.name)).collect();
        debug!("Fetched {} genres", map.len());
        Ok(map)
    }

    async fn fetch_languages(&self) -> RemoteResult<LanguageMap> {
        let url = self.endpoint("configuration/languages", &[])?;
        let languages: Vec<Language> =
            self.http.get(&url).await?.error_for_status()?.json().await?;

        let map = language_map(languages);
        debug!("Fetched {} languages", map.len());
        Ok(map)
    }

    async fn fetch_page(&self, language_code: &str, page: u32) -> RemoteResult<Vec<RawRecord>> {
        let url = self.discover_url(language_code, page)?;
        let page: DiscoverPage = self.http.get(&url).await?.error_for_status()?.json().await?;
        Ok(page.into_records())
    }
}
