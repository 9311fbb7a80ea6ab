//! Scripted catalog source for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{CategoryMap, LanguageMap, RawRecord, Record};
use crate::remote::{CatalogSource, RemoteError, RemoteResult};

/// Scripted reply for one page request.
#[derive(Debug, Clone)]
pub enum Reply {
    Records(Vec<RawRecord>),
    RateLimited,
    ServerError,
    /// A 200 whose body is not a discover page.
    Malformed,
}

/// In-memory catalog that replays scripted pages and records every request.
///
/// Pages without a script return no results.
pub struct ScriptedSource {
    categories: Option<CategoryMap>,
    languages: Option<LanguageMap>,
    pages: Mutex<HashMap<(String, u32), VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            categories: Some(CategoryMap::from_iter([
                (28, "Action".to_string()),
                (18, "Drama".to_string()),
                (35, "Comedy".to_string()),
            ])),
            languages: Some(LanguageMap::from_iter([
                ("en".to_string(), "English".to_string()),
                ("fr".to_string(), "French".to_string()),
                ("hi".to_string(), "Hindi".to_string()),
            ])),
            pages: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for a page; repeated calls queue successive replies.
    pub fn page(self, code: &str, page: u32, reply: Reply) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry((code.to_string(), page))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn categories(mut self, categories: Option<CategoryMap>) -> Self {
        self.categories = categories;
        self
    }

    pub fn languages(mut self, languages: Option<LanguageMap>) -> Self {
        self.languages = languages;
        self
    }

    /// Page requests issued so far, in order.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

fn unavailable(what: &str) -> RemoteError {
    RemoteError::Status {
        status: 500,
        url: format!("scripted://{}", what),
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn fetch_categories(&self) -> RemoteResult<CategoryMap> {
        self.categories.clone().ok_or_else(|| unavailable("genres"))
    }

    async fn fetch_languages(&self) -> RemoteResult<LanguageMap> {
        self.languages.clone().ok_or_else(|| unavailable("languages"))
    }

    async fn fetch_page(&self, language_code: &str, page: u32) -> RemoteResult<Vec<RawRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push((language_code.to_string(), page));

        let reply = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&(language_code.to_string(), page))
            .and_then(|queue| queue.pop_front());

        match reply {
            None => Ok(Vec::new()),
            Some(Reply::Records(records)) => Ok(records),
            Some(Reply::RateLimited) => Err(RemoteError::RateLimited {
                url: format!("scripted://discover/{}/{}", language_code, page),
            }),
            Some(Reply::ServerError) => Err(unavailable("discover")),
            Some(Reply::Malformed) => Err(RemoteError::Decode {
                url: format!("scripted://discover/{}/{}", language_code, page),
                source: serde_json::from_str::<Vec<RawRecord>>(r#"{"status_code": 25}"#)
                    .unwrap_err(),
            }),
        }
    }
}

/// Raw record with the given id and genre ids.
pub fn raw(id: i64, genre_ids: &[i64]) -> RawRecord {
    RawRecord {
        id,
        title: format!("Movie {}", id),
        original_language: "en".to_string(),
        genre_ids: genre_ids.to_vec(),
        popularity: id as f64,
        vote_average: 5.0,
        release_date: "2020-01-01".to_string(),
        overview: String::new(),
    }
}

/// Normalized record for query and store tests.
pub fn record(id: i64, language: &str, categories: &[&str], score: f64) -> Record {
    Record {
        id,
        title: format!("Movie {}", id),
        original_language: language.to_string(),
        fetched_partition_code: language.to_string(),
        fetched_partition_name: language.to_uppercase(),
        category_ids: (0..categories.len() as i64).collect(),
        category_names: categories.iter().map(|c| c.to_string()).collect(),
        score,
        rating: 6.5,
        release_date: "2021-05-01".to_string(),
        summary: format!("Summary of {}, with \"quotes\"", id),
    }
}
