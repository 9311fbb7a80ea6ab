//! Catalog facade used by front ends.
//!
//! Loads the persisted table, lists what can be queried, runs crawls in the
//! background and answers queries against a loaded snapshot.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::Settings;
use crate::crawler::{BackoffPolicy, CrawlError, CrawlOutcome, Crawler, Progress};
use crate::models::{LanguageIndex, PartitionSpec, Record};
use crate::query;
use crate::remote::{CatalogSource, HttpClient, RemoteError, TmdbClient};
use crate::store::{SaveOutcome, StoreError, TableStore};

/// Result of a finished background crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub saved: SaveOutcome,
}

/// Handle to a crawl running on its own task. Await it for the report.
pub struct CrawlHandle {
    task: JoinHandle<Result<CrawlReport, CrawlError>>,
}

impl Future for CrawlHandle {
    type Output = Result<CrawlReport, CrawlError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(CrawlError::Aborted(e.to_string())),
        })
    }
}

/// Entry point for everything a front end needs.
pub struct Catalog<S = TmdbClient> {
    source: Arc<S>,
    store: TableStore,
    partitions: PartitionSpec,
    pages_per_partition: u32,
    policy: BackoffPolicy,
}

impl Catalog<TmdbClient> {
    /// Build a catalog backed by TMDb from resolved settings.
    ///
    /// A missing API key is not an error here; the table can still be read
    /// and queried offline.
    pub fn from_settings(settings: &Settings) -> Result<Self, RemoteError> {
        let http = HttpClient::new(settings.request_timeout(), settings.user_agent.as_deref())?;
        let client = TmdbClient::new(http, &settings.base_url, settings.api_key.as_deref());

        Ok(Self::new(
            client,
            TableStore::new(settings.table_path()),
            settings.partition_spec(),
            settings.pages_per_language,
            settings.backoff_policy(),
        ))
    }
}

impl<S: CatalogSource + 'static> Catalog<S> {
    pub fn new(
        source: S,
        store: TableStore,
        partitions: PartitionSpec,
        pages_per_partition: u32,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            source: Arc::new(source),
            store,
            partitions,
            pages_per_partition,
            policy,
        }
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    pub fn pages_per_partition(&self) -> u32 {
        self.pages_per_partition
    }

    /// Override the number of pages fetched per language.
    pub fn set_pages_per_partition(&mut self, pages: u32) {
        self.pages_per_partition = pages;
    }

    /// Load the persisted table, `None` when nothing has been collected yet.
    pub fn load_table(&self) -> Result<Option<Vec<Record>>, StoreError> {
        self.store.load()
    }

    /// Sorted unique genre names present in `table`.
    ///
    /// Falls back to the live genre list when the table is missing or has no
    /// genres at all.
    pub async fn list_available_categories(
        &self,
        table: Option<&[Record]>,
    ) -> Result<Vec<String>, RemoteError> {
        let from_table: BTreeSet<&str> = table
            .unwrap_or_default()
            .iter()
            .flat_map(|r| r.category_names.iter().map(String::as_str))
            .collect();

        if !from_table.is_empty() {
            return Ok(from_table.into_iter().map(str::to_string).collect());
        }

        debug!("No genres in table, using live genre list");
        Ok(self.source.fetch_categories().await?.sorted_names())
    }

    /// Selectable language names from the live language list.
    pub async fn list_available_languages(&self) -> Result<LanguageIndex, RemoteError> {
        let languages = self.source.fetch_languages().await?;
        Ok(LanguageIndex::new(&languages))
    }

    /// Start a crawl on a background task and save whatever it collects.
    pub fn start_crawl(&self, progress: Progress) -> CrawlHandle {
        let crawler = Crawler::new(Arc::clone(&self.source), self.policy.clone());
        let store = self.store.clone();
        let partitions = self.partitions.clone();
        let pages = self.pages_per_partition;

        let task = tokio::spawn(async move {
            let (records, outcome) = crawler.crawl(&partitions, pages, &progress).await?;

            if outcome.is_empty() {
                progress.warn("No movie data collected.");
                return Ok(CrawlReport {
                    outcome,
                    saved: SaveOutcome::Skipped,
                });
            }

            let saved = match store.save(&records) {
                Ok(saved) => saved,
                Err(e) => {
                    error!("{}", e);
                    progress.warn(format!("Error saving collected data: {}", e));
                    return Err(CrawlError::Persist(e));
                }
            };

            progress.emit(format!(
                "Successfully collected {} unique movies and saved to {}",
                outcome.records,
                store.path().display()
            ));
            Ok(CrawlReport { outcome, saved })
        });

        CrawlHandle { task }
    }

    /// Top matches for a language code and genre name.
    pub fn query(&self, table: &[Record], language_code: &str, category_name: &str) -> Vec<Record> {
        query::query(table, language_code, category_name)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{CategoryMap, Partition};
    use crate::testing::{raw, record, Reply, ScriptedSource};

    fn catalog(source: ScriptedSource, dir: &tempfile::TempDir) -> Catalog<ScriptedSource> {
        Catalog::new(
            source,
            TableStore::new(dir.path().join("movies.csv")),
            PartitionSpec::new(vec![
                Partition::new("en", "English"),
                Partition::new("fr", "French"),
            ]),
            2,
            BackoffPolicy {
                courtesy_delay: Duration::ZERO,
                rate_limit_cooldown: Duration::ZERO,
            },
        )
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(m) = rx.try_recv() {
            messages.push(m);
        }
        messages
    }

    #[tokio::test]
    async fn test_crawl_saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new()
            .page("en", 1, Reply::Records(vec![raw(1, &[28]), raw(2, &[18, 99])]))
            .page("fr", 1, Reply::Records(vec![raw(3, &[28])]));
        let catalog = catalog(source, &dir);
        assert!(catalog.load_table().unwrap().is_none());

        let (progress, mut rx) = Progress::channel();
        let report = catalog.start_crawl(progress).await.unwrap();

        assert_eq!(report.outcome.records, 3);
        assert_eq!(
            report.saved,
            SaveOutcome::Written {
                path: catalog.store().path().to_path_buf(),
                rows: 3
            }
        );

        let table = catalog.load_table().unwrap().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[1].category_names, vec!["Drama", "Unknown"]);

        let top: Vec<i64> = catalog.query(&table, "en", "Drama").iter().map(|r| r.id).collect();
        assert_eq!(top, vec![2]);

        let messages = drain(&mut rx);
        assert_eq!(messages.first().unwrap(), "Starting data collection...");
        assert_eq!(
            messages.last().unwrap(),
            &format!(
                "Successfully collected 3 unique movies and saved to {}",
                catalog.store().path().display()
            )
        );
    }

    #[tokio::test]
    async fn test_empty_crawl_keeps_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(ScriptedSource::new(), &dir);
        catalog
            .store()
            .save(&[record(42, "en", &["Action"], 1.0)])
            .unwrap();

        let (progress, mut rx) = Progress::channel();
        let report = catalog.start_crawl(progress).await.unwrap();

        assert!(report.outcome.is_empty());
        assert_eq!(report.saved, SaveOutcome::Skipped);
        assert_eq!(catalog.load_table().unwrap().unwrap()[0].id, 42);
        assert!(drain(&mut rx).contains(&"No movie data collected.".to_string()));
    }

    #[tokio::test]
    async fn test_crawl_without_reference_data_fails() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(ScriptedSource::new().languages(None), &dir);

        let err = catalog.start_crawl(Progress::silent()).await.unwrap_err();
        assert!(matches!(
            err,
            CrawlError::ReferenceDataUnavailable {
                what: "languages",
                ..
            }
        ));
        assert!(!catalog.store().exists());
    }

    #[tokio::test]
    async fn test_categories_prefer_table() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(ScriptedSource::new(), &dir);
        let table = vec![
            record(1, "en", &["Thriller", "Drama"], 1.0),
            record(2, "fr", &["Drama"], 1.0),
        ];

        let names = catalog.list_available_categories(Some(&table)).await.unwrap();
        assert_eq!(names, vec!["Drama", "Thriller"]);
    }

    #[tokio::test]
    async fn test_categories_fall_back_to_live_list() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(ScriptedSource::new(), &dir);

        let names = catalog.list_available_categories(None).await.unwrap();
        assert_eq!(names, vec!["Action", "Comedy", "Drama"]);

        let no_genres = vec![record(1, "en", &[], 1.0)];
        let names = catalog
            .list_available_categories(Some(&no_genres))
            .await
            .unwrap();
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn test_categories_propagate_remote_failure() {
        let dir = tempfile::tempdir().unwrap();
        let empty = catalog(
            ScriptedSource::new().categories(Some(CategoryMap::new())),
            &dir,
        );
        assert!(empty.list_available_categories(None).await.unwrap().is_empty());

        let failing = catalog(ScriptedSource::new().categories(None), &dir);
        assert!(failing.list_available_categories(None).await.is_err());
    }

    #[tokio::test]
    async fn test_languages_index() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(ScriptedSource::new(), &dir);

        let index = catalog.list_available_languages().await.unwrap();
        assert_eq!(index.names().to_vec(), vec!["English", "French", "Hindi"]);
        assert_eq!(index.resolve("Hindi"), Some("hi"));
        assert_eq!(index.default_name(), Some("English"));
    }

    #[tokio::test]
    async fn test_from_settings_without_api_key_still_reads_table() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_data_dir(dir.path().to_path_buf());
        let catalog = Catalog::from_settings(&settings).unwrap();

        assert_eq!(catalog.pages_per_partition(), 10);
        assert_eq!(catalog.store().path(), dir.path().join("movies.csv"));
        assert!(catalog.load_table().unwrap().is_none());
        assert!(matches!(
            catalog.list_available_languages().await,
            Err(RemoteError::MissingApiKey)
        ));
    }
}
