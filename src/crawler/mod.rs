//! Partitioned crawl over the remote catalog.
//!
//! Walks each language partition page by page, normalizing records and
//! keeping only the first sighting of every id across the whole run.

pub mod backoff;
mod progress;

use std::collections::HashSet;

use tracing::{error, info};

use crate::models::{CategoryMap, Partition, PartitionSpec, RawRecord, Record};
use crate::remote::CatalogSource;
use crate::store::StoreError;

pub use backoff::{BackoffPolicy, PageFetchFailed, PageFetcher};
pub use progress::Progress;

/// Errors that end a crawl.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("Could not retrieve {what}: {reason}")]
    ReferenceDataUnavailable { what: &'static str, reason: String },
    #[error("Failed to save collected records: {0}")]
    Persist(#[from] StoreError),
    #[error("Crawl task ended abnormally: {0}")]
    Aborted(String),
}

/// Summary of a finished crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Partitions walked after intersecting with the live language list.
    pub partitions: usize,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    /// Unique records collected.
    pub records: usize,
}

impl CrawlOutcome {
    /// True when nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

/// Records collected so far plus the ids already seen, scoped to one crawl.
#[derive(Debug, Default)]
struct Accumulator {
    records: Vec<Record>,
    seen: HashSet<i64>,
}

impl Accumulator {
    /// Add records from one page; returns how many were new.
    fn absorb(&mut self, raws: Vec<RawRecord>, partition: &Partition, categories: &CategoryMap) -> usize {
        let mut added = 0;
        for raw in raws {
            if !self.seen.insert(raw.id) {
                continue;
            }
            self.records.push(Record::from_raw(raw, partition, categories));
            added += 1;
        }
        added
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Crawler over any [`CatalogSource`].
pub struct Crawler<S> {
    source: S,
    policy: BackoffPolicy,
}

impl<S: CatalogSource> Crawler<S> {
    pub fn new(source: S, policy: BackoffPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Crawl up to `pages_per_partition` pages of every live partition.
    ///
    /// Fails only when reference data cannot be fetched; page failures are
    /// reported through `progress` and skipped.
    pub async fn crawl(
        &self,
        partitions: &PartitionSpec,
        pages_per_partition: u32,
        progress: &Progress,
    ) -> Result<(Vec<Record>, CrawlOutcome), CrawlError> {
        progress.emit("Starting data collection...");

        let categories = match self.source.fetch_categories().await {
            Ok(map) if !map.is_empty() => map,
            other => return Err(reference_failure("genres", other.err(), progress)),
        };
        let languages = match self.source.fetch_languages().await {
            Ok(map) if !map.is_empty() => map,
            other => return Err(reference_failure("languages", other.err(), progress)),
        };

        let active = partitions.intersect(&languages);
        if active.is_empty() {
            progress.warn("None of the configured languages are known to the service.");
        }
        let total = active.len();
        progress.emit(format!(
            "Collecting data across {} languages and {} pages per language...",
            total, pages_per_partition
        ));

        let fetcher = PageFetcher::new(&self.source, &self.policy);
        let mut acc = Accumulator::default();
        let mut outcome = CrawlOutcome {
            partitions: total,
            ..Default::default()
        };

        for (i, partition) in active.iter().enumerate() {
            progress.emit(format!(
                "Collecting for {} ({}/{})...",
                partition.name,
                i + 1,
                total
            ));

            for page in 1..=pages_per_partition {
                let raws = match fetcher.fetch_page(partition, page, progress).await {
                    Ok(raws) => raws,
                    Err(_) => {
                        outcome.pages_failed += 1;
                        continue;
                    }
                };
                outcome.pages_fetched += 1;

                if raws.is_empty() {
                    progress.emit(format!(
                        "  No more results for {} on page {}.",
                        partition.name, page
                    ));
                    break;
                }

                acc.absorb(raws, partition, &categories);
                progress.emit(format!(
                    "  Fetched page {} for {}. Total unique movies: {}",
                    page,
                    partition.name,
                    acc.len()
                ));
            }
        }

        outcome.records = acc.len();
        info!(
            "Crawl finished: {} records from {} partitions ({} pages, {} failed)",
            outcome.records, outcome.partitions, outcome.pages_fetched, outcome.pages_failed
        );
        Ok((acc.records, outcome))
    }
}

fn reference_failure(
    what: &'static str,
    err: Option<crate::remote::RemoteError>,
    progress: &Progress,
) -> CrawlError {
    let reason = err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "empty response".to_string());
    error!("Could not retrieve {}: {}", what, reason);
    progress.warn(format!(
        "Error: Could not retrieve {}. Data collection failed.",
        what
    ));
    CrawlError::ReferenceDataUnavailable { what, reason }
}
