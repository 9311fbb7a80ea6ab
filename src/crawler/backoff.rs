//! Per-page fetch policy: courtesy throttling and rate-limit cool-down.
//!
//! A page is requested once. Transport and status failures are reported and
//! handed back as [`PageFetchFailed`] so the crawler can move on. An explicit
//! rate-limit response pauses the crawl for the cool-down and then retries the
//! same page exactly once.

use std::time::Duration;

use tracing::debug;

use super::Progress;
use crate::models::{Partition, RawRecord};
use crate::remote::{CatalogSource, RemoteError};

/// Delay applied after every successful page fetch.
pub const DEFAULT_COURTESY_DELAY: Duration = Duration::from_millis(200);

/// Pause after the service signals rate limiting.
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Timing knobs for page fetching.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub courtesy_delay: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            courtesy_delay: DEFAULT_COURTESY_DELAY,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
        }
    }
}

/// A single page could not be fetched; the crawl continues.
#[derive(Debug, thiserror::Error)]
#[error("Error fetching page {page} for {partition}: {source}")]
pub struct PageFetchFailed {
    pub partition: String,
    pub page: u32,
    #[source]
    pub source: RemoteError,
}

/// Fetches discover pages on behalf of the crawler.
pub struct PageFetcher<'a, S: ?Sized> {
    source: &'a S,
    policy: &'a BackoffPolicy,
}

impl<'a, S: CatalogSource + ?Sized> PageFetcher<'a, S> {
    pub fn new(source: &'a S, policy: &'a BackoffPolicy) -> Self {
        Self { source, policy }
    }

    /// Fetch one page of a partition.
    pub async fn fetch_page(
        &self,
        partition: &Partition,
        page: u32,
        progress: &Progress,
    ) -> Result<Vec<RawRecord>, PageFetchFailed> {
        let result = match self.attempt(partition, page).await {
            Err(e) if e.is_rate_limited() => {
                progress.warn(format!(
                    "  Rate limit hit. Waiting for {} seconds...",
                    self.policy.rate_limit_cooldown.as_secs()
                ));
                tokio::time::sleep(self.policy.rate_limit_cooldown).await;
                debug!("Retrying page {} for {} after cool-down", page, partition.code);
                self.attempt(partition, page).await
            }
            other => other,
        };

        result.map_err(|source| {
            let failed = PageFetchFailed {
                partition: partition.name.clone(),
                page,
                source,
            };
            progress.warn(format!("  {}", failed));
            failed
        })
    }

    async fn attempt(&self, partition: &Partition, page: u32) -> Result<Vec<RawRecord>, RemoteError> {
        let results = self.source.fetch_page(&partition.code, page).await?;
        tokio::time::sleep(self.policy.courtesy_delay).await;
        Ok(results)
    }
}
