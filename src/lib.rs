//! reelscout - collect popular movies from TMDb and browse them by language
//! and genre.
//!
//! A crawl walks TMDb's discover listing for a configured set of languages,
//! deduplicates the results, and stores them as a flat CSV table that later
//! queries read back offline.

pub mod cli;
pub mod config;
pub mod crawler;
pub mod models;
pub mod query;
pub mod remote;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use service::{Catalog, CrawlHandle, CrawlReport};
