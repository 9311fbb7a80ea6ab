//! Catalog records: the raw remote shape and the normalized row.

use serde::Deserialize;

use super::{CategoryMap, Partition};

/// Name used for a genre id missing from the category map.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// One entry of a discover page as returned by the remote service.
///
/// Only `id` is required; every other field falls back to its default when
/// absent or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A normalized catalog record, one row of the persisted table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Identity key used for deduplication within a crawl.
    pub id: i64,
    pub title: String,
    pub original_language: String,
    /// Partition (language) in which this record was first seen.
    pub fetched_partition_code: String,
    pub fetched_partition_name: String,
    pub category_ids: Vec<i64>,
    /// Names resolved from `category_ids` at ingestion time.
    pub category_names: Vec<String>,
    /// Popularity, the ranking key for queries.
    pub score: f64,
    /// Average vote.
    pub rating: f64,
    pub release_date: String,
    pub summary: String,
}

impl Record {
    /// Normalize a raw record discovered in `partition`.
    pub fn from_raw(raw: RawRecord, partition: &Partition, categories: &CategoryMap) -> Self {
        let category_names = raw
            .genre_ids
            .iter()
            .map(|id| categories.name_or_unknown(*id).to_string())
            .collect();

        Self {
            id: raw.id,
            title: raw.title,
            original_language: raw.original_language,
            fetched_partition_code: partition.code.clone(),
            fetched_partition_name: partition.name.clone(),
            category_ids: raw.genre_ids,
            category_names,
            score: raw.popularity,
            rating: raw.vote_average,
            release_date: raw.release_date,
            summary: raw.overview,
        }
    }

    /// Check whether this record carries the given category name.
    pub fn has_category(&self, name: &str) -> bool {
        self.category_names.iter().any(|c| c == name)
    }
}
