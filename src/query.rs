//! Top-N suggestions from a loaded table.

use crate::models::Record;

/// Maximum number of records a query returns.
pub const TOP_N: usize = 20;

/// Records fetched for `language_code` that carry `category_name`, most
/// popular first, at most [`TOP_N`].
///
/// Ties keep their table order. Duplicate ids in the table are not collapsed.
pub fn query(table: &[Record], language_code: &str, category_name: &str) -> Vec<Record> {
    let mut matches: Vec<&Record> = table
        .iter()
        .filter(|r| r.fetched_partition_code == language_code && r.has_category(category_name))
        .collect();

    // sort_by is stable
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.into_iter().take(TOP_N).cloned().collect()
}
