//! Reference data: genre and language lookup tables, crawl partitions.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::record::UNKNOWN_CATEGORY;

/// Genre id to genre name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMap(BTreeMap<i64, String>);

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.0.get(&id).map(|s| s.as_str())
    }

    /// Resolve a genre id, falling back to [`UNKNOWN_CATEGORY`].
    pub fn name_or_unknown(&self, id: i64) -> &str {
        self.get(id).unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Sorted, deduplicated genre names.
    pub fn sorted_names(&self) -> Vec<String> {
        self.0
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i64, String)> for CategoryMap {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Language code to English language name. Codes are unique, names are not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageMap(BTreeMap<String, String>);

impl LanguageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Empty codes are ignored.
    pub fn insert(&mut self, code: String, name: String) {
        if !code.is_empty() {
            self.0.insert(code, name);
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for LanguageMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (code, name) in iter {
            map.insert(code, name);
        }
        map
    }
}

/// A language partition of the crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub code: String,
    pub name: String,
}

impl Partition {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Ordered set of partitions to crawl.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionSpec(Vec<Partition>);

impl PartitionSpec {
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self(partitions)
    }

    /// Keep only partitions whose code exists in the live language map,
    /// preserving configured order.
    pub fn intersect(&self, languages: &LanguageMap) -> PartitionSpec {
        let kept = self
            .0
            .iter()
            .filter(|p| {
                let live = languages.contains(&p.code);
                if !live {
                    tracing::debug!("Dropping partition {} ({}): not offered remotely", p.code, p.name);
                }
                live
            })
            .cloned()
            .collect();
        PartitionSpec(kept)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Partition> for PartitionSpec {
    fn from_iter<I: IntoIterator<Item = Partition>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Display names for languages with an unambiguous reverse lookup.
///
/// Names shared by several codes are shown as `"{name} ({code})"` for every
/// colliding entry, so each display name maps back to exactly one code.
#[derive(Debug, Clone, Default)]
pub struct LanguageIndex {
    names: Vec<String>,
    by_name: HashMap<String, String>,
    codes: BTreeSet<String>,
}

impl LanguageIndex {
    pub fn new(languages: &LanguageMap) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (_, name) in languages.iter() {
            *counts.entry(name).or_default() += 1;
        }

        let mut by_name = HashMap::new();
        let mut codes = BTreeSet::new();
        for (code, name) in languages.iter() {
            let display = if counts.get(name).copied().unwrap_or(0) > 1 {
                format!("{} ({})", name, code)
            } else {
                name.to_string()
            };
            by_name.insert(display, code.to_string());
            codes.insert(code.to_string());
        }

        let mut names: Vec<String> = by_name.keys().cloned().collect();
        names.sort();

        Self {
            names,
            by_name,
            codes,
        }
    }

    /// Sorted display names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Language code for a display name, or the input itself if it is a known code.
    pub fn resolve(&self, name_or_code: &str) -> Option<&str> {
        if let Some(code) = self.by_name.get(name_or_code) {
            return Some(code.as_str());
        }
        self.codes.get(name_or_code).map(|c| c.as_str())
    }

    /// "English" when available, otherwise the first display name.
    pub fn default_name(&self) -> Option<&str> {
        if self.by_name.contains_key("English") {
            Some("English")
        } else {
            self.names.first().map(|s| s.as_str())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
