//! Data models for reelscout.

mod record;
mod reference;

pub use record::{RawRecord, Record, UNKNOWN_CATEGORY};
pub use reference::{CategoryMap, LanguageIndex, LanguageMap, Partition, PartitionSpec};
