use std::collections::BTreeMap;

use crate::types::{Category, LogEntry};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrendBucket {
    /// `YYYY-MM-DDTHH` in UTC.
    pub hour: String,
    pub errors: usize,
    pub recoveries: usize,
    /// Error-level entries per category.
    pub by_category: BTreeMap<Category, usize>,
}

pub fn hourly_trends(entries: &[&LogEntry]) -> Vec<TrendBucket> {
    // The key format sorts lexicographically in chronological order.
    let mut buckets: BTreeMap<String, TrendBucket> = BTreeMap::new();
    for e in entries {
        let hour = e.timestamp.format("%Y-%m-%dT%H").to_string();
        let bucket = buckets.entry(hour.clone()).or_insert_with(|| TrendBucket {
            hour,
            errors: 0,
            recoveries: 0,
            by_category: BTreeMap::new(),
        });
        if e.is_error() {
            bucket.errors += 1;
            *bucket.by_category.entry(e.category).or_insert(0) += 1;
        }
        if e.is_successful_recovery() {
            bucket.recoveries += 1;
        }
    }
    buckets.into_values().collect()
}
