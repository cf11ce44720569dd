use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use waterfall_core::LogEntry;

use crate::store::{PartitionStore, StoreError};

/// Partition store kept entirely in memory. Used when no log directory is configured.
#[derive(Default)]
pub struct MemoryPartitionStore {
    days: Mutex<BTreeMap<NaiveDate, Vec<LogEntry>>>,
}

impl MemoryPartitionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartitionStore for MemoryPartitionStore {
    async fn append(&self, entry: &LogEntry) -> Result<(), StoreError> {
        self.days
            .lock()
            .await
            .entry(entry.timestamp.date_naive())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn days(&self) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self.days.lock().await.keys().copied().collect())
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self.days.lock().await.get(&day).cloned().unwrap_or_default())
    }

    async fn prune_before(&self, cutoff: NaiveDate) -> Result<usize, StoreError> {
        let mut days = self.days.lock().await;
        let before = days.len();
        days.retain(|day, _| *day >= cutoff);
        Ok(before - days.len())
    }
}
