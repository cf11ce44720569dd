use async_trait::async_trait;
use chrono::NaiveDate;

use waterfall_core::LogEntry;

/// Durable per-UTC-day storage for error-level entries.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Append one entry to the partition of its own (UTC) day.
    async fn append(&self, entry: &LogEntry) -> Result<(), StoreError>;

    /// Days that have a partition, oldest first.
    async fn days(&self) -> Result<Vec<NaiveDate>, StoreError>;

    async fn load_day(&self, day: NaiveDate) -> Result<Vec<LogEntry>, StoreError>;

    /// Remove every partition strictly older than `cutoff`. Returns the number removed.
    async fn prune_before(&self, cutoff: NaiveDate) -> Result<usize, StoreError>;

    /// All persisted entries, oldest partition first, file order within a partition.
    async fn load_all(&self) -> Result<Vec<LogEntry>, StoreError> {
        let mut out = Vec::new();
        for day in self.days().await? {
            out.extend(self.load_day(day).await?);
        }
        Ok(out)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
