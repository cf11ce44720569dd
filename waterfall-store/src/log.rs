use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use waterfall_core::{
    analyze, statistics, ErrorAnalysis, LogEntry, LogFilter, LogLevel, LogStatistics,
    NewLogEntry, ResilienceConfig, TimeRange,
};

use crate::fs::{write_export, DailyFileStore};
use crate::store::{ExportFormat, PartitionStore, StoreError};

#[derive(Debug, Clone)]
pub struct ErrorLogConfig {
    /// Entries below this level are dropped on `record`.
    pub min_level: LogLevel,
    /// In-memory bound; the oldest entries are evicted first.
    pub max_entries: usize,
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            max_entries: 10_000,
        }
    }
}

impl From<&ResilienceConfig> for ErrorLogConfig {
    fn from(cfg: &ResilienceConfig) -> Self {
        Self {
            min_level: cfg.log_level,
            max_entries: cfg.max_log_entries,
        }
    }
}

/// Append-only, bounded log of failure and recovery events.
///
/// Error-level entries are also written to a [`PartitionStore`] as they are recorded, so they
/// outlive in-memory eviction and pruning.
pub struct ErrorLog {
    config: ErrorLogConfig,
    entries: Mutex<VecDeque<LogEntry>>,
    partitions: Arc<dyn PartitionStore>,
}

impl ErrorLog {
    pub fn new(config: ErrorLogConfig, partitions: Arc<dyn PartitionStore>) -> Self {
        Self {
            config,
            entries: Mutex::new(VecDeque::new()),
            partitions,
        }
    }

    /// Error log persisting into daily files under `cfg.log_dir`.
    pub fn from_config(cfg: &ResilienceConfig) -> Self {
        Self::new(
            ErrorLogConfig::from(cfg),
            Arc::new(DailyFileStore::new(cfg.log_dir.clone())),
        )
    }

    pub fn config(&self) -> &ErrorLogConfig {
        &self.config
    }

    pub fn partitions(&self) -> &Arc<dyn PartitionStore> {
        &self.partitions
    }

    /// Append an entry. Returns `None` when the level is below the configured minimum.
    pub async fn record(&self, new: NewLogEntry) -> Option<LogEntry> {
        if new.level < self.config.min_level {
            return None;
        }
        let entry = new.into_entry(Utc::now());

        if entry.is_error() {
            if let Err(e) = self.partitions.append(&entry).await {
                tracing::warn!(entry_id = %entry.id, error = %e, "failed to persist error entry");
            }
        }

        tracing::debug!(
            entry_id = %entry.id,
            level = %entry.level,
            category = %entry.category,
            "recorded log entry"
        );
        self.push(vec![entry.clone()]).await;
        Some(entry)
    }

    /// Load previously persisted entries into the buffer without persisting them again.
    /// `entries` are expected oldest first, as partitions store them; equal timestamps keep
    /// their given order.
    pub async fn restore(&self, mut entries: Vec<LogEntry>) {
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        self.push(entries).await;
    }

    /// Load the contents of an export file, which lists entries newest first.
    pub async fn restore_export(&self, mut entries: Vec<LogEntry>) {
        entries.reverse();
        self.restore(entries).await;
    }

    async fn push(&self, batch: Vec<LogEntry>) {
        let mut buf = self.entries.lock().await;
        buf.extend(batch);
        while buf.len() > self.config.max_entries {
            buf.pop_front();
        }
    }

    /// Matching entries, newest first.
    pub async fn query(&self, filter: &LogFilter) -> Vec<LogEntry> {
        let buf = self.entries.lock().await;
        filter.apply(buf.iter())
    }

    /// Every buffered entry in insertion order.
    pub async fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn analyze(&self, range: Option<TimeRange>) -> ErrorAnalysis {
        analyze(&self.snapshot().await, range)
    }

    pub async fn statistics(&self) -> LogStatistics {
        statistics(&self.snapshot().await)
    }

    /// Write the filtered, newest-first entries to a file under `dir`.
    pub async fn export(
        &self,
        format: ExportFormat,
        filter: &LogFilter,
        dir: &Path,
    ) -> Result<PathBuf, StoreError> {
        let entries = self.query(filter).await;
        let path = write_export(&entries, format, dir).await?;
        tracing::info!(path = %path.display(), entries = entries.len(), %format, "exported log");
        Ok(path)
    }

    /// Drop in-memory entries older than `older_than_days`; `0` clears everything.
    /// Durable partitions are left untouched. Returns the number of entries removed.
    pub async fn prune(&self, older_than_days: u32) -> usize {
        let mut buf = self.entries.lock().await;
        let before = buf.len();
        if older_than_days == 0 {
            buf.clear();
        } else {
            let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
            buf.retain(|e| e.timestamp >= cutoff);
        }
        before - buf.len()
    }
}
