use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use waterfall_core::LogEntry;

use crate::store::{PartitionStore, StoreError};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// One JSON array file per UTC day, named `<YYYY-MM-DD>.json`.
pub struct DailyFileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles on partition files.
    write_lock: Mutex<()>,
}

impl DailyFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", day.format(DAY_FORMAT)))
    }

    async fn read_partition(path: &Path) -> Result<Vec<LogEntry>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PartitionStore for DailyFileStore {
    async fn append(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(entry.timestamp.date_naive());
        let mut entries = Self::read_partition(&path).await?;
        entries.push(entry.clone());

        // Write-then-rename so a crash never leaves a truncated partition behind.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&entries)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn days(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut rd = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut days = Vec::new();
        while let Some(item) = rd.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(day) = NaiveDate::parse_from_str(stem, DAY_FORMAT) {
                days.push(day);
            }
        }
        days.sort();
        Ok(days)
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Vec<LogEntry>, StoreError> {
        Self::read_partition(&self.path_for(day)).await
    }

    async fn prune_before(&self, cutoff: NaiveDate) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut removed = 0;
        for day in self.days().await? {
            if day < cutoff {
                tokio::fs::remove_file(self.path_for(day)).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
