#![forbid(unsafe_code)]

pub mod fs;
pub mod log;
pub mod store;

pub use crate::fs::{
    claim_paths, file_stamp, import_json, render_export, write_export, DailyFileStore,
};
pub use crate::log::{ErrorLog, ErrorLogConfig};
pub use crate::store::{ExportFormat, MemoryPartitionStore, PartitionStore, StoreError};
