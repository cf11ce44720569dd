mod memory;
mod trait_store;
mod types;

pub use memory::MemoryPartitionStore;
pub use trait_store::{PartitionStore, StoreError};
pub use types::ExportFormat;
