mod export;
mod partition;

pub use export::{claim_paths, file_stamp, import_json, render_export, write_export};
pub use partition::DailyFileStore;
