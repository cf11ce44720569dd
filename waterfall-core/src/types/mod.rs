mod category;
mod context;
mod entry;
mod filter;
mod level;

pub use category::Category;
pub use context::{ContextHints, ExecutionContext};
pub use entry::{ErrorInfo, LogEntry, LogMetadata, NewLogEntry};
pub use filter::{LogFilter, TimeRange};
pub use level::LogLevel;
