//! Process exit codes, stable for CI scripts.

pub const SUCCESS: i32 = 0;
/// Unparseable or invalid config, plan or filter.
pub const VALIDATION_FAILED: i32 = 2;
/// The run finished but at least one operation failed outright.
pub const RUN_FAILED: i32 = 3;
/// I/O and other environment failures.
pub const RUNTIME_ERROR: i32 = 4;
