mod batch;
pub mod events;
pub mod metrics;
mod operation;
mod orchestrator;
mod result;
mod types;

pub use events::{
    CompositeEventSink, Event, EventSink, NoOpEventSink, RecordingEventSink, StderrEventSink,
    TracingEventSink,
};
pub use metrics::{HandlerStats, StatsCollector};
pub use operation::{operation_fn, OpFuture, OperationDescriptor, OperationError, OperationFn};
pub use orchestrator::ResilientOrchestrator;
pub use result::{BatchErrorSummary, BatchResult, ExecutionError, ExecutionResult};
pub use types::ExecutorConfig;

pub(crate) use operation::run_guarded;
