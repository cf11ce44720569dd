use std::sync::Arc;

use async_trait::async_trait;

/// Lifecycle notifications from the orchestrator.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    OperationStarted {
        operation: String,
    },
    AttemptFailed {
        operation: String,
        attempt_no: u32,
        error: String,
    },
    RetryScheduled {
        operation: String,
        attempt_no: u32,
        delay_ms: u64,
    },
    OperationSucceeded {
        operation: String,
        attempts: u32,
    },
    FallbackStarted {
        operation: String,
        fallback_no: usize,
    },
    FallbackFailed {
        operation: String,
        fallback_no: usize,
        error: String,
    },
    Recovered {
        operation: String,
        method: String,
    },
    OperationFailed {
        operation: String,
        attempts: u32,
        fallbacks_attempted: usize,
    },
    BatchStarted {
        total: usize,
    },
    BatchFinished {
        successful: usize,
        failed: usize,
        skipped: usize,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::OperationStarted { .. } => "operation.started",
            Event::AttemptFailed { .. } => "attempt.failed",
            Event::RetryScheduled { .. } => "retry.scheduled",
            Event::OperationSucceeded { .. } => "operation.succeeded",
            Event::FallbackStarted { .. } => "fallback.started",
            Event::FallbackFailed { .. } => "fallback.failed",
            Event::Recovered { .. } => "operation.recovered",
            Event::OperationFailed { .. } => "operation.failed",
            Event::BatchStarted { .. } => "batch.started",
            Event::BatchFinished { .. } => "batch.finished",
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// One JSON object per line on stderr, leaving stdout to the caller's own output.
pub struct StderrEventSink;

#[async_trait]
impl EventSink for StderrEventSink {
    async fn emit(&self, event: Event) {
        eprintln!("{}", serde_json::to_string(&event).unwrap_or_default());
    }
}

/// Forwards events as `debug` records under the `waterfall::events` target.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        tracing::debug!(
            target: "waterfall::events",
            event = event.kind(),
            %payload,
            "orchestrator event"
        );
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}

/// Keeps every event in memory; handy for assertions.
#[derive(Default)]
pub struct RecordingEventSink {
    events: tokio::sync::Mutex<Vec<Event>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event: Event) {
        self.events.lock().await.push(event);
    }
}
