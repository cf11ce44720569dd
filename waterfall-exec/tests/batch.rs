use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use waterfall_exec::{
    Event, EventSink, ExecutorConfig, OperationDescriptor, OperationError, ResilientOrchestrator,
    RetryPolicy,
};

fn orchestrator() -> ResilientOrchestrator {
    ResilientOrchestrator::new(
        ExecutorConfig {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        },
        None,
    )
}

fn ok_op(name: &str) -> OperationDescriptor<u32> {
    OperationDescriptor::new(name, || async { Ok(1) })
}

fn failing_op(name: &str) -> OperationDescriptor<u32> {
    OperationDescriptor::new(name, || async { Err(OperationError::failed("down")) })
}

fn tracked_op(name: &str, calls: &Arc<AtomicU32>) -> OperationDescriptor<u32> {
    let calls = calls.clone();
    OperationDescriptor::new(name, move || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(1) }
    })
}

#[tokio::test]
async fn continue_on_failure_counts_every_outcome() {
    let ops = vec![
        ok_op("home"),
        failing_op("about"),
        failing_op("contact").fallback(|| async { Ok(2) }),
    ];

    let batch = orchestrator().execute_batch(&ops, true).await;

    assert_eq!(batch.total_tests, 3);
    assert_eq!(batch.successful_tests, 2);
    assert_eq!(batch.failed_tests, 1);
    assert_eq!(batch.fallbacks_used, 1);
    assert_eq!(batch.skipped_tests, 0);
    assert_eq!(batch.error_summary.critical_errors, 1);
    assert_eq!(batch.error_summary.recoverable_errors, 1);
    assert_eq!(batch.error_summary.total_errors, 2);

    let names: Vec<&str> = batch
        .per_operation_results
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(names, vec!["home", "about", "contact"]);
    assert!(batch.has_failures());
}

#[tokio::test]
async fn stop_on_failure_skips_the_rest() {
    let calls = Arc::new(AtomicU32::new(0));
    let ops = vec![ok_op("home"), failing_op("about"), tracked_op("contact", &calls)];

    let batch = orchestrator().execute_batch(&ops, false).await;

    assert_eq!(batch.per_operation_results.len(), 2);
    assert_eq!(batch.total_tests, 3);
    assert_eq!(batch.skipped_tests, 1);
    assert_eq!(batch.failed_tests, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn recovered_failure_does_not_stop_the_batch() {
    let ops = vec![
        failing_op("home").fallback(|| async { Ok(2) }),
        ok_op("about"),
    ];

    let batch = orchestrator().execute_batch(&ops, false).await;

    assert_eq!(batch.per_operation_results.len(), 2);
    assert_eq!(batch.successful_tests, 2);
}

#[tokio::test]
async fn attempted_fallbacks_count_as_recoverable_even_when_they_fail() {
    let ops = vec![
        failing_op("home").fallback(|| async { Err(OperationError::failed("again")) }),
        failing_op("about").fallback(|| async { Ok(2) }),
    ];

    let batch = orchestrator().execute_batch(&ops, true).await;

    assert_eq!(batch.fallbacks_used, 2);
    assert_eq!(batch.error_summary.recoverable_errors, batch.fallbacks_used);
    assert_eq!(batch.error_summary.critical_errors, 1);
    assert_eq!(batch.error_summary.total_errors, 3);
}

#[tokio::test]
async fn strict_mode_failures_stay_inside_the_batch() {
    let orch = ResilientOrchestrator::new(
        ExecutorConfig {
            retry: RetryPolicy::no_retry(),
            graceful_degradation: false,
            ..Default::default()
        },
        None,
    );
    let ops = vec![
        failing_op("home").fallback(|| async { Err(OperationError::failed("again")) }),
        ok_op("about"),
    ];

    let batch = orch.execute_batch(&ops, true).await;

    assert_eq!(batch.failed_tests, 1);
    assert_eq!(batch.successful_tests, 1);
    let (_, first) = &batch.per_operation_results[0];
    assert_eq!(first.error, Some(OperationError::failed("down")));
    assert_eq!(first.attempts, 1);
    assert!(first.fallback_used);
}

/// Panics while the orchestrator reports the start of one operation.
struct PanickingSink {
    target: &'static str,
}

#[async_trait]
impl EventSink for PanickingSink {
    async fn emit(&self, event: Event) {
        if let Event::OperationStarted { operation } = &event {
            if operation == self.target {
                panic!("sink exploded");
            }
        }
    }
}

#[tokio::test]
async fn orchestration_panic_becomes_zero_attempt_failure() {
    let orch = orchestrator().with_event_sink(Arc::new(PanickingSink { target: "about" }));
    let ops = vec![ok_op("home"), ok_op("about"), ok_op("contact")];

    let batch = orch.execute_batch(&ops, true).await;

    assert_eq!(batch.per_operation_results.len(), 3);
    assert_eq!(batch.failed_tests, 1);
    let (_, broken) = &batch.per_operation_results[1];
    assert!(!broken.success);
    assert_eq!(broken.attempts, 0);
    assert_eq!(broken.error, Some(OperationError::Panicked("sink exploded".into())));
}

#[tokio::test]
async fn orchestration_panic_stops_when_not_continuing() {
    let orch = orchestrator().with_event_sink(Arc::new(PanickingSink { target: "home" }));
    let ops = vec![ok_op("home"), ok_op("about")];

    let batch = orch.execute_batch(&ops, false).await;

    assert_eq!(batch.per_operation_results.len(), 1);
    assert_eq!(batch.skipped_tests, 1);
}

#[tokio::test]
async fn cancellation_stops_the_batch() {
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let first = {
        let token = token.clone();
        OperationDescriptor::new("home", move || {
            token.cancel();
            async { Ok(1) }
        })
    };
    let ops = vec![first, tracked_op("about", &calls)];

    let batch = orchestrator()
        .with_cancellation(token)
        .execute_batch(&ops, true)
        .await;

    assert_eq!(batch.per_operation_results.len(), 1);
    assert_eq!(batch.skipped_tests, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_batch_keeps_order_and_limit() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let ops: Vec<OperationDescriptor<u32>> = (0..6u64)
        .map(|i| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            OperationDescriptor::new(format!("op{i}"), move || {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(60 - i * 10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    if i == 3 {
                        Err(OperationError::failed("down"))
                    } else {
                        Ok(i as u32)
                    }
                }
            })
        })
        .collect();

    let batch = orchestrator().execute_batch_concurrent(&ops, 2).await;

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(batch.per_operation_results.len(), 6);
    assert_eq!(batch.successful_tests, 5);
    assert_eq!(batch.failed_tests, 1);
    let names: Vec<String> = batch
        .per_operation_results
        .iter()
        .map(|(name, _)| name.clone())
        .collect();
    assert_eq!(names, (0..6).map(|i| format!("op{i}")).collect::<Vec<_>>());
}
