use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use waterfall_core::{Category, ContextHints, LogFilter, LogLevel};
use waterfall_exec::{
    accessibility_operation, screenshot_operation, AccessibilityAudit, AuditReport,
    AuditViolation, CaptureRequest, ExecutorConfig, OperationError, ResilientOrchestrator,
    RetryPolicy, ScreenshotCapture,
};
use waterfall_store::{ErrorLog, ErrorLogConfig, MemoryPartitionStore};

/// Primary always fails; fallback `n` succeeds for `n >= working_from`.
struct FlakyCamera {
    working_from: usize,
    fallback_calls: AtomicUsize,
}

#[async_trait]
impl ScreenshotCapture for FlakyCamera {
    async fn capture(&self, _req: &CaptureRequest) -> Result<Vec<u8>, OperationError> {
        Err(OperationError::timeout("page never settled"))
    }

    fn fallback_count(&self) -> usize {
        3
    }

    async fn capture_fallback(
        &self,
        idx: usize,
        req: &CaptureRequest,
    ) -> Result<Vec<u8>, OperationError> {
        self.fallback_calls.fetch_add(1, Ordering::SeqCst);
        if idx >= self.working_from {
            Ok(format!("png:{}", req.page).into_bytes())
        } else {
            Err(OperationError::failed(format!("strategy {idx} failed")))
        }
    }
}

struct StaticAudit;

#[async_trait]
impl AccessibilityAudit for StaticAudit {
    async fn audit(&self, req: &CaptureRequest) -> Result<AuditReport, OperationError> {
        Ok(AuditReport {
            page: req.page.clone(),
            violations: vec![AuditViolation {
                rule_id: "color-contrast".into(),
                impact: "serious".into(),
                description: "low contrast".into(),
                nodes: 2,
            }],
            passes: 10,
        })
    }
}

fn orchestrator() -> (ResilientOrchestrator, Arc<ErrorLog>) {
    let log = Arc::new(ErrorLog::new(
        ErrorLogConfig {
            min_level: LogLevel::Debug,
            max_entries: 100,
        },
        Arc::new(MemoryPartitionStore::new()),
    ));
    let orch = ResilientOrchestrator::new(
        ExecutorConfig {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        },
        Some(log.clone()),
    );
    (orch, log)
}

#[tokio::test]
async fn screenshot_descriptor_runs_capture_fallbacks_in_order() {
    let camera = Arc::new(FlakyCamera {
        working_from: 1,
        fallback_calls: AtomicUsize::new(0),
    });
    let op = screenshot_operation(camera.clone(), CaptureRequest::new("home").theme("dark"));
    assert_eq!(op.name, "screenshot:home");
    assert_eq!(op.fallbacks.len(), 3);
    assert_eq!(op.hints.page.as_deref(), Some("home"));

    let (orch, log) = orchestrator();
    let result = orch.execute_operation(&op, &ContextHints::default()).await.unwrap();

    assert_eq!(result.value.as_deref(), Some(b"png:home".as_slice()));
    assert_eq!(result.recovery_method.as_deref(), Some("fallback_2"));
    assert_eq!(camera.fallback_calls.load(Ordering::SeqCst), 2);

    let failures = log
        .query(&LogFilter::default().level(LogLevel::Warn).category(Category::Screenshot))
        .await;
    assert_eq!(failures.len(), 2);
    assert!(log
        .query(&LogFilter::default().theme("dark"))
        .await
        .iter()
        .all(|e| e.context.is_some()));
}

#[tokio::test]
async fn accessibility_descriptor_passes_report_through() {
    let op = accessibility_operation(Arc::new(StaticAudit), CaptureRequest::new("about"));
    assert_eq!(op.name, "accessibility:about");
    assert!(op.fallbacks.is_empty());

    let (orch, log) = orchestrator();
    let result = orch.execute_operation(&op, &ContextHints::default()).await.unwrap();

    let report = result.value.unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.violations[0].rule_id, "color-contrast");
    assert!(log.is_empty().await);
}
