use std::sync::Arc;

use tempfile::TempDir;
use waterfall_core::{ContextHints, LogFilter, LogLevel};
use waterfall_exec::{
    ExecutorConfig, OperationDescriptor, OperationError, ResilientOrchestrator, RetryPolicy,
};
use waterfall_store::{import_json, ErrorLog, ErrorLogConfig, ExportFormat, MemoryPartitionStore};

async fn orchestrator_with_history() -> (ResilientOrchestrator, Arc<ErrorLog>) {
    let log = Arc::new(ErrorLog::new(
        ErrorLogConfig {
            min_level: LogLevel::Debug,
            max_entries: 1000,
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

    let recovered = OperationDescriptor::<u32>::new("captureScreenshot", || async {
        Err(OperationError::failed("blank image"))
    })
    .fallback(|| async { Ok(1) });
    let failed = OperationDescriptor::<u32>::new("runAudit", || async {
        Err(OperationError::failed("axe crashed"))
    });
    let hints = ContextHints::default();
    orch.execute_operation(&recovered, &hints).await.unwrap();
    orch.execute_operation(&failed, &hints).await.unwrap();
    orch.execute_operation(&failed, &hints).await.unwrap();
    (orch, log)
}

#[tokio::test]
async fn combined_report_sums_both_sources() {
    let (orch, _) = orchestrator_with_history().await;
    let report = orch.reporter().report().await;

    // handler: one failed attempt per call
    assert_eq!(report.handler.total_errors, 3);
    // log: attempt + terminal entry for each failed call, attempt entry for the recovered one
    assert_eq!(report.logger.total_errors, 5);
    assert_eq!(report.combined_total_errors, 8);
    assert_eq!(report.most_problematic_operation.as_deref(), Some("runAudit"));

    let handler_rate = 1.0 / 3.0;
    let logger_rate = 1.0 / 5.0;
    assert!((report.combined_recovery_rate - (handler_rate + logger_rate) / 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn reporter_without_log_uses_handler_only() {
    let orch = ResilientOrchestrator::default();
    let report = orch.reporter().report().await;
    assert_eq!(report.combined_total_errors, 0);
    assert_eq!(report.logger.total_errors, 0);
    assert_eq!(report.most_problematic_operation, None);
}

#[tokio::test]
async fn bundle_writes_three_files() {
    let (orch, log) = orchestrator_with_history().await;
    let dir = TempDir::new().unwrap();

    let paths = orch.reporter().export_bundle(dir.path()).await.unwrap();

    for (path, prefix) in [
        (&paths.handler_report, "handler-report-"),
        (&paths.log_export, "log-export-"),
        (&paths.combined_report, "combined-report-"),
    ] {
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(prefix), "{name}");
        assert!(name.ends_with(".json"));
        assert!(!name.contains(':'));
    }

    let exported = import_json(&paths.log_export).await.unwrap();
    assert_eq!(exported.len(), log.len().await);

    let handler: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.handler_report).unwrap()).unwrap();
    assert_eq!(handler["failed_operations"], 2);
    assert_eq!(handler["recovered"]["by_fallback"], 1);

    let combined: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.combined_report).unwrap()).unwrap();
    assert_eq!(combined["combined_total_errors"], 8);
}

#[tokio::test]
async fn repeated_bundles_and_exports_keep_separate_files() {
    let (orch, log) = orchestrator_with_history().await;
    let dir = TempDir::new().unwrap();

    let export = log
        .export(ExportFormat::Json, &LogFilter::default(), dir.path())
        .await
        .unwrap();
    let first = orch.reporter().export_bundle(dir.path()).await.unwrap();
    let second = orch.reporter().export_bundle(dir.path()).await.unwrap();

    assert_ne!(first.log_export, export);
    assert_ne!(second.log_export, export);
    assert_ne!(first.log_export, second.log_export);
    assert_ne!(first.combined_report, second.combined_report);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 7);
}
