use std::sync::Arc;

use chrono::{Duration, Utc};
use waterfall_core::{
    Category, ContextHints, ExecutionContext, LogEntry, LogFilter, LogLevel, LogMetadata,
    NewLogEntry, TimeRange,
};
use waterfall_store::{ErrorLog, ErrorLogConfig, MemoryPartitionStore, PartitionStore};

fn log_with(min_level: LogLevel, max_entries: usize) -> (ErrorLog, Arc<MemoryPartitionStore>) {
    let partitions = Arc::new(MemoryPartitionStore::new());
    let log = ErrorLog::new(
        ErrorLogConfig {
            min_level,
            max_entries,
        },
        partitions.clone(),
    );
    (log, partitions)
}

fn ctx(op: &str, page: &str, theme: &str) -> ExecutionContext {
    ExecutionContext::new(
        op,
        ContextHints::default().page(page).theme(theme),
        3,
    )
}

#[tokio::test]
async fn below_min_level_is_a_no_op() {
    let (log, _) = log_with(LogLevel::Warn, 100);
    assert!(log.record(NewLogEntry::new(LogLevel::Info, "hello")).await.is_none());
    assert!(log.record(NewLogEntry::new(LogLevel::Debug, "hello")).await.is_none());
    assert!(log.record(NewLogEntry::new(LogLevel::Warn, "careful")).await.is_some());
    assert_eq!(log.len().await, 1);
}

#[tokio::test]
async fn only_error_level_is_persisted() {
    let (log, partitions) = log_with(LogLevel::Debug, 100);
    log.record(NewLogEntry::new(LogLevel::Warn, "transient")).await;
    let err = log
        .record(NewLogEntry::new(LogLevel::Error, "fatal"))
        .await
        .unwrap();

    let persisted = partitions.load_all().await.unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].id, err.id);
}

#[tokio::test]
async fn ids_are_unique() {
    let (log, _) = log_with(LogLevel::Debug, 100);
    let a = log.record(NewLogEntry::new(LogLevel::Info, "same")).await.unwrap();
    let b = log.record(NewLogEntry::new(LogLevel::Info, "same")).await.unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn query_returns_newest_first() {
    let (log, _) = log_with(LogLevel::Debug, 100);
    for i in 0..5 {
        log.record(NewLogEntry::new(LogLevel::Info, format!("m{i}"))).await;
    }
    let all = log.query(&LogFilter::default()).await;
    let msgs: Vec<&str> = all.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(msgs, vec!["m4", "m3", "m2", "m1", "m0"]);
    for pair in all.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}

#[tokio::test]
async fn query_filters_by_level_category_and_hints() {
    let (log, _) = log_with(LogLevel::Debug, 100);
    log.record(
        NewLogEntry::new(LogLevel::Error, "dark home failed")
            .context(ctx("captureScreenshot", "home", "dark")),
    )
    .await;
    log.record(
        NewLogEntry::new(LogLevel::Warn, "light home flaky")
            .context(ctx("captureScreenshot", "home", "light")),
    )
    .await;
    log.record(
        NewLogEntry::new(LogLevel::Error, "audit failed")
            .context(ctx("runAccessibilityAudit", "studio", "dark")),
    )
    .await;

    let errors = log.query(&LogFilter::default().level(LogLevel::Error)).await;
    assert_eq!(errors.len(), 2);

    let shots = log
        .query(&LogFilter::default().category(Category::Screenshot))
        .await;
    assert_eq!(shots.len(), 2);

    let dark_home = log
        .query(&LogFilter::default().page("home").theme("dark"))
        .await;
    assert_eq!(dark_home.len(), 1);
    assert_eq!(dark_home[0].message, "dark home failed");

    let audit = log
        .query(&LogFilter::default().operation("runAccessibilityAudit"))
        .await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].category, Category::Accessibility);

    let future = log
        .query(&LogFilter::default().range(TimeRange::since(Utc::now() + Duration::hours(1))))
        .await;
    assert!(future.is_empty());
}

#[tokio::test]
async fn buffer_evicts_oldest_but_partitions_keep_errors() {
    let (log, partitions) = log_with(LogLevel::Debug, 3);
    for i in 0..5 {
        log.record(NewLogEntry::new(LogLevel::Error, format!("e{i}"))).await;
    }
    let msgs: Vec<String> = log.snapshot().await.into_iter().map(|e| e.message).collect();
    assert_eq!(msgs, vec!["e2", "e3", "e4"]);
    assert_eq!(partitions.load_all().await.unwrap().len(), 5);
}

#[tokio::test]
async fn prune_zero_clears_and_statistics_reset() {
    let (log, partitions) = log_with(LogLevel::Debug, 100);
    log.record(NewLogEntry::new(LogLevel::Error, "boom")).await;
    log.record(NewLogEntry::new(LogLevel::Error, "boom")).await;
    assert_eq!(log.statistics().await.total_errors, 2);

    assert_eq!(log.prune(0).await, 2);
    assert_eq!(log.statistics().await.total_errors, 0);
    assert!(log.is_empty().await);
    assert_eq!(partitions.load_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn prune_keeps_recent_entries() {
    let (log, _) = log_with(LogLevel::Debug, 100);
    let old: LogEntry =
        NewLogEntry::new(LogLevel::Error, "old").into_entry(Utc::now() - Duration::days(10));
    log.restore(vec![old]).await;
    log.record(NewLogEntry::new(LogLevel::Error, "fresh")).await;

    assert_eq!(log.prune(7).await, 1);
    let left = log.snapshot().await;
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].message, "fresh");
}

#[tokio::test]
async fn analysis_sees_recoveries() {
    let (log, _) = log_with(LogLevel::Debug, 100);
    log.record(NewLogEntry::new(LogLevel::Error, "captureScreenshot failed")).await;
    log.record(
        NewLogEntry::new(LogLevel::Info, "captureScreenshot recovered via fallback_1")
            .category(Category::Recovery)
            .metadata(LogMetadata::recovery(1, true)),
    )
    .await;
    let analysis = log.analyze(None).await;
    assert_eq!(analysis.summary.total_errors, 1);
    assert_eq!(analysis.summary.recovery_rate, 1.0);
    assert_eq!(analysis.trends.len(), 1);
}
