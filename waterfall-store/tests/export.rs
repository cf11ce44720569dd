use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;
use waterfall_core::{ContextHints, ExecutionContext, LogEntry, LogFilter, LogLevel, NewLogEntry};
use waterfall_store::{
    claim_paths, import_json, ErrorLog, ErrorLogConfig, ExportFormat, MemoryPartitionStore,
};

fn empty_log() -> ErrorLog {
    ErrorLog::new(
        ErrorLogConfig {
            min_level: LogLevel::Debug,
            max_entries: 100,
        },
        Arc::new(MemoryPartitionStore::new()),
    )
}

fn messages(entries: &[LogEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.message.as_str()).collect()
}

async fn populated_log() -> ErrorLog {
    let log = empty_log();
    let ctx = ExecutionContext::new("captureScreenshot", ContextHints::default().page("home"), 2);
    for i in 0..4 {
        log.record(
            NewLogEntry::new(LogLevel::Error, format!("capture failed, attempt {i}"))
                .context(ctx.clone()),
        )
        .await;
    }
    log.record(NewLogEntry::new(LogLevel::Info, "all good")).await;
    log
}

#[tokio::test]
async fn json_export_round_trips_count_and_order() {
    let tmp = TempDir::new().unwrap();
    let log = populated_log().await;

    let path = log
        .export(ExportFormat::Json, &LogFilter::default(), tmp.path())
        .await
        .unwrap();
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("log-export-"));
    assert!(name.ends_with(".json"));

    let imported = import_json(&path).await.unwrap();
    let original = log.query(&LogFilter::default()).await;
    assert_eq!(imported.len(), original.len());
    let a: Vec<_> = imported.iter().map(|e| e.id).collect();
    let b: Vec<_> = original.iter().map(|e| e.id).collect();
    assert_eq!(a, b);
    assert_eq!(imported, original);
}

#[tokio::test]
async fn csv_export_escapes_commas() {
    let tmp = TempDir::new().unwrap();
    let log = populated_log().await;
    let path = log
        .export(
            ExportFormat::Csv,
            &LogFilter::default().level(LogLevel::Error),
            tmp.path(),
        )
        .await
        .unwrap();
    assert_eq!(path.extension().unwrap(), "csv");

    let body = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("id,timestamp,level"));
    assert!(lines[1].contains("\"capture failed, attempt 3\""));
    assert!(lines[1].contains(",captureScreenshot,home,"));
}

#[tokio::test]
async fn text_export_is_human_readable() {
    let tmp = TempDir::new().unwrap();
    let log = populated_log().await;
    let path = log
        .export(ExportFormat::Text, &LogFilter::default().limit(1), tmp.path())
        .await
        .unwrap();
    assert_eq!(path.extension().unwrap(), "txt");
    let body = std::fs::read_to_string(&path).unwrap();
    assert!(body.contains("INFO [system] all good"));
    assert_eq!(body.lines().count(), 1);
}

#[tokio::test]
async fn restored_export_keeps_order_of_tied_timestamps() {
    let tmp = TempDir::new().unwrap();
    let ts = Utc::now();
    let source = empty_log();
    source
        .restore(vec![
            NewLogEntry::new(LogLevel::Error, "a").into_entry(ts),
            NewLogEntry::new(LogLevel::Error, "b").into_entry(ts),
            NewLogEntry::new(LogLevel::Error, "c").into_entry(ts - chrono::Duration::seconds(1)),
        ])
        .await;
    let before = source.query(&LogFilter::default()).await;
    assert_eq!(messages(&before), vec!["b", "a", "c"]);

    let path = source
        .export(ExportFormat::Json, &LogFilter::default(), tmp.path())
        .await
        .unwrap();
    let target = empty_log();
    target.restore_export(import_json(&path).await.unwrap()).await;

    let after = target.query(&LogFilter::default()).await;
    assert_eq!(after, before);
    assert_eq!(messages(&target.snapshot().await), vec!["c", "a", "b"]);
}

#[tokio::test]
async fn back_to_back_exports_never_share_a_file() {
    let tmp = TempDir::new().unwrap();
    let log = populated_log().await;

    let mut paths = HashSet::new();
    for _ in 0..20 {
        let path = log
            .export(ExportFormat::Json, &LogFilter::default(), tmp.path())
            .await
            .unwrap();
        assert!(paths.insert(path));
    }
    for path in &paths {
        assert_eq!(import_json(path).await.unwrap().len(), 5);
    }
}

#[tokio::test]
async fn claimed_names_skip_a_taken_stamp() {
    let tmp = TempDir::new().unwrap();
    let taken = tmp.path().join("log-export-S.json");
    std::fs::write(&taken, "[]").unwrap();

    let [handler, export] = claim_paths(
        tmp.path(),
        "S",
        [("handler-report", "json"), ("log-export", "json")],
    )
    .await
    .unwrap();

    assert_eq!(handler.file_name().unwrap(), "handler-report-S-1.json");
    assert_eq!(export.file_name().unwrap(), "log-export-S-1.json");
    assert!(!tmp.path().join("handler-report-S.json").exists());
    assert_eq!(std::fs::read_to_string(&taken).unwrap(), "[]");
}
