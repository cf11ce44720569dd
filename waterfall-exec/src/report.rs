use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use waterfall_core::{LogFilter, LogStatistics};
use waterfall_store::{claim_paths, file_stamp, render_export, ErrorLog, ExportFormat, StoreError};

use crate::executor::{HandlerStats, StatsCollector};

/// Handler counters and error-log statistics side by side.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CombinedReport {
    pub generated_at: DateTime<Utc>,
    pub handler: HandlerStats,
    pub logger: LogStatistics,
    pub combined_total_errors: usize,
    pub combined_recovery_rate: f64,
    pub most_problematic_operation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BundlePaths {
    pub handler_report: PathBuf,
    pub log_export: PathBuf,
    pub combined_report: PathBuf,
}

pub struct StatisticsReporter {
    stats: Arc<StatsCollector>,
    log: Option<Arc<ErrorLog>>,
}

impl StatisticsReporter {
    pub fn new(stats: Arc<StatsCollector>, log: Option<Arc<ErrorLog>>) -> Self {
        Self { stats, log }
    }

    pub async fn report(&self) -> CombinedReport {
        let handler = self.stats.snapshot().await;
        let logger = match &self.log {
            Some(log) => log.statistics().await,
            None => LogStatistics::default(),
        };
        combine(handler, logger, Utc::now())
    }

    /// Write `handler-report-<ts>.json`, `log-export-<ts>.json` and `combined-report-<ts>.json`
    /// under `dir`, all sharing one timestamp.
    pub async fn export_bundle(&self, dir: &Path) -> Result<BundlePaths, StoreError> {
        let report = self.report().await;
        let entries = match &self.log {
            Some(log) => log.query(&LogFilter::default()).await,
            None => Vec::new(),
        };
        let stamp = file_stamp(report.generated_at);
        let [handler_report, log_export, combined_report] = claim_paths(
            dir,
            &stamp,
            [
                ("handler-report", "json"),
                ("log-export", "json"),
                ("combined-report", "json"),
            ],
        )
        .await?;

        let paths = BundlePaths {
            handler_report,
            log_export,
            combined_report,
        };
        tokio::fs::write(
            &paths.handler_report,
            serde_json::to_string_pretty(&report.handler.to_json())?,
        )
        .await?;
        tokio::fs::write(&paths.log_export, render_export(&entries, ExportFormat::Json)?).await?;
        tokio::fs::write(&paths.combined_report, serde_json::to_string_pretty(&report)?).await?;

        tracing::info!(dir = %dir.display(), entries = entries.len(), "wrote report bundle");
        Ok(paths)
    }
}

pub(crate) fn combine(
    handler: HandlerStats,
    logger: LogStatistics,
    generated_at: DateTime<Utc>,
) -> CombinedReport {
    let from_handler = handler
        .most_problematic_operation()
        .map(|(name, count)| (name.to_string(), count));
    let from_logger = top_operation(&logger.errors_by_operation);
    let most_problematic_operation = match (from_handler, from_logger) {
        (Some(h), Some(l)) if l.1 > h.1 => Some(l.0),
        (Some(h), _) => Some(h.0),
        (None, l) => l.map(|(name, _)| name),
    };

    CombinedReport {
        generated_at,
        combined_total_errors: handler.total_errors + logger.total_errors,
        combined_recovery_rate: (handler.recovery_success_rate() + logger.recovery_success_rate)
            / 2.0,
        most_problematic_operation,
        handler,
        logger,
    }
}

fn top_operation(counts: &BTreeMap<String, usize>) -> Option<(String, usize)> {
    let mut best: Option<(&String, usize)> = None;
    for (name, count) in counts {
        if best.map_or(true, |(_, c)| *count > c) {
            best = Some((name, *count));
        }
    }
    best.map(|(name, count)| (name.clone(), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger_with(ops: &[(&str, usize)]) -> LogStatistics {
        LogStatistics {
            total_errors: ops.iter().map(|(_, c)| c).sum(),
            errors_by_operation: ops.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn handler_wins_ties() {
        let mut handler = HandlerStats::default();
        handler.record_attempt_failure("nav");
        handler.record_attempt_failure("nav");
        let report = combine(handler, logger_with(&[("shot", 2)]), Utc::now());
        assert_eq!(report.most_problematic_operation.as_deref(), Some("nav"));
        assert_eq!(report.combined_total_errors, 4);
    }

    #[test]
    fn logger_wins_when_strictly_greater() {
        let mut handler = HandlerStats::default();
        handler.record_attempt_failure("nav");
        let report = combine(handler, logger_with(&[("shot", 3)]), Utc::now());
        assert_eq!(report.most_problematic_operation.as_deref(), Some("shot"));
    }

    #[test]
    fn empty_sources_have_no_problem_operation() {
        let report = combine(HandlerStats::default(), LogStatistics::default(), Utc::now());
        assert_eq!(report.most_problematic_operation, None);
        assert_eq!(report.combined_recovery_rate, 0.0);
    }

    #[test]
    fn recovery_rate_is_the_average() {
        let mut handler = HandlerStats::default();
        handler.record_fallback_recovery();
        let logger = LogStatistics {
            recovery_success_rate: 0.5,
            ..Default::default()
        };
        let report = combine(handler, logger, Utc::now());
        assert_eq!(report.combined_recovery_rate, 0.75);
    }
}
