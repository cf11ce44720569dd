use chrono::{Duration, Utc};

use waterfall_core::{analyze, ErrorAnalysis, TimeRange};

use crate::output::{print_error, print_text_or};
use crate::utils::{load_config, load_persisted};
use crate::{exit_codes, LogArgs, OutputArgs};

pub async fn analyze_cmd(since_hours: Option<u32>, output: OutputArgs, log: LogArgs) -> i32 {
    let entries = match load_config(&log) {
        Ok(cfg) => load_persisted(&cfg).await,
        Err(e) => Err(e),
    };
    let entries = match entries {
        Ok(entries) => entries,
        Err(e) => {
            for line in e.lines() {
                print_error(output.format, output.quiet, &line);
            }
            return e.exit_code();
        }
    };

    let range = since_hours.map(|h| TimeRange::since(Utc::now() - Duration::hours(i64::from(h))));
    let analysis = analyze(&entries, range);
    print_text_or(output.format, output.quiet, &analysis, || text(&analysis));
    exit_codes::SUCCESS
}

fn text(a: &ErrorAnalysis) -> Vec<String> {
    let s = &a.summary;
    let mut lines = vec![format!(
        "{} entries, {} errors, recovery rate {:.0}%",
        s.total_entries,
        s.total_errors,
        s.recovery_rate * 100.0
    )];
    for (category, count) in &s.errors_by_category {
        lines.push(format!("  {category}: {count}"));
    }
    if !s.most_frequent_errors.is_empty() {
        lines.push("most frequent:".to_string());
        for m in &s.most_frequent_errors {
            lines.push(format!("  {}x {}", m.count, m.message));
        }
    }
    if !a.patterns.is_empty() {
        lines.push("patterns:".to_string());
        for p in &a.patterns {
            lines.push(format!(
                "  [{:?}] {} ({} occurrences)",
                p.impact, p.description, p.occurrences
            ));
        }
    }
    if !a.recommendations.is_empty() {
        lines.push("recommendations:".to_string());
        for r in &a.recommendations {
            lines.push(format!("  - {r}"));
        }
    }
    lines
}
