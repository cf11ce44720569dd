use waterfall_core::statistics;

use crate::output::{print_error, print_text_or};
use crate::utils::{load_config, load_persisted};
use crate::{exit_codes, LogArgs, OutputArgs};

pub async fn stats_cmd(output: OutputArgs, log: LogArgs) -> i32 {
    let entries = match load_config(&log) {
        Ok(cfg) => load_persisted(&cfg).await,
        Err(e) => Err(e),
    };
    let entries = match entries {
        Ok(entries) => entries,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return e.exit_code();
        }
    };

    let stats = statistics(&entries);
    print_text_or(output.format, output.quiet, &stats, || {
        let mut lines = vec![format!(
            "{} errors, recovery success rate {:.0}%",
            stats.total_errors,
            stats.recovery_success_rate * 100.0
        )];
        for (op, count) in &stats.errors_by_operation {
            lines.push(format!("  {op}: {count}"));
        }
        for (resolution, count) in &stats.errors_by_resolution {
            lines.push(format!("  resolved by {resolution}: {count}"));
        }
        lines
    });
    exit_codes::SUCCESS
}
