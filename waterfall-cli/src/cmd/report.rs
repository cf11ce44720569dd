use std::path::Path;
use std::sync::Arc;

use waterfall_exec::{BundlePaths, StatisticsReporter, StatsCollector};

use crate::output::{print_error, print_text_or};
use crate::utils::{load_config, persisted_log, CliError};
use crate::{exit_codes, LogArgs, OutputArgs};

pub async fn report_cmd(out_dir: &Path, output: OutputArgs, log: LogArgs) -> i32 {
    match report(out_dir, &log).await {
        Ok(paths) => {
            print_text_or(output.format, output.quiet, &paths, || {
                vec![
                    format!("handler report: {}", paths.handler_report.display()),
                    format!("log export: {}", paths.log_export.display()),
                    format!("combined report: {}", paths.combined_report.display()),
                ]
            });
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            e.exit_code()
        }
    }
}

/// Handler counters are empty here; only the persisted log contributes.
async fn report(out_dir: &Path, log: &LogArgs) -> Result<BundlePaths, CliError> {
    let cfg = load_config(log)?;
    let reporter =
        StatisticsReporter::new(Arc::new(StatsCollector::new()), Some(persisted_log(&cfg).await?));
    Ok(reporter.export_bundle(out_dir).await?)
}
