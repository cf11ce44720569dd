use std::path::PathBuf;

use serde::Serialize;

use crate::args::{ExportFormatArg, FilterArgs};
use crate::output::{print_error, print_text_or};
use crate::utils::{build_filter, load_config, persisted_log, CliError};
use crate::{exit_codes, LogArgs, OutputArgs};

#[derive(Serialize)]
struct ExportResult {
    path: PathBuf,
    entries: usize,
}

pub async fn export_cmd(
    to: ExportFormatArg,
    out_dir: Option<PathBuf>,
    filter: FilterArgs,
    output: OutputArgs,
    log: LogArgs,
) -> i32 {
    match export(to, out_dir, &filter, &log).await {
        Ok(result) => {
            print_text_or(output.format, output.quiet, &result, || {
                vec![format!("exported {} entries to {}", result.entries, result.path.display())]
            });
            exit_codes::SUCCESS
        }
        Err(e) => {
            for line in e.lines() {
                print_error(output.format, output.quiet, &line);
            }
            e.exit_code()
        }
    }
}

async fn export(
    to: ExportFormatArg,
    out_dir: Option<PathBuf>,
    filter: &FilterArgs,
    log: &LogArgs,
) -> Result<ExportResult, CliError> {
    let cfg = load_config(log)?;
    let filter = build_filter(filter)?;
    let error_log = persisted_log(&cfg).await?;
    let entries = error_log.query(&filter).await.len();
    let dir = out_dir.unwrap_or_else(|| cfg.log_dir.clone());
    let path = error_log.export(to.into(), &filter, &dir).await?;
    Ok(ExportResult { path, entries })
}
