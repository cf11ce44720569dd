use chrono::{Days, Utc};
use serde::Serialize;

use waterfall_store::PartitionStore;

use crate::output::{print_error, print_text_or};
use crate::utils::{load_config, partitions, persisted_log, CliError};
use crate::{exit_codes, LogArgs, OutputArgs};

#[derive(Serialize)]
struct PruneResult {
    days: u32,
    entries_older: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    partitions_removed: Option<usize>,
}

pub async fn prune_cmd(
    days: u32,
    delete_partitions: bool,
    output: OutputArgs,
    log: LogArgs,
) -> i32 {
    match prune(days, delete_partitions, &log).await {
        Ok(result) => {
            print_text_or(output.format, output.quiet, &result, || {
                let mut lines = vec![format!(
                    "{} entries older than {} day(s)",
                    result.entries_older, result.days
                )];
                if let Some(n) = result.partitions_removed {
                    lines.push(format!("removed {n} partition file(s)"));
                }
                lines
            });
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            e.exit_code()
        }
    }
}

async fn prune(days: u32, delete_partitions: bool, log: &LogArgs) -> Result<PruneResult, CliError> {
    let cfg = load_config(log)?;
    let entries_older = persisted_log(&cfg).await?.prune(days).await;

    let partitions_removed = if delete_partitions {
        // Day files strictly before the cutoff day go; `0` removes today's as well.
        let today = Utc::now().date_naive();
        let cutoff = if days == 0 {
            today.checked_add_days(Days::new(1))
        } else {
            today.checked_sub_days(Days::new(u64::from(days)))
        }
        .ok_or_else(|| CliError::Invalid(format!("--days {days} is out of range")))?;
        let removed = partitions(&cfg).prune_before(cutoff).await?;
        tracing::info!(removed, %cutoff, "pruned partitions");
        Some(removed)
    } else {
        None
    };

    Ok(PruneResult {
        days,
        entries_older,
        partitions_removed,
    })
}
