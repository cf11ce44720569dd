use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use waterfall_core::ParseError;
use waterfall_exec::executor::{operation_fn, NoOpEventSink, StderrEventSink, TracingEventSink};
use waterfall_exec::{
    BatchResult, BundlePaths, EventSink, ExecutorConfig, OperationDescriptor, OperationError,
    OperationFn, ResilientOrchestrator,
};
use waterfall_store::ErrorLog;

use crate::args::EventsArg;
use crate::exit_codes;
use crate::output::{print_error, print_text_or};
use crate::plan::{parse_plan_str, PlanOperation, RunPlan};
use crate::utils::load_config;
use crate::{LogArgs, OutputArgs};

#[derive(Serialize)]
struct RunOutput {
    #[serde(flatten)]
    batch: BatchResult<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<BundlePaths>,
}

pub async fn run_cmd(
    plan_path: &Path,
    continue_on_failure: bool,
    concurrency: usize,
    events: EventsArg,
    report_dir: Option<&Path>,
    output: OutputArgs,
    log: LogArgs,
) -> i32 {
    let cfg = match load_config(&log) {
        Ok(cfg) => cfg,
        Err(e) => {
            for line in e.lines() {
                print_error(output.format, output.quiet, &line);
            }
            return e.exit_code();
        }
    };

    let plan = match load_plan(plan_path) {
        Ok(plan) => plan,
        Err((code, lines)) => {
            for line in lines {
                print_error(output.format, output.quiet, &line);
            }
            return code;
        }
    };

    let executor_config = ExecutorConfig::from(&cfg);
    let ops: Vec<OperationDescriptor<String>> = plan
        .operations
        .iter()
        .map(|op| descriptor(op, &executor_config))
        .collect();

    let sink: Arc<dyn EventSink> = match events {
        EventsArg::Stderr => Arc::new(StderrEventSink),
        EventsArg::Tracing => Arc::new(TracingEventSink),
        EventsArg::None => Arc::new(NoOpEventSink),
    };
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            on_signal.cancel();
        }
    });

    let error_log = Arc::new(ErrorLog::from_config(&cfg));
    let orch = ResilientOrchestrator::new(executor_config, Some(error_log))
        .with_event_sink(sink)
        .with_cancellation(cancel);

    let continue_on_failure = continue_on_failure || plan.continue_on_failure;
    tracing::info!(
        plan = %plan_path.display(),
        operations = ops.len(),
        concurrency,
        continue_on_failure,
        "starting run"
    );
    let batch = if concurrency > 1 {
        orch.execute_batch_concurrent(&ops, concurrency).await
    } else {
        orch.execute_batch(&ops, continue_on_failure).await
    };

    let report = match report_dir {
        Some(dir) => match orch.reporter().export_bundle(dir).await {
            Ok(paths) => Some(paths),
            Err(e) => {
                print_error(output.format, output.quiet, &format!("failed to write report: {e}"));
                return exit_codes::RUNTIME_ERROR;
            }
        },
        None => None,
    };

    let failed = batch.has_failures();
    let result = RunOutput { batch, report };
    print_text_or(output.format, output.quiet, &result, || summary_lines(&result));

    if failed {
        exit_codes::RUN_FAILED
    } else {
        exit_codes::SUCCESS
    }
}

fn load_plan(path: &Path) -> Result<RunPlan, (i32, Vec<String>)> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        (
            exit_codes::RUNTIME_ERROR,
            vec![format!("failed to read {}: {e}", path.display())],
        )
    })?;
    let plan = parse_plan_str(&content).map_err(|e| {
        let message = match e {
            ParseError::Json(e) => format!("JSON parse failed: {e}"),
            ParseError::Yaml(e) => format!("YAML parse failed: {e}"),
        };
        (exit_codes::VALIDATION_FAILED, vec![message])
    })?;
    plan.validate().map_err(|err| {
        (
            exit_codes::VALIDATION_FAILED,
            err.violations.iter().map(|v| v.to_string()).collect(),
        )
    })?;
    Ok(plan)
}

fn descriptor(op: &PlanOperation, cfg: &ExecutorConfig) -> OperationDescriptor<String> {
    let timeout = op.timeout();
    OperationDescriptor {
        name: op.name.clone(),
        run: command_fn(&op.name, op.command.clone(), timeout),
        fallbacks: op
            .fallbacks
            .iter()
            .map(|argv| command_fn(&op.name, argv.clone(), timeout))
            .collect(),
        retry_policy: op.retry.as_ref().map(|r| r.apply(&cfg.retry)),
        hints: op.hints.clone(),
    }
}

fn command_fn(name: &str, argv: Vec<String>, timeout: Option<Duration>) -> OperationFn<String> {
    let name = name.to_string();
    operation_fn(move || {
        let name = name.clone();
        let argv = argv.clone();
        async move { run_process(&name, &argv, timeout).await }
    })
}

/// Trimmed stdout on a zero exit status.
async fn run_process(
    name: &str,
    argv: &[String],
    timeout: Option<Duration>,
) -> Result<String, OperationError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(OperationError::failed(format!("{name}: empty command")));
    };
    let child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
            OperationError::timeout(format!("{name} exceeded {}ms", limit.as_millis()))
        })?,
        None => child.await,
    }
    .map_err(|e| OperationError::failed(format!("failed to spawn {program}: {e}")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(OperationError::failed(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}

fn summary_lines(result: &RunOutput) -> Vec<String> {
    let b = &result.batch;
    let mut lines = vec![format!(
        "{}: {} operations, {} succeeded, {} failed, {} skipped, {} via fallback ({}ms)",
        if b.has_failures() { "failed" } else { "ok" },
        b.total_tests,
        b.successful_tests,
        b.failed_tests,
        b.skipped_tests,
        b.fallbacks_used,
        b.total_execution_time_ms
    )];
    for (name, r) in &b.per_operation_results {
        let line = match (&r.error, &r.recovery_method) {
            (Some(err), _) => format!("- {name}: failed after {} attempt(s): {err}", r.attempts),
            (None, Some(method)) => format!("- {name}: recovered via {method}"),
            (None, None) => format!("- {name}: ok ({} attempt(s))", r.attempts),
        };
        lines.push(line);
    }
    if let Some(paths) = &result.report {
        lines.push(format!("report: {}", paths.combined_report.display()));
    }
    lines
}
