use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs::OpenOptions;

use waterfall_core::LogEntry;

use crate::store::{ExportFormat, StoreError};

/// ISO-8601 UTC timestamp usable in a file name (`:` and `.` replaced by `-`).
pub fn file_stamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Serialize entries in the given order.
pub fn render_export(entries: &[LogEntry], format: ExportFormat) -> Result<String, StoreError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
        ExportFormat::Csv => Ok(render_csv(entries)),
        ExportFormat::Text => Ok(render_text(entries)),
    }
}

/// Create one empty file per `(prefix, ext)` named `<prefix>-<stamp>.<ext>` under `dir`.
/// Files are opened with `create_new`; when any name in the set is taken the stamp gets a
/// `-1`, `-2`, ... suffix and the whole set is tried again, so every returned path is fresh
/// and the set shares one stamp.
pub async fn claim_paths<const N: usize>(
    dir: &Path,
    stamp: &str,
    names: [(&str, &str); N],
) -> Result<[PathBuf; N], StoreError> {
    tokio::fs::create_dir_all(dir).await?;
    let mut n = 0u32;
    loop {
        let stamp = if n == 0 {
            stamp.to_string()
        } else {
            format!("{stamp}-{n}")
        };
        let paths = names.map(|(prefix, ext)| dir.join(format!("{prefix}-{stamp}.{ext}")));

        let mut created = Vec::with_capacity(N);
        let mut taken = false;
        for path in &paths {
            match OpenOptions::new().write(true).create_new(true).open(path).await {
                Ok(_) => created.push(path.clone()),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    taken = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        if !taken {
            return Ok(paths);
        }
        for path in created {
            let _ = tokio::fs::remove_file(path).await;
        }
        n += 1;
    }
}

/// Write `log-export-<stamp>.<ext>` under `dir` and return its path. An existing export with
/// the same stamp is never overwritten.
pub async fn write_export(
    entries: &[LogEntry],
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, StoreError> {
    let body = render_export(entries, format)?;
    let stamp = file_stamp(Utc::now());
    let [path] = claim_paths(dir, &stamp, [("log-export", format.extension())]).await?;
    tokio::fs::write(&path, body).await?;
    Ok(path)
}

/// Read a JSON export (or a daily partition file) back, preserving file order.
pub async fn import_json(path: &Path) -> Result<Vec<LogEntry>, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

const CSV_HEADER: &str = "id,timestamp,level,category,message,operation,page,theme,attempt,error";

fn render_csv(entries: &[LogEntry]) -> String {
    let mut out = String::with_capacity(64 * (entries.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for e in entries {
        let ctx = e.context.as_ref();
        let fields = [
            e.id.to_string(),
            e.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            e.level.to_string(),
            e.category.to_string(),
            e.message.clone(),
            ctx.map(|c| c.operation_name.clone()).unwrap_or_default(),
            ctx.and_then(|c| c.hints.page.clone()).unwrap_or_default(),
            ctx.and_then(|c| c.hints.theme.clone()).unwrap_or_default(),
            ctx.map(|c| c.attempt_number.to_string()).unwrap_or_default(),
            e.error.as_ref().map(|err| err.message.clone()).unwrap_or_default(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f.as_str())).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_text(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        let _ = write!(
            out,
            "[{}] {} [{}] {}",
            e.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            e.level.as_str().to_ascii_uppercase(),
            e.category,
            e.message
        );
        if let Some(ctx) = &e.context {
            let _ = write!(
                out,
                " (operation={} attempt={}/{})",
                ctx.operation_name,
                ctx.attempt_number,
                ctx.max_attempts()
            );
        }
        if let Some(err) = &e.error {
            let _ = write!(out, "\n    {}: {}", err.name, err.message);
        }
        if let Some(stack) = &e.stack_trace {
            for line in stack.lines() {
                let _ = write!(out, "\n      {line}");
            }
        }
        out.push('\n');
    }
    out
}
