// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily run-log files with day-count retention.
//!
//! Each run appends to `run_YYYYMMDD.out.log` / `run_YYYYMMDD.err.log` under
//! the log directory, dated in the configured local timezone. Every append
//! is followed by a garbage-collection pass over the directory.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where a run's streams were appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogPaths {
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

/// Append a run's captured output to today's log files.
///
/// Each stream gets a `[LOCAL_ISO_TIME] task=<name> run=<id>` header line,
/// then the content with a terminating newline added if missing.
pub fn append_run_output<Tz: TimeZone>(
    log_dir: &Path,
    local_now: DateTime<Tz>,
    task_name: &str,
    run_id: i64,
    stdout: &str,
    stderr: &str,
) -> std::io::Result<RunLogPaths>
where
    Tz::Offset: std::fmt::Display,
{
    std::fs::create_dir_all(log_dir)?;

    let day = local_now.format("%Y%m%d");
    let paths = RunLogPaths {
        stdout_path: log_dir.join(format!("run_{day}.out.log")),
        stderr_path: log_dir.join(format!("run_{day}.err.log")),
    };
    let header = format!(
        "[{}] task={} run={}",
        local_now.to_rfc3339(),
        task_name,
        run_id
    );

    append_stream(&paths.stdout_path, &header, stdout)?;
    append_stream(&paths.stderr_path, &header, stderr)?;
    Ok(paths)
}

fn append_stream(path: &Path, header: &str, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{header}")?;
    file.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        writeln!(file)?;
    }
    Ok(())
}

/// Delete `run_*.log` files older than `retention_days` (floor of 1) days.
///
/// File names that do not match the daily pattern are left alone. Removal is
/// best-effort; failures are logged and skipped.
pub fn prune_old_logs(log_dir: &Path, today_local: NaiveDate, retention_days: u32) {
    let cutoff = today_local - Duration::days(retention_days.max(1) as i64);
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(date) = parse_log_date(name) else {
            continue;
        };
        if date < cutoff {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => tracing::info!(file = name, "pruned expired run log"),
                Err(err) => tracing::warn!(file = name, %err, "failed to prune run log"),
            }
        }
    }
}

fn parse_log_date(name: &str) -> Option<NaiveDate> {
    let rest = name.strip_prefix("run_")?;
    let digits = rest.get(..8)?;
    let suffix = rest.get(8..)?;
    if suffix != ".out.log" && suffix != ".err.log" {
        return None;
    }
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

#[cfg(test)]
#[path = "run_logs_tests.rs"]
mod tests;
