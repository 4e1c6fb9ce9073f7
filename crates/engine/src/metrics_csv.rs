// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task metrics CSV with age-based pruning.
//!
//! Rows are `[local_iso_timestamp, task_id, task_name, key, value]`. After
//! each append the file is pruned by rewrite; pruning is best-effort and
//! never fails the run that produced the metrics.

use chrono::{DateTime, Duration, TimeZone};
use jobmill_core::MetricPair;
use std::path::{Path, PathBuf};

/// CSV path for a task's metrics.
pub fn metrics_file_path(metrics_dir: &Path, task_id: i64) -> PathBuf {
    metrics_dir.join(format!("task_{task_id}.csv"))
}

/// Append parsed pairs for one run, then prune rows older than
/// `retention_days` (no pruning when retention is zero or negative).
pub fn append_metrics<Tz: TimeZone>(
    metrics_dir: &Path,
    task_id: i64,
    task_name: &str,
    pairs: &[MetricPair],
    local_now: DateTime<Tz>,
    retention_days: i64,
) -> Result<(), csv::Error>
where
    Tz::Offset: std::fmt::Display,
{
    if pairs.is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(metrics_dir).map_err(csv::Error::from)?;
    let path = metrics_file_path(metrics_dir, task_id);

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(csv::Error::from)?;
    let mut writer = csv::Writer::from_writer(file);
    let timestamp = local_now.to_rfc3339();
    for pair in pairs {
        writer.write_record([
            timestamp.as_str(),
            &task_id.to_string(),
            task_name,
            &pair.key,
            &pair.value.to_string(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    drop(writer);

    if retention_days > 0 {
        let cutoff = local_now.fixed_offset() - Duration::days(retention_days);
        if let Err(err) = prune_file(&path, cutoff) {
            tracing::warn!(path = %path.display(), %err, "metrics prune failed");
        }
    }
    Ok(())
}

/// Rewrite the file keeping rows whose timestamp is at or after `cutoff`.
/// Rows with unparseable timestamps are kept.
fn prune_file(path: &Path, cutoff: DateTime<chrono::FixedOffset>) -> Result<(), csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut kept: Vec<csv::StringRecord> = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let expired = record
            .get(0)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .is_some_and(|ts| ts < cutoff);
        if expired {
            dropped += 1;
        } else {
            kept.push(record);
        }
    }
    if dropped == 0 {
        return Ok(());
    }

    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp_path)?;
        for record in &kept {
            writer.write_record(record)?;
        }
        writer.flush().map_err(csv::Error::from)?;
    }
    std::fs::rename(&tmp_path, path).map_err(csv::Error::from)?;
    tracing::debug!(path = %path.display(), dropped, kept = kept.len(), "pruned metrics rows");
    Ok(())
}

#[cfg(test)]
#[path = "metrics_csv_tests.rs"]
mod tests;
