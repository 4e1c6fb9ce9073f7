// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run lifecycle: enqueue, claim, terminal transitions, zombie sweep.

use crate::store::{Store, StoreError};
use chrono::{DateTime, Duration, Utc};
use jobmill_core::{Run, RunStatus};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<(Run, String)> {
    let status_text: String = row.get("status")?;
    let run = Run {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        trigger_id: row.get("trigger_id")?,
        status: RunStatus::Pending, // patched by the caller from status_text
        scheduled_at: row.get("scheduled_at")?,
        started_at: row.get("started_at")?,
        finished_at: row.get("finished_at")?,
        exit_code: row.get("exit_code")?,
        stdout_path: row.get("stdout_path")?,
        stderr_path: row.get("stderr_path")?,
        error_message: row.get("error_message")?,
    };
    Ok((run, status_text))
}

fn finish_run_row((mut run, status_text): (Run, String)) -> Result<Run, StoreError> {
    run.status = RunStatus::parse(&status_text).ok_or(StoreError::Corrupt {
        what: "run status",
        id: run.id,
        value: status_text,
    })?;
    Ok(run)
}

const RUN_COLUMNS: &str = "id, task_id, trigger_id, status, scheduled_at, started_at, \
                           finished_at, exit_code, stdout_path, stderr_path, error_message";

impl Store {
    /// Insert a PENDING run.
    pub fn enqueue_run(
        &self,
        task_id: i64,
        trigger_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO runs (task_id, trigger_id, status, scheduled_at) \
             VALUES (?1, ?2, 'PENDING', ?3)",
            params![task_id, trigger_id, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn run(&self, id: i64) -> Result<Option<Run>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
            [id],
            row_to_run,
        )
        .optional()?
        .map(finish_run_row)
        .transpose()
    }

    /// PENDING run ids, oldest `scheduled_at` first.
    pub fn pending_run_ids(&self, limit: usize) -> Result<Vec<i64>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id FROM runs WHERE status = 'PENDING' \
             ORDER BY scheduled_at ASC, id ASC LIMIT ?1",
        )?;
        let ids = stmt.query_map([limit as i64], |row| row.get(0))?;
        Ok(ids.collect::<rusqlite::Result<_>>()?)
    }

    /// Atomically claim a PENDING run.
    ///
    /// Exactly one caller observes `true` for a given run; everyone else
    /// (another worker, an admin mutation racing ahead) sees `false`.
    pub fn claim_run(&self, id: i64, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE runs SET status = 'RUNNING', started_at = ?1 \
             WHERE id = ?2 AND status = 'PENDING'",
            params![now, id],
        )?;
        Ok(changed == 1)
    }

    /// Fail RUNNING rows older than `zombie_after`, left behind by a crashed
    /// process. Returns how many rows were reclaimed.
    pub fn sweep_zombies(
        &self,
        zombie_after: Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let cutoff = now - zombie_after;
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE runs SET status = 'FAILED', finished_at = ?1, \
                             error_message = 'Zombie run auto-failed' \
             WHERE status = 'RUNNING' AND started_at < ?2",
            params![now, cutoff],
        )?;
        if changed > 0 {
            tracing::warn!(count = changed, "auto-failed zombie runs");
        }
        Ok(changed)
    }

    /// Move a RUNNING run to a terminal status.
    ///
    /// The `status = 'RUNNING'` guard keeps transitions monotonic: a row
    /// already moved (say by the zombie sweep) is left untouched and the
    /// caller learns it via `false`.
    pub fn finish_run(
        &self,
        id: i64,
        status: RunStatus,
        exit_code: Option<i32>,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Every terminal transition funnels through here; the state machine
        // rejects non-terminal targets before any SQL runs.
        if !RunStatus::Running.can_advance_to(status) {
            return Err(StoreError::InvalidTransition {
                run_id: id,
                to: status.as_str(),
            });
        }
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, exit_code = ?3, \
                             error_message = ?4 \
             WHERE id = ?5 AND status = 'RUNNING'",
            params![status.as_str(), now, exit_code, error_message, id],
        )?;
        Ok(changed == 1)
    }

    /// Record where a run's output landed.
    pub fn set_run_log_paths(
        &self,
        id: i64,
        stdout_path: &str,
        stderr_path: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE runs SET stdout_path = ?1, stderr_path = ?2 WHERE id = ?3",
            params![stdout_path, stderr_path, id],
        )?;
        Ok(changed == 1)
    }

    /// Whether a RUNNING peer of the same task claimed before this run did.
    ///
    /// Ordering is by `(started_at, id)`. Using claim order instead of a bare
    /// existence probe keeps the reentrancy collision asymmetric: when two
    /// runs of one task are claimed at the same instant, exactly one sees a
    /// predecessor and demotes itself; the other proceeds.
    pub fn has_running_predecessor(
        &self,
        task_id: i64,
        run_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, started_at FROM runs \
             WHERE task_id = ?1 AND status = 'RUNNING' AND id != ?2",
        )?;
        let peers = stmt.query_map(params![task_id, run_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<DateTime<Utc>>>(1)?))
        })?;
        for peer in peers {
            let (peer_id, peer_started) = peer?;
            // A RUNNING peer without started_at cannot exist through the
            // claim path; treat it as a predecessor to stay on the safe side.
            let Some(peer_started) = peer_started else {
                return Ok(true);
            };
            if (peer_started, peer_id) < (started_at, run_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Delete a run row (successful monitor runs are not retained).
    pub fn delete_run(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM runs WHERE id = ?1", [id])?;
        Ok(changed == 1)
    }

    /// Most recent runs first.
    pub fn list_runs(&self, limit: usize) -> Result<Vec<Run>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM runs ORDER BY id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map([limit as i64], row_to_run)?;
        rows.map(|r| finish_run_row(r?)).collect()
    }

    pub fn runs_for_task(&self, task_id: i64) -> Result<Vec<Run>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM runs WHERE task_id = ?1 ORDER BY id DESC"
        ))?;
        let rows = stmt.query_map([task_id], row_to_run)?;
        rows.map(|r| finish_run_row(r?)).collect()
    }
}
