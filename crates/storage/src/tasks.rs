// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and trigger records.

use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use jobmill_core::{DeadlineSpec, HolidayPolicy, NewTask, Task, TaskKind, Trigger, TriggerKind};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<(Task, String)> {
    let kind_text: String = row.get("kind")?;
    let task = Task {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: TaskKind::Schedule, // patched by the caller from kind_text
        command_template: row.get("command_template")?,
        job_id: row.get("job_id")?,
        timeout_sec_default: row.get("timeout_sec_default")?,
        enabled: row.get("enabled")?,
        remark: row.get("remark")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    Ok((task, kind_text))
}

fn finish_task((mut task, kind_text): (Task, String)) -> Result<Task, StoreError> {
    task.kind = TaskKind::parse(&kind_text).ok_or(StoreError::Corrupt {
        what: "task kind",
        id: task.id,
        value: kind_text,
    })?;
    Ok(task)
}

const TASK_COLUMNS: &str = "id, name, kind, command_template, job_id, timeout_sec_default, \
                            enabled, remark, created_at, updated_at";

impl Store {
    /// Insert a task and return the stored record.
    pub fn create_task(&self, new: &NewTask, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tasks (name, kind, command_template, job_id, timeout_sec_default, \
                                enabled, remark, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                new.name,
                new.kind().as_str(),
                new.command_template,
                new.job_id,
                new.timeout_sec_default,
                new.enabled,
                new.remark,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Task {
            id,
            name: new.name.clone(),
            kind: new.kind(),
            command_template: new.command_template.clone(),
            job_id: new.job_id.clone(),
            timeout_sec_default: new.timeout_sec_default,
            enabled: new.enabled,
            remark: new.remark.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            [id],
            row_to_task,
        )
        .optional()?
        .map(finish_task)
        .transpose()
    }

    pub fn task_by_name(&self, name: &str) -> Result<Option<Task>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE name = ?1"),
            [name],
            row_to_task,
        )
        .optional()?
        .map(finish_task)
        .transpose()
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id DESC"))?;
        let rows = stmt.query_map([], row_to_task)?;
        rows.map(|r| finish_task(r?)).collect()
    }

    pub fn task_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        Ok(conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?)
    }

    /// Update the mutable fields of a task; bumps `updated_at`.
    pub fn update_task(&self, task: &Task, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE tasks SET name = ?1, kind = ?2, command_template = ?3, job_id = ?4, \
                              timeout_sec_default = ?5, enabled = ?6, remark = ?7, \
                              updated_at = ?8 \
             WHERE id = ?9",
            params![
                task.name,
                task.kind.as_str(),
                task.command_template,
                task.job_id,
                task.timeout_sec_default,
                task.enabled,
                task.remark,
                now,
                task.id,
            ],
        )?;
        Ok(changed == 1)
    }

    pub fn set_task_enabled(
        &self,
        id: i64,
        enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE tasks SET enabled = ?1, updated_at = ?2 WHERE id = ?3",
            params![enabled, now, id],
        )?;
        Ok(changed == 1)
    }

    /// Delete a task; triggers and runs cascade.
    pub fn delete_task(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        Ok(changed == 1)
    }
}

fn row_to_trigger(row: &Row<'_>) -> rusqlite::Result<RawTrigger> {
    Ok(RawTrigger {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        trigger_type: row.get("trigger_type")?,
        cron_expr: row.get("cron_expr")?,
        interval_sec: row.get("interval_sec")?,
        deadline_config: row.get("deadline_config")?,
        holiday_policy: row.get("holiday_policy")?,
        enabled: row.get("enabled")?,
    })
}

struct RawTrigger {
    id: i64,
    task_id: i64,
    trigger_type: String,
    cron_expr: Option<String>,
    interval_sec: Option<i64>,
    deadline_config: Option<String>,
    holiday_policy: String,
    enabled: bool,
}

impl RawTrigger {
    /// Assemble the typed trigger; `None` for rows whose payload does not
    /// match their declared type (skipped by callers, never fatal).
    fn assemble(self) -> Option<Trigger> {
        let kind = match self.trigger_type.as_str() {
            "interval" => TriggerKind::Interval {
                interval_sec: u64::try_from(self.interval_sec?).ok()?,
            },
            "cron" => TriggerKind::Cron {
                expr: self.cron_expr?,
            },
            "deadline" => {
                let spec: DeadlineSpec = serde_json::from_str(&self.deadline_config?).ok()?;
                TriggerKind::Deadline(spec)
            }
            _ => return None,
        };
        let holiday_policy = HolidayPolicy::parse(&self.holiday_policy)?;
        Some(Trigger {
            id: self.id,
            task_id: self.task_id,
            kind,
            holiday_policy,
            enabled: self.enabled,
        })
    }
}

const TRIGGER_COLUMNS: &str =
    "id, task_id, trigger_type, cron_expr, interval_sec, deadline_config, holiday_policy, enabled";

/// Map a trigger kind onto its payload columns, `None` for the rest.
fn kind_columns(
    kind: &TriggerKind,
    row_id: i64,
) -> Result<(Option<String>, Option<i64>, Option<String>), StoreError> {
    match kind {
        TriggerKind::Interval { interval_sec } => Ok((None, Some(*interval_sec as i64), None)),
        TriggerKind::Cron { expr } => Ok((Some(expr.clone()), None, None)),
        TriggerKind::Deadline(spec) => {
            let config = serde_json::to_string(spec).map_err(|e| StoreError::Corrupt {
                what: "deadline config",
                id: row_id,
                value: e.to_string(),
            })?;
            Ok((None, None, Some(config)))
        }
    }
}

impl Store {
    /// Insert a trigger for a task.
    pub fn create_trigger(
        &self,
        task_id: i64,
        kind: &TriggerKind,
        holiday_policy: HolidayPolicy,
        enabled: bool,
    ) -> Result<Trigger, StoreError> {
        let (cron_expr, interval_sec, deadline_config) = kind_columns(kind, task_id)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO triggers (task_id, trigger_type, cron_expr, interval_sec, \
                                   deadline_config, holiday_policy, enabled) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task_id,
                kind.type_str(),
                cron_expr,
                interval_sec,
                deadline_config,
                holiday_policy.as_str(),
                enabled,
            ],
        )?;
        Ok(Trigger {
            id: conn.last_insert_rowid(),
            task_id,
            kind: kind.clone(),
            holiday_policy,
            enabled,
        })
    }

    pub fn trigger(&self, id: i64) -> Result<Option<Trigger>, StoreError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                &format!("SELECT {TRIGGER_COLUMNS} FROM triggers WHERE id = ?1"),
                [id],
                row_to_trigger,
            )
            .optional()?;
        Ok(raw.and_then(RawTrigger::assemble))
    }

    /// All enabled triggers, malformed rows skipped with a warning.
    pub fn list_enabled_triggers(&self) -> Result<Vec<Trigger>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRIGGER_COLUMNS} FROM triggers WHERE enabled = 1 ORDER BY id"
        ))?;
        let rows = stmt.query_map([], row_to_trigger)?;
        let mut triggers = Vec::new();
        for raw in rows {
            let raw = raw?;
            let id = raw.id;
            match raw.assemble() {
                Some(t) => triggers.push(t),
                None => tracing::warn!(trigger_id = id, "skipping malformed trigger row"),
            }
        }
        Ok(triggers)
    }

    pub fn list_triggers_for_task(&self, task_id: i64) -> Result<Vec<Trigger>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRIGGER_COLUMNS} FROM triggers WHERE task_id = ?1 ORDER BY id DESC"
        ))?;
        let rows = stmt.query_map([task_id], row_to_trigger)?;
        let mut triggers = Vec::new();
        for raw in rows {
            if let Some(t) = raw?.assemble() {
                triggers.push(t);
            }
        }
        Ok(triggers)
    }

    /// Rewrite the mutable fields of a trigger: kind payload, holiday
    /// policy, enabled flag. Stale payload columns from a previous kind are
    /// cleared.
    pub fn update_trigger(&self, trigger: &Trigger) -> Result<bool, StoreError> {
        let (cron_expr, interval_sec, deadline_config) =
            kind_columns(&trigger.kind, trigger.id)?;
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE triggers SET trigger_type = ?1, cron_expr = ?2, interval_sec = ?3, \
                                 deadline_config = ?4, holiday_policy = ?5, enabled = ?6 \
             WHERE id = ?7",
            params![
                trigger.kind.type_str(),
                cron_expr,
                interval_sec,
                deadline_config,
                trigger.holiday_policy.as_str(),
                trigger.enabled,
                trigger.id,
            ],
        )?;
        Ok(changed == 1)
    }

    pub fn set_trigger_enabled(&self, id: i64, enabled: bool) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE triggers SET enabled = ?1 WHERE id = ?2",
            params![enabled, id],
        )?;
        Ok(changed == 1)
    }

    pub fn delete_trigger(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM triggers WHERE id = ?1", [id])?;
        Ok(changed == 1)
    }
}
