// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store handle, connection setup, and schema.

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt {what} in row {id}: {value}")]
    Corrupt {
        what: &'static str,
        id: i64,
        value: String,
    },
    #[error("run {run_id} cannot move to {to}")]
    InvalidTransition { run_id: i64, to: &'static str },
}

/// SQLite store behind a single serialized connection.
///
/// WAL mode keeps concurrent `Store` handles on the same file safe; within
/// one handle the mutex serializes statements, so every multi-statement
/// operation below is atomic with respect to this handle and transactional
/// with respect to others.
pub struct Store {
    pub(crate) conn: Mutex<Connection>,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA foreign_keys=ON;\n\
             PRAGMA busy_timeout=5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS tasks (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT NOT NULL UNIQUE,
    kind                TEXT NOT NULL,
    command_template    TEXT,
    job_id              TEXT,
    timeout_sec_default INTEGER NOT NULL DEFAULT 0,
    enabled             INTEGER NOT NULL DEFAULT 1,
    remark              TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS triggers (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id         INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    trigger_type    TEXT NOT NULL,
    cron_expr       TEXT,
    interval_sec    INTEGER,
    deadline_config TEXT,
    holiday_policy  TEXT NOT NULL DEFAULT 'NONE',
    enabled         INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_triggers_task ON triggers(task_id);

CREATE TABLE IF NOT EXISTS runs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id       INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    trigger_id    INTEGER REFERENCES triggers(id) ON DELETE SET NULL,
    status        TEXT NOT NULL,
    scheduled_at  TEXT NOT NULL,
    started_at    TEXT,
    finished_at   TEXT,
    exit_code     INTEGER,
    stdout_path   TEXT,
    stderr_path   TEXT,
    error_message TEXT
);
CREATE INDEX IF NOT EXISTS idx_runs_status ON runs(status);
CREATE INDEX IF NOT EXISTS idx_runs_task ON runs(task_id);

-- Legacy single-row-per-metric table. Monitor metrics persist to per-task
-- CSV files; this table is kept for readers of the old layout.
CREATE TABLE IF NOT EXISTS metrics (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    ts      TEXT NOT NULL,
    key     TEXT NOT NULL DEFAULT 'value',
    value   REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_metrics_task ON metrics(task_id);
CREATE INDEX IF NOT EXISTS idx_metrics_ts ON metrics(ts);

CREATE TABLE IF NOT EXISTS alert_state (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id      INTEGER NOT NULL,
    alert_type   TEXT NOT NULL,
    last_sent_at TEXT,
    UNIQUE(task_id, alert_type)
);

CREATE TABLE IF NOT EXISTS alerts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id    INTEGER NOT NULL,
    alert_type TEXT NOT NULL,
    message    TEXT NOT NULL,
    suppressed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
";

#[cfg(test)]
#[path = "store_tests/mod.rs"]
mod tests;
