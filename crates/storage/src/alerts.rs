// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert ledger and per-(task, kind) suppression state.

use crate::store::{Store, StoreError};
use chrono::{DateTime, Duration, Utc};
use jobmill_core::{Alert, AlertKind, AlertState};
use rusqlite::{params, OptionalExtension, Row};

/// Result of recording one alert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertOutcome {
    pub alert_id: i64,
    pub suppressed: bool,
}

fn row_to_alert(row: &Row<'_>) -> rusqlite::Result<(Alert, String)> {
    let kind_text: String = row.get("alert_type")?;
    let alert = Alert {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        kind: AlertKind::ExecFailed, // patched by the caller from kind_text
        message: row.get("message")?,
        suppressed: row.get("suppressed")?,
        created_at: row.get("created_at")?,
    };
    Ok((alert, kind_text))
}

fn finish_alert((mut alert, kind_text): (Alert, String)) -> Result<Alert, StoreError> {
    alert.kind = AlertKind::parse(&kind_text).ok_or(StoreError::Corrupt {
        what: "alert kind",
        id: alert.id,
        value: kind_text,
    })?;
    Ok(alert)
}

impl Store {
    /// Record an alert attempt, deciding suppression in the same transaction.
    ///
    /// The attempt always lands in `alerts`; `last_sent_at` advances only
    /// when the attempt is delivered, so the suppression window is measured
    /// from the last delivery.
    pub fn record_alert(
        &self,
        task_id: i64,
        kind: AlertKind,
        message: &str,
        suppress_window: Duration,
        now: DateTime<Utc>,
    ) -> Result<AlertOutcome, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let last_sent_at: Option<DateTime<Utc>> = tx
            .query_row(
                "SELECT last_sent_at FROM alert_state \
                 WHERE task_id = ?1 AND alert_type = ?2",
                params![task_id, kind.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let suppressed = match last_sent_at {
            Some(last) => now - last < suppress_window,
            None => false,
        };

        tx.execute(
            "INSERT INTO alerts (task_id, alert_type, message, suppressed, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task_id, kind.as_str(), message, suppressed, now],
        )?;
        let alert_id = tx.last_insert_rowid();

        if !suppressed {
            tx.execute(
                "INSERT INTO alert_state (task_id, alert_type, last_sent_at) \
                 VALUES (?1, ?2, ?3) \
                 ON CONFLICT(task_id, alert_type) DO UPDATE SET last_sent_at = excluded.last_sent_at",
                params![task_id, kind.as_str(), now],
            )?;
        }

        tx.commit()?;
        Ok(AlertOutcome {
            alert_id,
            suppressed,
        })
    }

    pub fn alert_state(
        &self,
        task_id: i64,
        kind: AlertKind,
    ) -> Result<Option<AlertState>, StoreError> {
        let conn = self.conn.lock();
        let last: Option<Option<DateTime<Utc>>> = conn
            .query_row(
                "SELECT last_sent_at FROM alert_state \
                 WHERE task_id = ?1 AND alert_type = ?2",
                params![task_id, kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(last.map(|last_sent_at| AlertState {
            task_id,
            kind,
            last_sent_at,
        }))
    }

    /// Most recent alerts first.
    pub fn list_alerts(&self, limit: usize) -> Result<Vec<Alert>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, alert_type, message, suppressed, created_at \
             FROM alerts ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], row_to_alert)?;
        rows.map(|r| finish_alert(r?)).collect()
    }

    pub fn alerts_for_task(&self, task_id: i64) -> Result<Vec<Alert>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, alert_type, message, suppressed, created_at \
             FROM alerts WHERE task_id = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([task_id], row_to_alert)?;
        rows.map(|r| finish_alert(r?)).collect()
    }
}
