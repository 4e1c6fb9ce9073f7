// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert records and the per-(task, kind) suppression state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an alert-worthy condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A run was refused because another run of the task was RUNNING.
    Reentry,
    /// The task references a job id absent from the catalogue.
    JobMissing,
    /// Unexpected failure inside the execution engine.
    InternalError,
    /// Non-zero exit or timeout.
    ExecFailed,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Reentry => "reentry",
            AlertKind::JobMissing => "job_missing",
            AlertKind::InternalError => "internal_error",
            AlertKind::ExecFailed => "exec_failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reentry" => Some(AlertKind::Reentry),
            "job_missing" => Some(AlertKind::JobMissing),
            "internal_error" => Some(AlertKind::InternalError),
            "exec_failed" => Some(AlertKind::ExecFailed),
            _ => None,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification attempt, suppressed or delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub task_id: i64,
    pub kind: AlertKind,
    pub message: String,
    pub suppressed: bool,
    pub created_at: DateTime<Utc>,
}

/// Suppression bookkeeping, unique per (task, kind).
///
/// `last_sent_at` records the last *delivered* alert; attempts inside the
/// suppression window are logged but do not advance it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    pub task_id: i64,
    pub kind: AlertKind,
    pub last_sent_at: Option<DateTime<Utc>>,
}
