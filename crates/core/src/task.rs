// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identity and classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a task's output is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Plain scheduled command; every run is retained.
    Schedule,
    /// Stdout carries metric tokens; clean runs are not retained.
    Monitor,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Schedule => "schedule",
            TaskKind::Monitor => "monitor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "schedule" => Some(TaskKind::Schedule),
            "monitor" => Some(TaskKind::Monitor),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named unit of schedulable work.
///
/// A task resolves its command one of two ways: a `job_id` pointing into the
/// job catalogue (argv execution, no shell), or an inline `command_template`
/// run through the shell. `timeout_sec_default` of zero means "use the
/// configured default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub kind: TaskKind,
    pub command_template: Option<String>,
    pub job_id: Option<String>,
    pub timeout_sec_default: u32,
    pub enabled: bool,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a task; the store allocates the id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub kind: Option<TaskKind>,
    pub command_template: Option<String>,
    pub job_id: Option<String>,
    pub timeout_sec_default: u32,
    pub enabled: bool,
    pub remark: Option<String>,
}

impl NewTask {
    /// Minimal schedule task with an inline shell command.
    pub fn shell(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(TaskKind::Schedule),
            command_template: Some(command.into()),
            enabled: true,
            ..Default::default()
        }
    }

    /// Monitor task with an inline shell command.
    pub fn monitor(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind: Some(TaskKind::Monitor),
            ..Self::shell(name, command)
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind.unwrap_or(TaskKind::Schedule)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
