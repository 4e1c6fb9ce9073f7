// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job catalogue: named argv templates loaded from a JSON file.
//!
//! The file is either a list of entries or an object with a `jobs` list.
//! Each entry carries `{id, cmd[], label?, style?}`. `[label]`/`{label}` and
//! `[style]`/`{style}` tokens resolve at load time; `[task_name]`/
//! `{task_name}` resolve when a run materialises its argv. Reload swaps the
//! whole snapshot or keeps the previous one and records a diagnostic.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Catalogue load failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected a list or an object with a \"jobs\" list")]
    Shape,
}

/// One catalogue entry with load-time tokens already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub id: String,
    pub cmd: Vec<String>,
    pub label: Option<String>,
    pub style: Option<String>,
}

impl JobSpec {
    /// Materialise the argv for a task, resolving `[task_name]`/`{task_name}`
    /// and appending any positional args.
    pub fn argv(&self, task_name: &str, extra_args: &[String]) -> Vec<String> {
        let mut argv: Vec<String> = self
            .cmd
            .iter()
            .map(|arg| {
                arg.replace("[task_name]", task_name)
                    .replace("{task_name}", task_name)
            })
            .collect();
        argv.extend(extra_args.iter().cloned());
        argv
    }
}

/// Immutable view of the catalogue at one load.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    jobs: HashMap<String, JobSpec>,
}

impl CatalogSnapshot {
    pub fn get(&self, id: &str) -> Option<&JobSpec> {
        self.jobs.get(id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }
}

fn resolve_load_tokens(arg: &str, label: &str, style: &str) -> String {
    arg.replace("[label]", label)
        .replace("{label}", label)
        .replace("[style]", style)
        .replace("{style}", style)
}

/// Parse catalogue text into a snapshot.
///
/// Entries lacking an `id` or whose `cmd` is not an array of strings are
/// silently discarded; a later duplicate id replaces an earlier one.
pub fn parse_catalog(text: &str) -> Result<CatalogSnapshot, CatalogError> {
    let value: Value = serde_json::from_str(text)?;
    let entries = match &value {
        Value::Array(list) => list.as_slice(),
        Value::Object(map) => match map.get("jobs") {
            Some(Value::Array(list)) => list.as_slice(),
            _ => return Err(CatalogError::Shape),
        },
        _ => return Err(CatalogError::Shape),
    };

    let mut jobs = HashMap::new();
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            continue;
        };
        let Some(id) = obj.get("id").and_then(Value::as_str) else {
            continue;
        };
        let Some(cmd_list) = obj.get("cmd").and_then(Value::as_array) else {
            continue;
        };
        let label = obj.get("label").and_then(Value::as_str);
        let style = obj.get("style").and_then(Value::as_str);

        let cmd: Vec<String> = cmd_list
            .iter()
            .filter_map(Value::as_str)
            .map(|arg| resolve_load_tokens(arg, label.unwrap_or(""), style.unwrap_or("")))
            .collect();
        if cmd.len() != cmd_list.len() {
            // Non-string members: discard the entry rather than run a
            // truncated command line.
            continue;
        }

        jobs.insert(
            id.to_string(),
            JobSpec {
                id: id.to_string(),
                cmd,
                label: label.map(str::to_string),
                style: style.map(str::to_string),
            },
        );
    }

    Ok(CatalogSnapshot { jobs })
}

/// Shared catalogue with whole-snapshot reload.
pub struct Catalog {
    path: PathBuf,
    snapshot: Mutex<Arc<CatalogSnapshot>>,
    diagnostic: Mutex<Option<String>>,
}

impl Catalog {
    /// Create an empty catalogue bound to `path`. No I/O happens here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: Mutex::new(Arc::new(CatalogSnapshot::default())),
            diagnostic: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot (cheap clone of an `Arc`).
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.snapshot.lock())
    }

    /// Diagnostic from the last failed reload, cleared by a successful one.
    pub fn diagnostic(&self) -> Option<String> {
        self.diagnostic.lock().clone()
    }

    /// Re-read the file and swap the snapshot.
    ///
    /// A missing file loads as an empty catalogue. Any other failure keeps
    /// the previous snapshot and records the diagnostic. Returns whether the
    /// snapshot was replaced.
    pub fn reload(&self) -> bool {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                *self.snapshot.lock() = Arc::new(CatalogSnapshot::default());
                *self.diagnostic.lock() = None;
                return true;
            }
            Err(e) => {
                let err = CatalogError::Io {
                    path: self.path.clone(),
                    source: e,
                };
                tracing::warn!(error = %err, "catalogue reload failed");
                *self.diagnostic.lock() = Some(err.to_string());
                return false;
            }
        };

        match parse_catalog(&text) {
            Ok(snapshot) => {
                *self.snapshot.lock() = Arc::new(snapshot);
                *self.diagnostic.lock() = None;
                true
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "catalogue reload failed");
                *self.diagnostic.lock() = Some(err.to_string());
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
