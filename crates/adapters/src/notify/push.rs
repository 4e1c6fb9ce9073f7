// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push-script notifier.
//!
//! Invokes the configured push script as a detached child:
//! `script <message> -t <title> -g <group> -l <level>`, all stdio nulled.
//! The child is never waited on and spawn failures are swallowed.

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Clone, Debug)]
pub struct PushScriptNotifier {
    script: String,
    title: String,
    group: String,
    level: String,
}

impl PushScriptNotifier {
    pub fn new(
        script: impl Into<String>,
        title: impl Into<String>,
        group: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            script: script.into(),
            title: title.into(),
            group: group.into(),
            level: level.into(),
        }
    }
}

#[async_trait]
impl Notifier for PushScriptNotifier {
    async fn push(&self, message: &str) -> Result<(), NotifyError> {
        let spawned = Command::new(&self.script)
            .arg(message)
            .arg("-t")
            .arg(&self.title)
            .arg("-g")
            .arg(&self.group)
            .arg("-l")
            .arg(&self.level)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_child) => {
                // Dropped without waiting; the runtime reaps it on exit.
                tracing::debug!(script = %self.script, "push notification spawned");
            }
            Err(err) => {
                tracing::warn!(script = %self.script, %err, "push notification spawn failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
