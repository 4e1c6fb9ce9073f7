// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run execution engine.
//!
//! A run moves through a fixed step sequence: claim, zombie sweep, task
//! gate, reentrancy mutex, command resolution, supervised execution,
//! classification, log capture, metrics, monitor cleanup, alerts. Every
//! error path transitions the row to a terminal state; the single outer
//! recovery in [`Executor::execute_run`] writes the internal-error path for
//! anything the steps did not handle themselves.

use crate::{alerts::AlertEngine, metrics_csv, run_logs, EngineError};
use jobmill_adapters::{run_argv, run_shell, Notifier, DEFAULT_TERM_GRACE};
use jobmill_core::{
    parse_monitor_stdout, AlertKind, Catalog, Clock, Config, RunStatus, Task, TaskKind,
};
use jobmill_storage::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Exit code for a run refused by the reentrancy mutex.
const EXIT_REENTRY: i32 = 99;

/// Exit code for an unexpected engine failure.
const EXIT_INTERNAL: i32 = 98;

/// Exit code for a missing catalogue job.
const EXIT_JOB_MISSING: i32 = 97;

enum ResolvedCommand {
    Shell(String),
    Argv(Vec<String>),
}

/// Drives claimed runs to a terminal state.
pub struct Executor<N: Notifier, C: Clock> {
    store: Arc<Store>,
    catalog: Arc<Catalog>,
    alerts: AlertEngine<N>,
    clock: C,
    config: Arc<Config>,
}

impl<N: Notifier, C: Clock> Executor<N, C> {
    pub fn new(
        store: Arc<Store>,
        catalog: Arc<Catalog>,
        notifier: N,
        clock: C,
        config: Arc<Config>,
    ) -> Self {
        let alerts = AlertEngine::new(Arc::clone(&store), notifier, config.alert_suppress_sec);
        Self {
            store,
            catalog,
            alerts,
            clock,
            config,
        }
    }

    /// Execute one run end to end. Never returns an error: the outer
    /// recovery writes the `internal_error` terminal path instead.
    pub async fn execute_run(&self, run_id: i64) {
        let span = tracing::info_span!("run", run_id);
        if let Err(err) = self.try_execute(run_id).instrument(span).await {
            self.fail_internal(run_id, &err).await;
        }
    }

    async fn try_execute(&self, run_id: i64) -> Result<(), EngineError> {
        // 1. Atomic claim: exactly one worker wins the PENDING row.
        if !self.store.claim_run(run_id, self.clock.now_utc())? {
            tracing::debug!("claim lost, abandoning");
            return Ok(());
        }

        // 2. Opportunistic zombie sweep, once per claim.
        self.store.sweep_zombies(
            chrono::Duration::seconds(self.config.run_zombie_sec as i64),
            self.clock.now_utc(),
        )?;

        let run = self
            .store
            .run(run_id)?
            .ok_or(EngineError::RunVanished(run_id))?;

        // 3. Task gate.
        let task = match self.store.task(run.task_id)? {
            Some(task) if task.enabled => task,
            _ => {
                tracing::info!(task_id = run.task_id, "task missing or disabled, skipping");
                self.store.finish_run(
                    run_id,
                    RunStatus::Skipped,
                    None,
                    None,
                    self.clock.now_utc(),
                )?;
                return Ok(());
            }
        };

        // 4. Reentrancy mutex: at most one RUNNING row per task. The probe
        // is ordered by claim time so two simultaneous claimers cannot
        // demote each other; only the later one backs off.
        let started_at = run.started_at.unwrap_or_else(|| self.clock.now_utc());
        if self
            .store
            .has_running_predecessor(task.id, run_id, started_at)?
        {
            self.store.finish_run(
                run_id,
                RunStatus::Failed,
                Some(EXIT_REENTRY),
                Some("Task is already RUNNING (non-reentrant)."),
                self.clock.now_utc(),
            )?;
            self.alerts
                .raise(
                    task.id,
                    AlertKind::Reentry,
                    &format!("{}: reentry blocked", task.name),
                    self.clock.now_utc(),
                )
                .await;
            return Ok(());
        }

        // 5. Resolve the command.
        let command = match self.resolve_command(&task) {
            Ok(command) => command,
            Err(job_id) => {
                let message = format!("Job not found: {job_id}");
                self.store.finish_run(
                    run_id,
                    RunStatus::Failed,
                    Some(EXIT_JOB_MISSING),
                    Some(&message),
                    self.clock.now_utc(),
                )?;
                self.alerts
                    .raise(
                        task.id,
                        AlertKind::JobMissing,
                        &format!("{}: {message}", task.name),
                        self.clock.now_utc(),
                    )
                    .await;
                return Ok(());
            }
        };

        // 6. Execute under supervision. Spawn failures bubble out as the
        // internal-error path.
        let timeout = Duration::from_secs(self.timeout_for(&task));
        let outcome = match &command {
            ResolvedCommand::Shell(cmd) => run_shell(cmd, timeout, DEFAULT_TERM_GRACE).await?,
            ResolvedCommand::Argv(argv) => run_argv(argv, timeout, DEFAULT_TERM_GRACE).await?,
        };

        // 7. Classify.
        let status = if outcome.timed_out {
            RunStatus::Timeout
        } else if outcome.exit_code == 0 {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
        tracing::info!(
            status = %status,
            exit_code = outcome.exit_code,
            task = %task.name,
            "run finished"
        );

        // 8. Log capture: always for schedule tasks, only unclean runs for
        // monitors.
        if task.kind != TaskKind::Monitor || status != RunStatus::Success {
            self.capture_logs(run_id, &task, &outcome.stdout, &outcome.stderr);
        }

        self.store.finish_run(
            run_id,
            status,
            Some(outcome.exit_code),
            None,
            self.clock.now_utc(),
        )?;

        // 9. Metrics for monitor tasks.
        if task.kind == TaskKind::Monitor {
            let pairs = parse_monitor_stdout(&outcome.stdout);
            if !pairs.is_empty() {
                let local_now = self.clock.now_utc().with_timezone(&self.config.timezone);
                if let Err(err) = metrics_csv::append_metrics(
                    &self.config.metrics_dir,
                    task.id,
                    &task.name,
                    &pairs,
                    local_now,
                    self.config.metrics_retention_days,
                ) {
                    tracing::warn!(task = %task.name, %err, "metrics write failed");
                }
            }
        }

        // 10. Clean monitor runs leave no row behind.
        if task.kind == TaskKind::Monitor && status == RunStatus::Success {
            self.store.delete_run(run_id)?;
        }

        // 11. Alert on failure or timeout.
        if matches!(status, RunStatus::Failed | RunStatus::Timeout) {
            self.alerts
                .raise(
                    task.id,
                    AlertKind::ExecFailed,
                    &format!(
                        "{}: status={} code={}",
                        task.name, status, outcome.exit_code
                    ),
                    self.clock.now_utc(),
                )
                .await;
        }

        Ok(())
    }

    /// Step 12: the catch-all. Best-effort writes; the zombie sweep will
    /// reclaim the row if even these fail.
    async fn fail_internal(&self, run_id: i64, err: &EngineError) {
        tracing::error!(run_id, %err, "internal error");
        let message = format!("Internal error: {err}");
        let finished = self.store.finish_run(
            run_id,
            RunStatus::Failed,
            Some(EXIT_INTERNAL),
            Some(&message),
            self.clock.now_utc(),
        );
        match finished {
            Ok(true) => {}
            Ok(false) => {
                // Row was never claimed or already terminal; nothing to alert on.
                tracing::debug!(run_id, "internal error on a run not in RUNNING");
                return;
            }
            Err(finish_err) => {
                tracing::error!(run_id, %finish_err, "failed to record internal error");
                return;
            }
        }

        if let Ok(Some(run)) = self.store.run(run_id) {
            if let Ok(Some(task)) = self.store.task(run.task_id) {
                self.alerts
                    .raise(
                        task.id,
                        AlertKind::InternalError,
                        &format!("{}: {message}", task.name),
                        self.clock.now_utc(),
                    )
                    .await;
            }
        }
    }

    fn timeout_for(&self, task: &Task) -> u64 {
        if task.timeout_sec_default > 0 {
            task.timeout_sec_default as u64
        } else {
            self.config.default_timeout_sec as u64
        }
    }

    /// Catalogue tasks materialise argv; everything else goes through the
    /// shell. `Err` carries the missing job id.
    fn resolve_command(&self, task: &Task) -> Result<ResolvedCommand, String> {
        match &task.job_id {
            Some(job_id) => match self.catalog.snapshot().get(job_id) {
                Some(job) => Ok(ResolvedCommand::Argv(job.argv(&task.name, &[]))),
                None => Err(job_id.clone()),
            },
            None => Ok(ResolvedCommand::Shell(
                task.command_template.clone().unwrap_or_default(),
            )),
        }
    }

    fn capture_logs(&self, run_id: i64, task: &Task, stdout: &str, stderr: &str) {
        let local_now = self.clock.now_utc().with_timezone(&self.config.timezone);
        match run_logs::append_run_output(
            &self.config.log_dir,
            local_now,
            &task.name,
            run_id,
            stdout,
            stderr,
        ) {
            Ok(paths) => {
                if let Err(err) = self.store.set_run_log_paths(
                    run_id,
                    &paths.stdout_path.to_string_lossy(),
                    &paths.stderr_path.to_string_lossy(),
                ) {
                    tracing::warn!(run_id, %err, "failed to record log paths");
                }
            }
            Err(err) => tracing::warn!(run_id, %err, "failed to append run logs"),
        }
        run_logs::prune_old_logs(
            &self.config.log_dir,
            local_now.date_naive(),
            self.config.log_backup_count,
        );
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
