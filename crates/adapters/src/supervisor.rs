// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess supervision with process-group timeout handling.
//!
//! Children run in their own process group so the whole tree can be
//! signalled. On timeout the group gets SIGTERM, a grace period, then
//! SIGKILL. Output is captured fully into memory; a straggler holding the
//! pipe open past process exit cannot wedge the supervisor because capture
//! runs against shared buffers that are snapshotted at the end.

use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Default grace between SIGTERM and SIGKILL.
pub const DEFAULT_TERM_GRACE: Duration = Duration::from_secs(5);

/// Exit code reported when the TERM path ends the child without a real code.
const EXIT_TIMEOUT_TERM: i32 = 124;

/// Exit code reported when the child had to be SIGKILLed.
const EXIT_TIMEOUT_KILL: i32 = 137;

/// Result of one supervised execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Supervision failures. Spawn errors are distinct so the execution engine
/// can classify them as internal errors.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("empty argv")]
    EmptyArgv,
    #[error("wait failed: {0}")]
    Wait(#[from] std::io::Error),
}

/// Run a command line through the POSIX shell.
pub async fn run_shell(
    command: &str,
    timeout: Duration,
    term_grace: Duration,
) -> Result<ExecOutcome, SupervisorError> {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    supervise(cmd, command, timeout, term_grace).await
}

/// Run an argv vector directly, no shell.
pub async fn run_argv(
    argv: &[String],
    timeout: Duration,
    term_grace: Duration,
) -> Result<ExecOutcome, SupervisorError> {
    let (program, args) = argv.split_first().ok_or(SupervisorError::EmptyArgv)?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    supervise(cmd, &argv.join(" "), timeout, term_grace).await
}

async fn supervise(
    mut cmd: Command,
    cmd_display: &str,
    timeout: Duration,
    term_grace: Duration,
) -> Result<ExecOutcome, SupervisorError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
        command: cmd_display.to_string(),
        source,
    })?;
    let pid = child.id();

    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let stdout_task = child.stdout.take().map(|s| drain(s, Arc::clone(&stdout_buf)));
    let stderr_task = child.stderr.take().map(|s| drain(s, Arc::clone(&stderr_buf)));

    let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => (exit_code_of(status?), false),
        Err(_elapsed) => {
            tracing::warn!(
                command = cmd_display,
                timeout_sec = timeout.as_secs(),
                "timeout, terminating process group"
            );
            signal_group(pid, &mut child, TreeSignal::Term).await;

            match tokio::time::timeout(term_grace, child.wait()).await {
                // Real exit during grace keeps the child's own code when
                // it has one; signal death reports the TERM-path code.
                Ok(status) => (status?.code().unwrap_or(EXIT_TIMEOUT_TERM), true),
                Err(_elapsed) => {
                    tracing::warn!(command = cmd_display, "grace expired, killing process group");
                    signal_group(pid, &mut child, TreeSignal::Kill).await;
                    let _ = child.wait().await?;
                    (EXIT_TIMEOUT_KILL, true)
                }
            }
        }
    };

    // Bounded join: the group is normally dead here, so the readers hit EOF
    // immediately. A TERM-ignoring straggler keeping the pipe open only
    // costs us the grace period, not a hang.
    join_reader(stdout_task, term_grace).await;
    join_reader(stderr_task, term_grace).await;

    let stdout = String::from_utf8_lossy(&stdout_buf.lock()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_buf.lock()).into_owned();

    Ok(ExecOutcome {
        exit_code,
        stdout,
        stderr,
        timed_out,
    })
}

fn drain<R>(mut stream: R, buf: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.lock().extend_from_slice(&chunk[..n]),
            }
        }
    })
}

async fn join_reader(task: Option<JoinHandle<()>>, grace: Duration) {
    if let Some(task) = task {
        if tokio::time::timeout(grace, task).await.is_err() {
            tracing::debug!("output reader still draining after process exit, snapshotting");
        }
    }
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(-1)
    }
}

#[derive(Clone, Copy)]
enum TreeSignal {
    Term,
    Kill,
}

/// Signal the child's process group; on non-Unix hosts fall back to a
/// best-effort kill of the immediate child.
#[cfg(unix)]
async fn signal_group(pid: Option<u32>, _child: &mut Child, signal: TreeSignal) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    let pgid = Pid::from_raw(pid as i32);
    let signal = match signal {
        TreeSignal::Term => Signal::SIGTERM,
        TreeSignal::Kill => Signal::SIGKILL,
    };
    if let Err(err) = killpg(pgid, signal) {
        tracing::debug!(pid, ?signal, %err, "process group signal failed");
    }
}

#[cfg(not(unix))]
async fn signal_group(_pid: Option<u32>, child: &mut Child, _signal: TreeSignal) {
    let _ = child.start_kill();
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
