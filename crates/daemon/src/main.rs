// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jobmill daemon (jobmilld)
//!
//! Background process that owns the scheduling loop and the worker pool.
//! Configuration comes from the environment; see `jobmill_core::Config`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use jobmill_core::{Config, SystemClock};
use jobmill_core::Clock as _;
use jobmill_daemon::{lifecycle, seed};
use jobmill_storage::Store;
use std::path::Path;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags and subcommands before any setup.
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("jobmilld {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            "seed" => return run_seed(),
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: jobmilld [--help | --version | seed]");
                std::process::exit(1);
            }
        }
    }

    let config = Arc::new(Config::from_env());

    // Rotate the app log if it has grown too large, before tracing opens it.
    let log_path = config.log_dir.join(&config.app_log_name);
    rotate_log_if_needed(&log_path, config.log_max_bytes, config.log_backup_count);

    let _log_guard = setup_logging(&config)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting jobmilld");

    let daemon = match lifecycle::startup(Arc::clone(&config)).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("failed to start daemon: {e}");
            return Err(e.into());
        }
    };

    // Graceful shutdown on SIGTERM / SIGINT: stop consuming new runs,
    // let in-flight runs finish.
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    daemon.shutdown().await;
    Ok(())
}

fn print_help() {
    println!("jobmilld {}", env!("CARGO_PKG_VERSION"));
    println!("jobmill daemon - runs scheduled jobs, captures monitor metrics, raises alerts");
    println!();
    println!("USAGE:");
    println!("    jobmilld [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    seed             Create demo tasks in an empty database");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
    println!();
    println!("Configuration is read from the environment (DB_URL, MAX_WORKERS,");
    println!("TIMEZONE, JOBS_FILE, ...); every variable has a default.");
}

fn run_seed() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    let store = Store::open(&config.db_path())?;
    if seed::seed_demo_tasks(&store, SystemClock.now_utc())? {
        println!("Seeded demo tasks into {}", config.db_path().display());
    } else {
        println!("Database already has tasks, nothing to do.");
    }
    Ok(())
}

/// Rotate the app log when it exceeds `max_bytes`.
///
/// Shifts `app.log` → `app.log.1` → … → `app.log.<backups>`, deleting the
/// oldest. Best-effort: rotation failures are silently ignored so the
/// daemon still starts.
fn rotate_log_if_needed(log_path: &Path, max_bytes: u64, backups: u32) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if max_bytes == 0 || size < max_bytes {
        return;
    }

    let log_str = log_path.display().to_string();
    let backups = backups.max(1);

    // Shift older rotations: .<backups> is deleted, .(n-1)→.n
    for i in (1..backups).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    // Rotate current log → .1
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&config.log_dir)?;

    // Rotation happens at startup via rotate_log_if_needed.
    let file_appender =
        tracing_appender::rolling::never(&config.log_dir, &config.app_log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins when set; LOG_LEVEL otherwise.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
