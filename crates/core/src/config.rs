// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment configuration.
//!
//! Every knob is optional with a default; malformed values fall back to the
//! default rather than failing startup.

use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_secret: String,
    pub admin_user: String,
    pub admin_pass: String,
    pub db_url: String,
    pub host: String,
    pub port: u16,
    pub root_path: String,
    pub max_workers: usize,
    pub alert_suppress_sec: u64,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub log_max_bytes: u64,
    pub log_backup_count: u32,
    pub app_log_name: String,
    pub metrics_retention_days: i64,
    pub metrics_dir: PathBuf,
    /// Empty string disables the push notifier.
    pub alert_push_script: Option<String>,
    pub alert_push_title: String,
    pub alert_push_group: String,
    pub alert_push_level: String,
    pub run_zombie_sec: u64,
    pub timezone: Tz,
    pub jobs_file: PathBuf,
    pub default_timeout_sec: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_secret: "change_me".into(),
            admin_user: "admin".into(),
            admin_pass: "admin123".into(),
            db_url: "sqlite:///./data/app.db".into(),
            host: "0.0.0.0".into(),
            port: 8000,
            root_path: String::new(),
            max_workers: 8,
            alert_suppress_sec: 900,
            log_dir: "./data/logs".into(),
            log_level: "info".into(),
            log_max_bytes: 10 * 1024 * 1024,
            log_backup_count: 7,
            app_log_name: "app.log".into(),
            metrics_retention_days: 14,
            metrics_dir: "./data/metrics".into(),
            alert_push_script: None,
            alert_push_title: "jobmill".into(),
            alert_push_group: "jobmill".into(),
            alert_push_level: "active".into(),
            run_zombie_sec: 3600,
            timezone: chrono_tz::Asia::Shanghai,
            jobs_file: "./data/jobs.json".into(),
            default_timeout_sec: 60,
        }
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match var(key) {
        Some(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "unparseable value, using default");
                default
            }
        },
        None => default,
    }
}

impl Config {
    /// Build from process environment, falling back to defaults per key.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timezone = match var("TIMEZONE") {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    tracing::warn!(timezone = %name, "unknown timezone, using default");
                    defaults.timezone
                }
            },
            None => defaults.timezone,
        };

        Self {
            app_secret: var("APP_SECRET").unwrap_or(defaults.app_secret),
            admin_user: var("ADMIN_USER").unwrap_or(defaults.admin_user),
            admin_pass: var("ADMIN_PASS").unwrap_or(defaults.admin_pass),
            db_url: var("DB_URL").unwrap_or(defaults.db_url),
            host: var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT", defaults.port),
            root_path: var("ROOT_PATH").unwrap_or(defaults.root_path),
            max_workers: parsed("MAX_WORKERS", defaults.max_workers).max(1),
            alert_suppress_sec: parsed("ALERT_SUPPRESS_SEC", defaults.alert_suppress_sec),
            log_dir: var("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_max_bytes: parsed("LOG_MAX_BYTES", defaults.log_max_bytes),
            log_backup_count: parsed("LOG_BACKUP_COUNT", defaults.log_backup_count),
            app_log_name: var("APP_LOG_NAME").unwrap_or(defaults.app_log_name),
            metrics_retention_days: parsed(
                "METRICS_RETENTION_DAYS",
                defaults.metrics_retention_days,
            ),
            metrics_dir: var("METRICS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.metrics_dir),
            alert_push_script: var("ALERT_PUSH_SCRIPT"),
            alert_push_title: var("ALERT_PUSH_TITLE").unwrap_or(defaults.alert_push_title),
            alert_push_group: var("ALERT_PUSH_GROUP").unwrap_or(defaults.alert_push_group),
            alert_push_level: var("ALERT_PUSH_LEVEL").unwrap_or(defaults.alert_push_level),
            run_zombie_sec: parsed("RUN_ZOMBIE_SEC", defaults.run_zombie_sec),
            timezone,
            jobs_file: var("JOBS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_file),
            default_timeout_sec: parsed("DEFAULT_TIMEOUT_SEC", defaults.default_timeout_sec),
        }
    }

    /// Filesystem path of the SQLite database.
    ///
    /// Accepts `sqlite:///relative/path`, `sqlite:////absolute/path`, or a
    /// bare path.
    pub fn db_path(&self) -> PathBuf {
        let url = self.db_url.as_str();
        match url.strip_prefix("sqlite:///") {
            Some(rest) => PathBuf::from(rest),
            None => PathBuf::from(url.strip_prefix("sqlite://").unwrap_or(url)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
