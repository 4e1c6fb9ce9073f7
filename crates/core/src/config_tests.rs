// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_env() {
    for key in [
        "APP_SECRET",
        "ADMIN_USER",
        "ADMIN_PASS",
        "DB_URL",
        "HOST",
        "PORT",
        "ROOT_PATH",
        "MAX_WORKERS",
        "ALERT_SUPPRESS_SEC",
        "LOG_DIR",
        "LOG_LEVEL",
        "LOG_MAX_BYTES",
        "LOG_BACKUP_COUNT",
        "APP_LOG_NAME",
        "METRICS_RETENTION_DAYS",
        "METRICS_DIR",
        "ALERT_PUSH_SCRIPT",
        "ALERT_PUSH_TITLE",
        "ALERT_PUSH_GROUP",
        "ALERT_PUSH_LEVEL",
        "RUN_ZOMBIE_SEC",
        "TIMEZONE",
        "JOBS_FILE",
        "DEFAULT_TIMEOUT_SEC",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_apply_without_environment() {
    clear_env();
    let config = Config::from_env();

    assert_eq!(config.max_workers, 8);
    assert_eq!(config.alert_suppress_sec, 900);
    assert_eq!(config.default_timeout_sec, 60);
    assert_eq!(config.timezone, chrono_tz::Asia::Shanghai);
    assert_eq!(config.db_path(), PathBuf::from("./data/app.db"));
    assert!(config.alert_push_script.is_none());
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    clear_env();
    std::env::set_var("MAX_WORKERS", "3");
    std::env::set_var("TIMEZONE", "UTC");
    std::env::set_var("ALERT_PUSH_SCRIPT", "/usr/local/bin/push");
    std::env::set_var("DB_URL", "sqlite:////var/lib/jobmill/app.db");

    let config = Config::from_env();
    assert_eq!(config.max_workers, 3);
    assert_eq!(config.timezone, chrono_tz::UTC);
    assert_eq!(
        config.alert_push_script.as_deref(),
        Some("/usr/local/bin/push")
    );
    assert_eq!(config.db_path(), PathBuf::from("/var/lib/jobmill/app.db"));

    clear_env();
}

#[test]
#[serial]
fn malformed_values_fall_back() {
    clear_env();
    std::env::set_var("MAX_WORKERS", "many");
    std::env::set_var("TIMEZONE", "Mars/Olympus");
    std::env::set_var("PORT", "-1");

    let config = Config::from_env();
    assert_eq!(config.max_workers, 8);
    assert_eq!(config.timezone, chrono_tz::Asia::Shanghai);
    assert_eq!(config.port, 8000);

    clear_env();
}

#[test]
#[serial]
fn max_workers_has_a_floor_of_one() {
    clear_env();
    std::env::set_var("MAX_WORKERS", "0");
    assert_eq!(Config::from_env().max_workers, 1);
    clear_env();
}

#[test]
fn db_path_accepts_bare_paths() {
    let config = Config {
        db_url: "data/jobs.db".into(),
        ..Config::default()
    };
    assert_eq!(config.db_path(), PathBuf::from("data/jobs.db"));
}
