// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notify::FakeNotifier;

#[tokio::test]
async fn push_invokes_the_script_with_the_contract_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("args.txt");
    let script_path = dir.path().join("push.sh");
    std::fs::write(
        &script_path,
        format!("#!/bin/sh\necho \"$@\" > {}\n", out_path.display()),
    )
    .unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let notifier = PushScriptNotifier::new(
        script_path.display().to_string(),
        "title",
        "group",
        "active",
    );
    notifier.push("something broke").await.unwrap();

    // Detached child: poll briefly for its side effect.
    let mut contents = String::new();
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(text) = std::fs::read_to_string(&out_path) {
            contents = text;
            break;
        }
    }
    assert_eq!(contents.trim(), "something broke -t title -g group -l active");
}

#[tokio::test]
async fn missing_script_is_swallowed() {
    let notifier = PushScriptNotifier::new("/nonexistent/push.sh", "t", "g", "l");
    assert!(notifier.push("msg").await.is_ok());
}

#[tokio::test]
async fn fake_notifier_records_messages() {
    let fake = FakeNotifier::new();
    fake.push("one").await.unwrap();
    fake.push("two").await.unwrap();
    assert_eq!(fake.pushed(), vec!["one", "two"]);
    assert_eq!(fake.push_count(), 2);
}
