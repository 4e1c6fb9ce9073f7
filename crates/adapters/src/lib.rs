// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Host adapters for jobmill: subprocess supervision and notification push.

pub mod notify;
pub mod supervisor;

pub use notify::{NoopNotifier, Notifier, NotifyError, PushScriptNotifier};
pub use supervisor::{run_argv, run_shell, ExecOutcome, SupervisorError, DEFAULT_TERM_GRACE};

#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifier;
