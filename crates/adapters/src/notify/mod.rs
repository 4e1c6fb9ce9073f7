// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters

mod noop;
mod push;

pub use noop::NoopNotifier;
pub use push::PushScriptNotifier;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifier;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("push failed: {0}")]
    PushFailed(String),
}

/// Adapter for delivering alert notifications.
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    /// Deliver a message. Implementations are fire-and-forget; the durable
    /// alert row is the audit trail, so failures here are not fatal.
    async fn push(&self, message: &str) -> Result<(), NotifyError>;
}
