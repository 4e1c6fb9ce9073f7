// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notifier for deployments without a push script.

use super::{Notifier, NotifyError};
use async_trait::async_trait;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn push(&self, message: &str) -> Result<(), NotifyError> {
        tracing::debug!(message, "notification dropped (no push script configured)");
        Ok(())
    }
}
