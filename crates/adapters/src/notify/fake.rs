// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording notifier for tests.

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct FakeNotifier {
    pushed: Arc<Mutex<Vec<String>>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far.
    pub fn pushed(&self) -> Vec<String> {
        self.pushed.lock().clone()
    }

    pub fn push_count(&self) -> usize {
        self.pushed.lock().len()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn push(&self, message: &str) -> Result<(), NotifyError> {
        self.pushed.lock().push(message.to_string());
        Ok(())
    }
}
