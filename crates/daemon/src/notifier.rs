// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete notifier selection for the daemon.

use async_trait::async_trait;
use jobmill_adapters::{NoopNotifier, Notifier, NotifyError, PushScriptNotifier};
use jobmill_core::Config;

/// Push-script notifier when configured, no-op otherwise.
#[derive(Clone)]
pub enum AlertNotifier {
    Push(PushScriptNotifier),
    Noop(NoopNotifier),
}

impl AlertNotifier {
    pub fn from_config(config: &Config) -> Self {
        match &config.alert_push_script {
            Some(script) => AlertNotifier::Push(PushScriptNotifier::new(
                script.clone(),
                config.alert_push_title.clone(),
                config.alert_push_group.clone(),
                config.alert_push_level.clone(),
            )),
            None => AlertNotifier::Noop(NoopNotifier),
        }
    }
}

#[async_trait]
impl Notifier for AlertNotifier {
    async fn push(&self, message: &str) -> Result<(), NotifyError> {
        match self {
            AlertNotifier::Push(push) => push.push(message).await,
            AlertNotifier::Noop(noop) => noop.push(message).await,
        }
    }
}
