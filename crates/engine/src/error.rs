// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type.

use thiserror::Error;

/// Errors that can occur while driving a run through the pipeline.
///
/// Anything surfacing from [`crate::Executor::execute_run`]'s inner step
/// sequence is caught by the outer recovery and written to the run row as
/// the internal-error terminal path.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] jobmill_storage::StoreError),
    #[error("supervisor error: {0}")]
    Supervisor(#[from] jobmill_adapters::SupervisorError),
    #[error("run {0} vanished after claim")]
    RunVanished(i64),
}
