use std::time::Duration;

use thiserror::Error;

use crate::controller::RunnerLifecycleState;
use crate::remote::Operation;

/// Why a remote call took its failure branch.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("no response within {0:?}")]
    TimedOut(Duration),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("runner is busy ({state}); wait for it to settle")]
    Busy { state: RunnerLifecycleState },

    #[error("no runner is active for project {project}")]
    NotRunning { project: String },

    #[error("controller is bound to project {bound}, not {requested}")]
    ProjectMismatch { bound: String, requested: String },

    #[error("{operation} failed: {kind}")]
    Remote {
        operation: Operation,
        kind: FailureKind,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("a push is already in progress")]
    AlreadyPushing,

    #[error("commit message is empty")]
    EmptyMessage,

    #[error("push failed: {0}")]
    Remote(FailureKind),
}
