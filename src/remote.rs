use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::error::FailureKind;
use crate::model::{Project, ProjectFile};

mod http_client;
pub use self::http_client::HttpRemoteClient;

mod types;
pub use self::types::*;

mod operations;

/// Status recorded for calls that never produced an HTTP response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Run,
    Reload,
    Delete,
    Push,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Run => "run",
            Operation::Reload => "reload",
            Operation::Delete => "delete",
            Operation::Push => "push",
        }
    }

    /// Documented success codes; everything else is the failure branch.
    pub fn is_success(self, status: u16) -> bool {
        match self {
            Operation::Delete => status == 202,
            Operation::Run | Operation::Reload | Operation::Push => matches!(status, 200 | 201),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub payload: String,
}

impl RemoteResponse {
    pub fn new(status: u16, payload: impl Into<String>) -> Self {
        Self {
            status,
            payload: payload.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::new(status, String::new())
    }

    pub fn transport_failure(err: impl fmt::Display) -> Self {
        Self::new(TRANSPORT_FAILURE_STATUS, err.to_string())
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE_STATUS
    }
}

/// Runner and git operations exposed by the backend.
///
/// Implementations never fail at the type level: network errors come back
/// as a [`RemoteResponse`] with [`TRANSPORT_FAILURE_STATUS`].
#[async_trait]
pub trait RemoteOperationClient: Send + Sync {
    /// Launch a runner for `project`; the payload is the runner's pod id.
    async fn run(&self, project: &Project) -> RemoteResponse;

    async fn reload(&self, project_id: &str) -> RemoteResponse;

    async fn delete(&self, pod_name: &str, force: bool) -> RemoteResponse;

    async fn push(&self, request: &PushRequest) -> RemoteResponse;
}

/// Await a remote call with a deadline and classify the outcome.
pub async fn call_with_timeout<F>(
    operation: Operation,
    timeout: Duration,
    call: F,
) -> std::result::Result<RemoteResponse, FailureKind>
where
    F: Future<Output = RemoteResponse>,
{
    let response = match tokio::time::timeout(timeout, call).await {
        Ok(response) => response,
        Err(_) => return Err(FailureKind::TimedOut(timeout)),
    };
    if operation.is_success(response.status) {
        Ok(response)
    } else if response.is_transport_failure() {
        Err(FailureKind::Transport(response.payload))
    } else {
        Err(FailureKind::Status(response.status))
    }
}
