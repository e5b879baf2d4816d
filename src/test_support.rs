//! Scripted remote client for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::model::Project;
use crate::remote::{Operation, PushRequest, RemoteOperationClient, RemoteResponse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RemoteCall {
    Run { project_id: String },
    Reload { project_id: String },
    Delete { pod_name: String, force: bool },
    Push(PushRequest),
}

/// Holds a scripted response until [`Gate::open`] is called.
#[derive(Clone, Default)]
pub(crate) struct Gate(Arc<Notify>);

impl Gate {
    pub(crate) fn open(&self) {
        self.0.notify_one();
    }
}

enum Reply {
    Immediate(RemoteResponse),
    Gated(RemoteResponse, Gate),
    Never,
}

#[derive(Default)]
pub(crate) struct FakeRemote {
    calls: Mutex<Vec<RemoteCall>>,
    replies: Mutex<HashMap<Operation, VecDeque<Reply>>>,
}

impl FakeRemote {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, operation: Operation, status: u16, payload: &str) {
        self.script(operation, Reply::Immediate(RemoteResponse::new(status, payload)));
    }

    pub(crate) fn respond_gated(&self, operation: Operation, status: u16, payload: &str) -> Gate {
        let gate = Gate::default();
        self.script(
            operation,
            Reply::Gated(RemoteResponse::new(status, payload), gate.clone()),
        );
        gate
    }

    pub(crate) fn hang(&self, operation: Operation) {
        self.script(operation, Reply::Never);
    }

    pub(crate) fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    fn script(&self, operation: Operation, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    async fn answer(&self, operation: Operation, call: RemoteCall) -> RemoteResponse {
        self.calls.lock().unwrap().push(call);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Immediate(response)) => response,
            Some(Reply::Gated(response, gate)) => {
                gate.0.notified().await;
                response
            }
            Some(Reply::Never) => std::future::pending().await,
            None => RemoteResponse::new(500, format!("unscripted {}", operation)),
        }
    }
}

#[async_trait]
impl RemoteOperationClient for FakeRemote {
    async fn run(&self, project: &Project) -> RemoteResponse {
        let call = RemoteCall::Run {
            project_id: project.project_id.clone(),
        };
        self.answer(Operation::Run, call).await
    }

    async fn reload(&self, project_id: &str) -> RemoteResponse {
        let call = RemoteCall::Reload {
            project_id: project_id.to_string(),
        };
        self.answer(Operation::Reload, call).await
    }

    async fn delete(&self, pod_name: &str, force: bool) -> RemoteResponse {
        let call = RemoteCall::Delete {
            pod_name: pod_name.to_string(),
            force,
        };
        self.answer(Operation::Delete, call).await
    }

    async fn push(&self, request: &PushRequest) -> RemoteResponse {
        self.answer(Operation::Push, RemoteCall::Push(request.clone()))
            .await
    }
}

/// Yield until `cond` holds; panics if it never does.
pub(crate) async fn yield_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
