//! Runner lifecycle state machine for one open toolbar.
//!
//! Each toolbar owns a controller bound to its project. Controllers issue
//! run/reload/delete calls, keep their own [`RunnerLifecycleState`], and agree
//! on the single live runner through the shared [`RunnerEventChannel`].
//!
//! Start and delete treat the session identity asymmetrically: a start
//! publishes the identity only after the backend confirms, while a delete
//! (under the default [`IdentityClearPolicy::BeforeCall`]) clears it before
//! the call is issued and never restores it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use crate::channel::{LogKind, RunnerEventChannel, Subscription, lock};
use crate::config::{IdentityClearPolicy, ToolbarConfig};
use crate::error::{FailureKind, LifecycleError};
use crate::model::Project;
use crate::notify::{Notification, Notifier};
use crate::remote::{Operation, RemoteOperationClient, call_with_timeout, pod_name_from_payload};
use crate::store::SessionStore;

mod state;
pub use state::{RunnerLifecycleState, RunnerView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub call_timeout: Duration,
    pub identity_clear: IdentityClearPolicy,
    pub force_delete: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from_config(&ToolbarConfig::default())
    }
}

impl LifecyclePolicy {
    pub fn from_config(config: &ToolbarConfig) -> Self {
        Self {
            call_timeout: config.call_timeout(),
            identity_clear: config.identity_clear_policy,
            force_delete: config.force_delete,
        }
    }
}

#[derive(Debug)]
struct ControllerState {
    project: Project,
    lifecycle: RunnerLifecycleState,
    pod_name: String,
    global_runner: Option<String>,
}

impl ControllerState {
    fn is_current(&self) -> bool {
        self.global_runner.as_deref() == Some(self.project.name.as_str())
    }

    fn observe_global_runner(&mut self, runner: Option<&str>) {
        self.global_runner = runner.map(str::to_owned);
        if self.lifecycle == RunnerLifecycleState::Running && !self.is_current() {
            tracing::debug!(
                project = %self.project.name,
                runner = runner.unwrap_or("<none>"),
                "runner superseded; back to idle"
            );
            self.lifecycle = RunnerLifecycleState::Idle;
        }
    }

    /// Running when the session still names this project, idle otherwise.
    fn settle(&mut self) {
        self.lifecycle = if self.is_current() {
            RunnerLifecycleState::Running
        } else {
            RunnerLifecycleState::Idle
        };
    }
}

pub struct RunnerLifecycleController {
    state: Arc<Mutex<ControllerState>>,
    client: Arc<dyn RemoteOperationClient>,
    channel: RunnerEventChannel,
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
    policy: LifecyclePolicy,
    subscription: Mutex<Option<Subscription>>,
}

impl RunnerLifecycleController {
    pub fn new(
        project: Project,
        client: Arc<dyn RemoteOperationClient>,
        channel: RunnerEventChannel,
        store: SessionStore,
        notifier: Arc<dyn Notifier>,
        policy: LifecyclePolicy,
    ) -> Self {
        let state = Arc::new(Mutex::new(ControllerState {
            pod_name: project.runner_pod_name(),
            project,
            lifecycle: RunnerLifecycleState::Idle,
            global_runner: channel.current_runner(),
        }));

        let weak: Weak<Mutex<ControllerState>> = Arc::downgrade(&state);
        let subscription = channel.subscribe_current_runner(move |runner| {
            if let Some(state) = weak.upgrade() {
                lock(&state).observe_global_runner(runner);
            }
        });

        Self {
            state,
            client,
            channel,
            store,
            notifier,
            policy,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub fn state(&self) -> RunnerLifecycleState {
        self.lock_state().lifecycle
    }

    pub fn pod_name(&self) -> String {
        self.lock_state().pod_name.clone()
    }

    pub fn project(&self) -> Project {
        self.lock_state().project.clone()
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Whether the last identity seen on the channel names `project`.
    pub fn is_current_runner(&self, project: &Project) -> bool {
        self.lock_state().global_runner.as_deref() == Some(project.name.as_str())
    }

    pub fn snapshot(&self) -> RunnerView {
        let state = self.lock_state();
        RunnerView {
            project_name: state.project.name.clone(),
            state: state.lifecycle,
            pod_name: state.pod_name.clone(),
            global_runner: state.global_runner.clone(),
            is_current_runner: state.is_current(),
        }
    }

    /// Rebind to a project snapshot. Switching to another project recomputes
    /// the derived pod name; a refresh of the same project keeps the pod id
    /// returned by the last start.
    pub fn set_project(&self, project: Project) {
        let mut state = self.lock_state();
        if state.project.project_id != project.project_id {
            state.pod_name = project.runner_pod_name();
            if !state.lifecycle.is_transient() {
                state.lifecycle = RunnerLifecycleState::Idle;
            }
        }
        state.project = project;
        if state.lifecycle == RunnerLifecycleState::Running && !state.is_current() {
            state.lifecycle = RunnerLifecycleState::Idle;
        }
    }

    /// Launch a runner for `project`.
    ///
    /// Returns the pod id reported by the backend. On failure the session
    /// identity is cleared so no toolbar shows a stale runner.
    pub async fn start_runner(&self, project: &Project) -> Result<String, LifecycleError> {
        let conflicting = {
            let mut state = self.lock_state();
            if state.lifecycle.is_transient() {
                return Err(LifecycleError::Busy {
                    state: state.lifecycle,
                });
            }
            if state.project.project_id != project.project_id {
                state.pod_name = project.runner_pod_name();
            }
            state.project = project.clone();
            state.lifecycle = RunnerLifecycleState::Starting;
            state
                .global_runner
                .clone()
                .filter(|runner| runner != &project.name)
        };
        tracing::debug!(project = %project.name, "starting runner");

        let result = call_with_timeout(
            Operation::Run,
            self.policy.call_timeout,
            self.client.run(project),
        )
        .await;

        match result {
            Ok(response) => {
                let pod_name = pod_name_from_payload(&response.payload)
                    .unwrap_or_else(|| project.runner_pod_name());
                {
                    let mut state = self.lock_state();
                    state.lifecycle = RunnerLifecycleState::Running;
                    state.pod_name = pod_name.clone();
                }
                tracing::info!(project = %project.name, pod = %pod_name, "runner started");
                self.channel.publish_current_runner(Some(&project.name));
                self.channel.publish_show_log(
                    LogKind::Container,
                    &pod_name,
                    &self.store.environment(),
                );
                Ok(pod_name)
            }
            Err(kind) => {
                self.lock_state().lifecycle = RunnerLifecycleState::Idle;
                self.channel.publish_current_runner(None);
                if let Some(other) = conflicting {
                    tracing::warn!(
                        project = %project.name,
                        runner = %other,
                        "start failed while another project's runner was active"
                    );
                }
                Err(self.report(Operation::Run, kind))
            }
        }
    }

    /// Ask the backend to reload the live runner.
    ///
    /// Success and failure both leave the runner running; a failure is
    /// reported but does not tear anything down.
    pub async fn reload_runner(&self, project_id: &str) -> Result<(), LifecycleError> {
        {
            let mut state = self.lock_state();
            if state.lifecycle.is_transient() {
                return Err(LifecycleError::Busy {
                    state: state.lifecycle,
                });
            }
            if state.project.project_id != project_id {
                return Err(LifecycleError::ProjectMismatch {
                    bound: state.project.project_id.clone(),
                    requested: project_id.to_string(),
                });
            }
            if state.lifecycle != RunnerLifecycleState::Running && !state.is_current() {
                return Err(LifecycleError::NotRunning {
                    project: state.project.name.clone(),
                });
            }
            state.lifecycle = RunnerLifecycleState::Reloading;
        }
        tracing::debug!(project_id, "reloading runner");

        let result = call_with_timeout(
            Operation::Reload,
            self.policy.call_timeout,
            self.client.reload(project_id),
        )
        .await;

        self.lock_state().settle();

        match result {
            Ok(_) => Ok(()),
            Err(kind) => Err(self.report(Operation::Reload, kind)),
        }
    }

    /// Tear down the runner addressed by `pod_name`.
    ///
    /// The controller ends idle whatever the backend answers.
    pub async fn delete_runner(&self, pod_name: &str) -> Result<(), LifecycleError> {
        {
            let mut state = self.lock_state();
            if state.lifecycle.is_transient() {
                return Err(LifecycleError::Busy {
                    state: state.lifecycle,
                });
            }
            state.lifecycle = RunnerLifecycleState::Deleting;
        }
        if self.policy.identity_clear == IdentityClearPolicy::BeforeCall {
            self.channel.publish_current_runner(None);
        }
        tracing::debug!(pod = pod_name, force = self.policy.force_delete, "deleting runner");

        let result = call_with_timeout(
            Operation::Delete,
            self.policy.call_timeout,
            self.client.delete(pod_name, self.policy.force_delete),
        )
        .await;

        match result {
            Ok(_) => {
                self.lock_state().lifecycle = RunnerLifecycleState::Idle;
                if self.policy.identity_clear == IdentityClearPolicy::AfterConfirmation {
                    self.channel.publish_current_runner(None);
                }
                tracing::info!(pod = pod_name, "runner deleted");
                Ok(())
            }
            Err(kind) => {
                self.lock_state().lifecycle = RunnerLifecycleState::Idle;
                Err(self.report(Operation::Delete, kind))
            }
        }
    }

    /// Delete the runner this controller last started (or its derived pod).
    pub async fn delete_current_runner(&self) -> Result<(), LifecycleError> {
        let pod_name = self.pod_name();
        self.delete_runner(&pod_name).await
    }

    /// Stop listening to the channel. Channel events no longer reach this
    /// controller afterwards.
    pub fn close(&self) {
        drop(lock(&self.subscription).take());
    }

    fn report(&self, operation: Operation, kind: FailureKind) -> LifecycleError {
        let project = self.lock_state().project.name.clone();
        tracing::warn!(%operation, project = %project, error = %kind, "runner operation failed");
        let err = LifecycleError::Remote { operation, kind };
        self.notifier
            .notify(Notification::error(operation, format!("{}: {}", project, err)));
        err
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        lock(&self.state)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
