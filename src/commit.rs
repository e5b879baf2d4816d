//! Commit-message dialog and push coordination.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::channel::lock;
use crate::error::PushError;
use crate::model::Project;
use crate::notify::{Notification, Notifier};
use crate::remote::{Operation, PushRequest, RemoteOperationClient, call_with_timeout};

/// Rendering used to prefill an empty commit message, e.g.
/// `10/18/2026, 3:04:05 PM`.
const PREFILL_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
);

/// Called once after every accepted push so stores can reload the project's
/// commit metadata and files.
pub type RefreshHook = Arc<dyn Fn(&Project) + Send + Sync>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitDraft {
    pub message: String,
    pub dialog_open: bool,
}

#[derive(Debug, Default)]
struct CommitState {
    draft: CommitDraft,
    pushing: bool,
}

pub struct CommitPushCoordinator {
    state: Mutex<CommitState>,
    client: Arc<dyn RemoteOperationClient>,
    notifier: Arc<dyn Notifier>,
    refresh: RefreshHook,
    call_timeout: Duration,
}

impl CommitPushCoordinator {
    pub fn new(
        client: Arc<dyn RemoteOperationClient>,
        notifier: Arc<dyn Notifier>,
        refresh: RefreshHook,
        call_timeout: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(CommitState::default()),
            client,
            notifier,
            refresh,
            call_timeout,
        }
    }

    pub fn draft(&self) -> CommitDraft {
        self.lock_state().draft.clone()
    }

    pub fn is_pushing(&self) -> bool {
        self.lock_state().pushing
    }

    /// Open the dialog. An explicit `prefill` wins; otherwise a message the
    /// user already typed is kept, and an empty draft gets the local time.
    pub fn open_commit_dialog(&self, prefill: Option<&str>) -> CommitDraft {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.open_commit_dialog_at(prefill, now)
    }

    pub fn open_commit_dialog_at(&self, prefill: Option<&str>, now: OffsetDateTime) -> CommitDraft {
        let mut state = self.lock_state();
        match prefill {
            Some(message) => state.draft.message = message.to_string(),
            None if state.draft.message.is_empty() => {
                state.draft.message = timestamp_message(now);
            }
            None => {}
        }
        state.draft.dialog_open = true;
        state.draft.clone()
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.lock_state().draft.message = message.into();
    }

    pub fn cancel_commit_dialog(&self) {
        self.lock_state().draft = CommitDraft::default();
    }

    /// Push `message` for `project`.
    ///
    /// The pushing flag is cleared whatever the outcome. A rejected push
    /// keeps the draft so the user can retry.
    pub async fn confirm_push(&self, project: &Project, message: &str) -> Result<(), PushError> {
        {
            let mut state = self.lock_state();
            if state.pushing {
                return Err(PushError::AlreadyPushing);
            }
            if message.trim().is_empty() {
                return Err(PushError::EmptyMessage);
            }
            state.draft.dialog_open = false;
            state.draft.message = message.to_string();
            state.pushing = true;
        }

        let request = PushRequest::new(project.project_id.clone(), message);
        tracing::debug!(project = %project.name, "pushing project");
        let result = call_with_timeout(
            Operation::Push,
            self.call_timeout,
            self.client.push(&request),
        )
        .await;

        match result {
            Ok(_) => {
                {
                    let mut state = self.lock_state();
                    state.pushing = false;
                    state.draft = CommitDraft::default();
                }
                tracing::info!(project = %project.name, "push accepted");
                (self.refresh)(project);
                Ok(())
            }
            Err(kind) => {
                self.lock_state().pushing = false;
                tracing::warn!(project = %project.name, error = %kind, "push failed");
                let err = PushError::Remote(kind);
                self.notifier.notify(Notification::error(
                    Operation::Push,
                    format!("{}: {}", project.name, err),
                ));
                Err(err)
            }
        }
    }

    /// Push the current draft message.
    pub async fn confirm_draft(&self, project: &Project) -> Result<(), PushError> {
        let message = self.lock_state().draft.message.clone();
        self.confirm_push(project, &message).await
    }

    fn lock_state(&self) -> MutexGuard<'_, CommitState> {
        lock(&self.state)
    }
}

pub(crate) fn timestamp_message(now: OffsetDateTime) -> String {
    now.format(PREFILL_FORMAT)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
