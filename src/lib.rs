//! Runner and commit lifecycle coordination for a project editing toolbar.
//!
//! The toolbar launches, reloads and tears down a remote runner for the
//! project it is bound to, pushes pending changes to the git backend, and
//! keeps every open toolbar in agreement about which project's runner is
//! live through a shared [`channel::RunnerEventChannel`].

pub mod channel;
pub mod commit;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod notify;
pub mod pending;
pub mod remote;
pub mod store;
pub mod toolbar;

#[cfg(test)]
pub(crate) mod test_support;

pub use channel::{LogKind, RunnerEventChannel, ShowLog, Subscription};
pub use commit::{CommitDraft, CommitPushCoordinator};
pub use config::{IdentityClearPolicy, ToolbarConfig};
pub use controller::{LifecyclePolicy, RunnerLifecycleController, RunnerLifecycleState, RunnerView};
pub use error::{FailureKind, LifecycleError, PushError};
pub use model::{Project, ProjectFile};
pub use notify::{Notification, NotificationLevel, NotificationLog, Notifier};
pub use pending::needs_commit;
pub use remote::{HttpRemoteClient, Operation, PushRequest, RemoteOperationClient, RemoteResponse};
pub use store::SessionStore;
