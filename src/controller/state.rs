use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerLifecycleState {
    #[default]
    Idle,
    Starting,
    Running,
    Reloading,
    Deleting,
}

impl RunnerLifecycleState {
    /// A remote call is in flight; only its resolution may leave this state.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Starting | Self::Reloading | Self::Deleting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Reloading => "reloading",
            Self::Deleting => "deleting",
        }
    }
}

impl fmt::Display for RunnerLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of one controller for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnerView {
    pub project_name: String,
    pub state: RunnerLifecycleState,
    pub pod_name: String,
    pub global_runner: Option<String>,
    pub is_current_runner: bool,
}
