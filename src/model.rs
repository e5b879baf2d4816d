use serde::{Deserialize, Serialize};

/// Suffix the backend appends to a project id to name its runner pod.
pub const RUNNER_POD_SUFFIX: &str = "-runner";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Hash (or message) of the last commit pushed for this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,

    /// Epoch milliseconds of the last commit; `0` when never committed.
    #[serde(default)]
    pub last_commit_timestamp: i64,
}

impl Project {
    pub fn new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
            description: String::new(),
            last_commit: None,
            last_commit_timestamp: 0,
        }
    }

    pub fn with_last_commit(mut self, commit: impl Into<String>, timestamp: i64) -> Self {
        self.last_commit = Some(commit.into());
        self.last_commit_timestamp = timestamp;
        self
    }

    pub fn runner_pod_name(&self) -> String {
        format!("{}{}", self.project_id, RUNNER_POD_SUFFIX)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub name: String,
    pub project_id: String,

    #[serde(default)]
    pub code: String,

    /// Epoch milliseconds of the last local edit.
    #[serde(default)]
    pub last_update: i64,
}

impl ProjectFile {
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        code: impl Into<String>,
        last_update: i64,
    ) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            code: code.into(),
            last_update,
        }
    }

    pub fn is_yaml(&self) -> bool {
        self.name.ends_with("yaml")
    }

    pub fn is_properties(&self) -> bool {
        self.name.ends_with("properties")
    }

    /// True for YAML files whose top-level kind is an `Integration` resource.
    pub fn is_integration(&self) -> bool {
        self.is_yaml()
            && self.code.lines().any(|line| {
                let Some(rest) = line.strip_prefix("kind:") else {
                    return false;
                };
                rest.trim().trim_matches(|c| c == '"' || c == '\'') == "Integration"
            })
    }
}

/// Project plus its files, as captured for offline `status` checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: Option<Project>,

    #[serde(default)]
    pub files: Vec<ProjectFile>,
}
