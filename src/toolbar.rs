//! Toolbar presentation model: which actions are offered for the current
//! selection, editing-mode toggles, and the last-commit summary.
//!
//! Nothing here renders; UI layers read these values and draw them.

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::model::{Project, ProjectFile};

const COMMIT_LABEL_LEN: usize = 18;

const LAST_UPDATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorMode {
    #[default]
    Design,
    Code,
}

impl EditorMode {
    pub fn toggle(self) -> Self {
        match self {
            EditorMode::Design => EditorMode::Code,
            EditorMode::Code => EditorMode::Design,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EditorMode::Design => "Design",
            EditorMode::Code => "Code",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolbarVariant {
    Templates,
    Project,
}

/// Editing toggles owned by the toolbar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolbarState {
    pub mode: EditorMode,
    pub edit_advanced_properties: bool,
}

impl ToolbarState {
    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> EditorMode {
        self.mode = self.mode.toggle();
        self.mode
    }

    pub fn set_edit_advanced_properties(&mut self, checked: bool) {
        self.edit_advanced_properties = checked;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PushButton {
    pub label: &'static str,
    pub primary: bool,
    pub loading: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ToolbarInputs<'a> {
    pub variant: ToolbarVariant,
    pub file: Option<&'a ProjectFile>,
    pub needs_commit: bool,
    pub pushing: bool,
    pub is_current_runner: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ToolbarAffordances {
    pub last_commit_panel: bool,
    pub push_button: Option<PushButton>,
    pub mode_toggle: bool,
    pub edit_advanced: bool,
    pub add_property: bool,
    pub download_image: bool,
    /// Embedded runner control limited to reload.
    pub reload_only_runner: bool,
    pub create: bool,
    pub upload: bool,
}

impl ToolbarAffordances {
    pub fn compute(inputs: &ToolbarInputs<'_>) -> Self {
        let no_file = inputs.file.is_none();
        let is_yaml = inputs.file.is_some_and(ProjectFile::is_yaml);
        let is_properties = inputs.file.is_some_and(ProjectFile::is_properties);

        let push_button = no_file.then(|| {
            let idle_label = match inputs.variant {
                ToolbarVariant::Templates => "Commit",
                ToolbarVariant::Project => "Push",
            };
            PushButton {
                label: if inputs.pushing { "..." } else { idle_label },
                primary: inputs.needs_commit,
                loading: inputs.pushing,
            }
        });

        match inputs.variant {
            ToolbarVariant::Templates => Self {
                last_commit_panel: no_file,
                push_button,
                edit_advanced: is_properties,
                create: no_file,
                upload: no_file,
                ..Self::default()
            },
            ToolbarVariant::Project => Self {
                last_commit_panel: no_file,
                push_button,
                mode_toggle: is_yaml,
                edit_advanced: is_properties,
                add_property: is_properties,
                download_image: inputs.file.is_some_and(ProjectFile::is_integration),
                reload_only_runner: is_yaml && inputs.is_current_runner,
                ..Self::default()
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitTone {
    Pending,
    Clean,
}

/// Last-commit summary shown next to the push button.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LastCommitPanel {
    /// Absent when the project was never committed.
    pub timestamp: Option<String>,
    pub commit: String,
    /// Full commit text, for a tooltip.
    pub commit_full: Option<String>,
    pub tone: CommitTone,
}

impl LastCommitPanel {
    pub fn new(project: &Project, needs_commit: bool) -> Self {
        let timestamp =
            (project.last_commit_timestamp > 0).then(|| format_millis(project.last_commit_timestamp));
        let commit = match project.last_commit.as_deref() {
            Some(c) if !c.is_empty() => c.chars().take(COMMIT_LABEL_LEN).collect(),
            _ => "-".to_string(),
        };
        Self {
            timestamp,
            commit,
            commit_full: project.last_commit.clone(),
            tone: if needs_commit {
                CommitTone::Pending
            } else {
                CommitTone::Clean
            },
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, or `N/A` for a zero/invalid timestamp.
pub fn format_millis(millis: i64) -> String {
    if millis == 0 {
        return "N/A".to_string();
    }
    let nanos = i128::from(millis) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(LAST_UPDATE_FORMAT).ok())
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
#[path = "tests/toolbar_tests.rs"]
mod tests;
