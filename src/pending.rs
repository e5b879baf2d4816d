//! Pending-change detection.

use crate::model::{Project, ProjectFile};

/// Whether any file was edited after the project's last commit.
///
/// Always computed from the snapshot passed in; nothing is cached.
pub fn needs_commit(project: Option<&Project>, files: &[ProjectFile]) -> bool {
    let Some(project) = project else {
        return false;
    };
    files
        .iter()
        .any(|f| f.last_update > project.last_commit_timestamp)
}

/// Files edited after the last commit, in store order.
pub fn pending_files<'a>(project: &Project, files: &'a [ProjectFile]) -> Vec<&'a ProjectFile> {
    files
        .iter()
        .filter(|f| f.last_update > project.last_commit_timestamp)
        .collect()
}

#[cfg(test)]
#[path = "tests/pending_tests.rs"]
mod tests;
