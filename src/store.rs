//! In-memory project, file, and app-config stores shared by a UI session.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::{Project, ProjectFile, ProjectSnapshot};
use crate::pending;

#[derive(Debug, Default)]
struct StoreState {
    project: Option<Project>,
    files: Vec<ProjectFile>,
    environment: String,
}

/// Cheap-to-clone handle over the session's stores. Readers get copies, so
/// no lock outlives a call.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    state: Arc<RwLock<StoreState>>,
}

impl SessionStore {
    pub fn new(environment: impl Into<String>) -> Self {
        let store = Self::default();
        store.set_environment(environment);
        store
    }

    pub fn project(&self) -> Option<Project> {
        self.read().project.clone()
    }

    pub fn set_project(&self, project: Project) {
        self.write().project = Some(project);
    }

    pub fn clear_project(&self) {
        let mut state = self.write();
        state.project = None;
        state.files.clear();
    }

    pub fn files(&self) -> Vec<ProjectFile> {
        self.read().files.clone()
    }

    pub fn set_files(&self, files: Vec<ProjectFile>) {
        self.write().files = files;
    }

    /// Replace the file with the same name, or append it.
    pub fn upsert_file(&self, file: ProjectFile) {
        let mut state = self.write();
        match state.files.iter_mut().find(|f| f.name == file.name) {
            Some(existing) => *existing = file,
            None => state.files.push(file),
        }
    }

    pub fn environment(&self) -> String {
        self.read().environment.clone()
    }

    pub fn set_environment(&self, environment: impl Into<String>) {
        self.write().environment = environment.into();
    }

    /// Install freshly fetched project state, e.g. after a push.
    pub fn apply_refresh(&self, project: Project, files: Vec<ProjectFile>) {
        let mut state = self.write();
        state.project = Some(project);
        state.files = files;
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        let state = self.read();
        ProjectSnapshot {
            project: state.project.clone(),
            files: state.files.clone(),
        }
    }

    pub fn needs_commit(&self) -> bool {
        let state = self.read();
        pending::needs_commit(state.project.as_ref(), &state.files)
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_commit_follows_latest_snapshot() {
        let store = SessionStore::new("dev");
        assert!(!store.needs_commit());

        store.set_project(Project::new("orders", "Orders").with_last_commit("abc", 1_000));
        store.upsert_file(ProjectFile::new("orders", "routes.yaml", "", 500));
        assert!(!store.needs_commit());

        store.upsert_file(ProjectFile::new("orders", "routes.yaml", "", 1_500));
        assert!(store.needs_commit());
        assert_eq!(store.files().len(), 1);

        store.apply_refresh(
            Project::new("orders", "Orders").with_last_commit("def", 2_000),
            store.files(),
        );
        assert!(!store.needs_commit());
    }

    #[test]
    fn clear_project_drops_files() {
        let store = SessionStore::new("dev");
        store.set_project(Project::new("orders", "Orders"));
        store.set_files(vec![ProjectFile::new("orders", "a.yaml", "", 1)]);
        store.clear_project();
        assert!(store.project().is_none());
        assert!(store.files().is_empty());
        assert_eq!(store.environment(), "dev");
    }
}
