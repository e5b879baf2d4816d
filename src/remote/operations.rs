//! Runner, git, and project refresh endpoints.

use super::*;

#[async_trait]
impl RemoteOperationClient for HttpRemoteClient {
    async fn run(&self, project: &Project) -> RemoteResponse {
        let req = self
            .url(&["api", "runner"])
            .map(|url| self.authorize(self.client.post(url)).json(project));
        Self::dispatch(req, Operation::Run).await
    }

    async fn reload(&self, project_id: &str) -> RemoteResponse {
        let req = self
            .url(&["api", "runner", "reload", project_id])
            .map(|url| self.authorize(self.client.get(url)));
        Self::dispatch(req, Operation::Reload).await
    }

    async fn delete(&self, pod_name: &str, force: bool) -> RemoteResponse {
        let force = force.to_string();
        let req = self
            .url(&["api", "runner", pod_name, force.as_str()])
            .map(|url| self.authorize(self.client.delete(url)));
        Self::dispatch(req, Operation::Delete).await
    }

    async fn push(&self, request: &PushRequest) -> RemoteResponse {
        let req = self
            .url(&["api", "git"])
            .map(|url| self.authorize(self.client.post(url)).json(request));
        Self::dispatch(req, Operation::Push).await
    }
}

impl HttpRemoteClient {
    pub async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        let url = self.url(&["api", "project", project_id])?;
        let resp = self
            .authorize(self.client.get(url))
            .send()
            .await
            .context("fetch project")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("project {} not found on the backend", project_id);
        }

        let project: Project = self
            .ensure_ok(resp, "fetch project")?
            .json()
            .await
            .context("parse project")?;
        Ok(project)
    }

    pub async fn fetch_files(&self, project_id: &str) -> Result<Vec<ProjectFile>> {
        let url = self.url(&["api", "file", project_id])?;
        let resp = self
            .authorize(self.client.get(url))
            .send()
            .await
            .context("fetch project files")?;

        let files: Vec<ProjectFile> = self
            .ensure_ok(resp, "fetch project files")?
            .json()
            .await
            .context("parse project files")?;
        Ok(files)
    }
}
