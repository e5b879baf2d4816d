use super::*;

use crate::config::ToolbarConfig;

/// reqwest-backed client for the runner and git endpoints.
#[derive(Clone)]
pub struct HttpRemoteClient {
    base_url: String,
    token: Option<String>,
    pub(super) client: reqwest::Client,
}

impl HttpRemoteClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("project-toolbar")
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base_url: base_url.into(),
            token,
            client,
        })
    }

    pub fn from_config(config: &ToolbarConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.token.clone())
    }

    /// Base URL extended by `segments`, each percent-encoded as one path
    /// segment.
    pub(super) fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("parse base url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(super) fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub(super) async fn dispatch(
        req: Result<reqwest::RequestBuilder>,
        operation: Operation,
    ) -> RemoteResponse {
        match req {
            Ok(req) => Self::into_remote_response(req.send().await, operation).await,
            Err(err) => {
                tracing::warn!(%operation, error = %format!("{:#}", err), "build remote request");
                RemoteResponse::transport_failure(format!("{:#}", err))
            }
        }
    }

    /// Flatten a request outcome into a status + payload pair.
    pub(super) async fn into_remote_response(
        result: reqwest::Result<reqwest::Response>,
        operation: Operation,
    ) -> RemoteResponse {
        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();
                match resp.text().await {
                    Ok(payload) => RemoteResponse::new(status, payload),
                    Err(err) => {
                        tracing::warn!(%operation, status, error = %err, "read response body");
                        RemoteResponse::status(status)
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%operation, error = %err, "remote request failed");
                RemoteResponse::transport_failure(err)
            }
        }
    }

    pub(super) fn ensure_ok(
        &self,
        resp: reqwest::Response,
        label: &str,
    ) -> Result<reqwest::Response> {
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            anyhow::bail!("unauthorized (token invalid/expired; check `token` in the toolbar config)");
        }
        if resp.status() == reqwest::StatusCode::FORBIDDEN {
            anyhow::bail!("forbidden (insufficient permissions for this project)");
        }
        resp.error_for_status()
            .with_context(|| format!("{} status", label))
    }
}
