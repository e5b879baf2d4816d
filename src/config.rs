use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::notify::DEFAULT_NOTIFICATION_CAPACITY;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_ENVIRONMENT: &str = "dev";
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

/// When a delete clears the session's runner identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityClearPolicy {
    /// Clear before the delete call is issued, so no toolbar keeps showing a
    /// live runner during teardown. Not rolled back if the delete fails.
    #[default]
    BeforeCall,
    /// Clear only once the backend accepts the delete (202).
    AfterConfirmation,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolbarConfig {
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Tags show-log requests; not interpreted otherwise.
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default)]
    pub identity_clear_policy: IdentityClearPolicy,

    /// Passed to the backend as the delete `force` flag.
    #[serde(default)]
    pub force_delete: bool,

    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_call_timeout_ms() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

fn default_notification_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            environment: default_environment(),
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            identity_clear_policy: IdentityClearPolicy::default(),
            force_delete: false,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl ToolbarConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: ToolbarConfig =
            serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self).context("serialize toolbar config")?;
        fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!("base_url must start with http:// or https://");
        }
        if self.call_timeout_ms == 0 {
            anyhow::bail!("call_timeout_ms must be greater than 0");
        }
        if self.notification_capacity == 0 {
            anyhow::bail!("notification_capacity must be greater than 0");
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
