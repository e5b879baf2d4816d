//! Payload types for backend requests/responses.

/// Body of a git push; serialized as exactly `{projectId, message}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PushRequest {
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub message: String,
}

impl PushRequest {
    pub fn new(project_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            message: message.into(),
        }
    }
}

/// Extract the pod id from a run response.
///
/// The backend answers with the bare name, but some deployments wrap it as
/// a JSON string.
pub fn pod_name_from_payload(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('"') {
        if let Ok(s) = serde_json::from_str::<String>(trimmed) {
            let s = s.trim().to_string();
            return (!s.is_empty()).then_some(s);
        }
    }
    Some(trimmed.to_string())
}
