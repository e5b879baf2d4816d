#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use serde_json::Value;

/// Backend endpoint a scripted reply applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Run,
    Reload,
    Delete,
    Push,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct StubState {
    replies: Mutex<HashMap<Endpoint, (u16, String)>>,
    project: Mutex<Option<Value>>,
    files: Mutex<Vec<Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubState {
    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path,
            body,
            authorization,
        });
    }

    fn reply(&self, endpoint: Endpoint) -> Response {
        let (status, payload) = self
            .replies
            .lock()
            .unwrap()
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| (500, "no reply scripted".to_string()));
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, payload).into_response()
    }
}

/// In-process runner/git backend listening on an ephemeral port.
pub struct StubBackend {
    pub base_url: String,
    state: Arc<StubState>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl StubBackend {
    pub fn reply(&self, endpoint: Endpoint, status: u16, payload: &str) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(endpoint, (status, payload.to_string()));
    }

    pub fn serve_project(&self, project: Value, files: Vec<Value>) {
        *self.state.project.lock().unwrap() = Some(project);
        *self.state.files.lock().unwrap() = files;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

/// Starts the stub on its own thread so both async tests and tests that
/// spawn the CLI binary can talk to it.
pub fn spawn_backend() -> Result<StubBackend> {
    let state = Arc::new(StubState::default());
    let app = router(state.clone());

    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").context("bind stub backend")?;
    std_listener
        .set_nonblocking(true)
        .context("set stub listener nonblocking")?;
    let local_addr = std_listener
        .local_addr()
        .context("read stub listener local addr")?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    thread::spawn(move || -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("build stub runtime")?;
        runtime.block_on(async move {
            let listener =
                tokio::net::TcpListener::from_std(std_listener).context("adopt stub listener")?;
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .context("stub backend error")
        })
    });

    Ok(StubBackend {
        base_url: format!("http://{}", local_addr),
        state,
        shutdown: Some(shutdown_tx),
    })
}

/// A base URL nothing listens on.
pub fn closed_base_url() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").context("bind probe port")?;
    let addr = listener.local_addr().context("read probe addr")?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/runner", post(run_runner))
        .route("/api/runner/reload/:project_id", get(reload_runner))
        .route("/api/runner/:pod_name/:force", delete(delete_runner))
        .route("/api/git", post(push))
        .route("/api/project/:project_id", get(get_project))
        .route("/api/file/:project_id", get(get_files))
        .with_state(state)
}

async fn run_runner(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", "/api/runner".to_string(), &headers, Some(body));
    state.reply(Endpoint::Run)
}

async fn reload_runner(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Response {
    state.record(
        "GET",
        format!("/api/runner/reload/{}", project_id),
        &headers,
        None,
    );
    state.reply(Endpoint::Reload)
}

async fn delete_runner(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path((pod_name, force)): Path<(String, String)>,
) -> Response {
    state.record(
        "DELETE",
        format!("/api/runner/{}/{}", pod_name, force),
        &headers,
        None,
    );
    state.reply(Endpoint::Delete)
}

async fn push(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", "/api/git".to_string(), &headers, Some(body));
    state.reply(Endpoint::Push)
}

async fn get_project(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Response {
    state.record("GET", format!("/api/project/{}", project_id), &headers, None);
    match state.project.lock().unwrap().clone() {
        Some(project) => Json(project).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "not found"})),
        )
            .into_response(),
    }
}

async fn get_files(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Response {
    state.record("GET", format!("/api/file/{}", project_id), &headers, None);
    Json(state.files.lock().unwrap().clone()).into_response()
}
