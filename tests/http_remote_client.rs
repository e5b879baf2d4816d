mod common;

use anyhow::Result;
use serde_json::json;

use common::{Endpoint, spawn_backend};
use project_toolbar::remote::{HttpRemoteClient, Operation, PushRequest, RemoteOperationClient};
use project_toolbar::{Project, ProjectFile};

#[tokio::test]
async fn run_posts_project_json_with_bearer_token() -> Result<()> {
    let backend = spawn_backend()?;
    backend.reply(Endpoint::Run, 201, "orders-runner");
    let client = HttpRemoteClient::new(backend.base_url.clone(), Some("dev".to_string()))?;

    let resp = client.run(&Project::new("orders", "Orders")).await;
    assert_eq!(resp.status, 201);
    assert_eq!(resp.payload, "orders-runner");
    assert!(Operation::Run.is_success(resp.status));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/runner");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer dev"));
    let body = requests[0].body.clone().unwrap();
    assert_eq!(body["projectId"], "orders");
    assert_eq!(body["name"], "Orders");
    Ok(())
}

#[tokio::test]
async fn reload_and_delete_use_path_parameters() -> Result<()> {
    let backend = spawn_backend()?;
    backend.reply(Endpoint::Reload, 200, "");
    backend.reply(Endpoint::Delete, 202, "");
    let client = HttpRemoteClient::new(backend.base_url.clone(), None)?;

    assert_eq!(client.reload("orders").await.status, 200);
    assert_eq!(client.delete("orders-runner", true).await.status, 202);

    let requests = backend.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/runner/reload/orders");
    assert_eq!(requests[0].authorization, None);
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].path, "/api/runner/orders-runner/true");
    Ok(())
}

#[tokio::test]
async fn pod_names_with_reserved_characters_stay_one_path_segment() -> Result<()> {
    let backend = spawn_backend()?;
    backend.reply(Endpoint::Delete, 202, "");
    let client = HttpRemoteClient::new(backend.base_url.clone(), None)?;

    let resp = client.delete("team/a?x", false).await;
    assert_eq!(resp.status, 202);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/api/runner/team/a?x/false");
    Ok(())
}

#[tokio::test]
async fn push_body_carries_only_project_id_and_message() -> Result<()> {
    let backend = spawn_backend()?;
    backend.reply(Endpoint::Push, 200, "");
    let client = HttpRemoteClient::new(backend.base_url.clone(), None)?;

    let resp = client.push(&PushRequest::new("orders", "fix bug")).await;
    assert_eq!(resp.status, 200);

    let requests = backend.requests();
    assert_eq!(requests[0].path, "/api/git");
    assert_eq!(
        requests[0].body,
        Some(json!({"projectId": "orders", "message": "fix bug"}))
    );
    Ok(())
}

#[tokio::test]
async fn error_statuses_pass_through_unchanged() -> Result<()> {
    let backend = spawn_backend()?;
    backend.reply(Endpoint::Run, 500, "boom");
    backend.reply(Endpoint::Delete, 200, "");
    let client = HttpRemoteClient::new(backend.base_url.clone(), None)?;

    let run = client.run(&Project::new("orders", "Orders")).await;
    assert_eq!(run.status, 500);
    assert_eq!(run.payload, "boom");

    // Only 202 counts as an accepted delete.
    let del = client.delete("orders-runner", false).await;
    assert_eq!(del.status, 200);
    assert!(!Operation::Delete.is_success(del.status));
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_reports_transport_failure() -> Result<()> {
    let client = HttpRemoteClient::new(common::closed_base_url()?, None)?;

    let resp = client.reload("orders").await;
    assert!(resp.is_transport_failure());
    assert_eq!(resp.status, 0);
    Ok(())
}

#[tokio::test]
async fn fetches_project_and_files_for_refresh() -> Result<()> {
    let backend = spawn_backend()?;
    let client = HttpRemoteClient::new(backend.base_url.clone(), None)?;

    let missing = client.fetch_project("orders").await.unwrap_err();
    assert!(format!("{:#}", missing).contains("not found"));

    backend.serve_project(
        json!({
            "projectId": "orders",
            "name": "Orders",
            "lastCommit": "abc123",
            "lastCommitTimestamp": 2000
        }),
        vec![json!({
            "name": "routes.camel.yaml",
            "projectId": "orders",
            "code": "- from: {}",
            "lastUpdate": 1500
        })],
    );

    let project = client.fetch_project("orders").await?;
    assert_eq!(
        project,
        Project::new("orders", "Orders").with_last_commit("abc123", 2000)
    );
    let files = client.fetch_files("orders").await?;
    assert_eq!(
        files,
        vec![ProjectFile::new("orders", "routes.camel.yaml", "- from: {}", 1500)]
    );
    Ok(())
}
