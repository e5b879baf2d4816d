use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::Serialize;

use project_toolbar::channel::{RunnerEventChannel, ShowLog};
use project_toolbar::commit::{CommitPushCoordinator, RefreshHook};
use project_toolbar::config::ToolbarConfig;
use project_toolbar::controller::{LifecyclePolicy, RunnerLifecycleController, RunnerView};
use project_toolbar::model::{Project, ProjectSnapshot};
use project_toolbar::notify::{Notification, NotificationLog};
use project_toolbar::pending;
use project_toolbar::remote::HttpRemoteClient;
use project_toolbar::store::SessionStore;
use project_toolbar::toolbar::LastCommitPanel;

use crate::{Cli, Commands};

/// Config file (or defaults) with command-line overrides applied.
pub(crate) fn resolve_config(cli: &Cli) -> Result<ToolbarConfig> {
    let mut config = match &cli.config {
        Some(path) => ToolbarConfig::load(path)?,
        None => ToolbarConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    if let Some(environment) = &cli.environment {
        config.environment = environment.clone();
    }
    config.validate().context("invalid toolbar settings")?;
    Ok(config)
}

pub(crate) async fn execute(command: Commands, config: ToolbarConfig, json: bool) -> Result<()> {
    let session = Session::open(config)?;
    let outcome = match command {
        Commands::Run { project_id, name } => session.run(project(project_id, name)).await,
        Commands::Reload { project_id, name } => session.reload(project(project_id, name)).await,
        Commands::Delete {
            project_id,
            pod,
            force,
        } => session.delete(project(project_id, None), pod, force).await,
        Commands::Push {
            project_id,
            name,
            message,
        } => session.push(project(project_id, name), message).await?,
        Commands::Status { snapshot } => return status(&snapshot, json),
    };
    session.channel.end_session();

    print_outcome(&outcome, json)?;
    if let Some(err) = outcome.error {
        anyhow::bail!(err);
    }
    Ok(())
}

fn status(path: &Path, json: bool) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let snapshot: ProjectSnapshot =
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;

    let needs_commit = pending::needs_commit(snapshot.project.as_ref(), &snapshot.files);
    let pending_files: Vec<String> = snapshot
        .project
        .as_ref()
        .map(|p| {
            pending::pending_files(p, &snapshot.files)
                .into_iter()
                .map(|f| f.name.clone())
                .collect()
        })
        .unwrap_or_default();
    let panel = snapshot
        .project
        .as_ref()
        .map(|p| LastCommitPanel::new(p, needs_commit));

    if json {
        let out = serde_json::json!({
            "needs_commit": needs_commit,
            "pending_files": pending_files,
            "last_commit": panel,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("serialize status")?
        );
        return Ok(());
    }

    println!("needs commit: {}", if needs_commit { "yes" } else { "no" });
    for name in &pending_files {
        println!("  modified: {}", name);
    }
    if let Some(panel) = panel {
        println!(
            "last commit: {} ({})",
            panel.commit,
            panel.timestamp.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}

fn project(project_id: String, name: Option<String>) -> Project {
    let name = name.unwrap_or_else(|| project_id.clone());
    Project::new(project_id, name)
}

#[derive(Debug, Default, Serialize)]
struct Outcome {
    operation: &'static str,
    ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    runner: Option<RunnerView>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    logs: Vec<ShowLog>,

    #[serde(skip_serializing_if = "Option::is_none")]
    needs_commit: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    last_commit: Option<LastCommitPanel>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<Notification>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Outcome {
    fn new(operation: &'static str, error: Option<String>) -> Self {
        Self {
            operation,
            ok: error.is_none(),
            error,
            ..Self::default()
        }
    }
}

struct Session {
    config: ToolbarConfig,
    client: Arc<HttpRemoteClient>,
    channel: RunnerEventChannel,
    store: SessionStore,
    notifications: NotificationLog,
}

impl Session {
    fn open(config: ToolbarConfig) -> Result<Self> {
        let client = Arc::new(HttpRemoteClient::from_config(&config)?);
        Ok(Self {
            store: SessionStore::new(config.environment.clone()),
            channel: RunnerEventChannel::new(),
            notifications: NotificationLog::new(config.notification_capacity),
            client,
            config,
        })
    }

    fn controller(&self, project: Project, policy: LifecyclePolicy) -> RunnerLifecycleController {
        RunnerLifecycleController::new(
            project,
            self.client.clone(),
            self.channel.clone(),
            self.store.clone(),
            Arc::new(self.notifications.clone()),
            policy,
        )
    }

    fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy::from_config(&self.config)
    }

    async fn run(&self, project: Project) -> Outcome {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let _logs_sub = {
            let logs = Arc::clone(&logs);
            self.channel.subscribe_show_log(move |ev| {
                if let Ok(mut logs) = logs.lock() {
                    logs.push(ev.clone());
                }
            })
        };

        self.store.set_project(project.clone());
        let controller = self.controller(project.clone(), self.policy());
        let result = controller.start_runner(&project).await;

        let mut outcome = Outcome::new("run", result.err().map(|e| e.to_string()));
        outcome.runner = Some(controller.snapshot());
        outcome.logs = logs.lock().map(|l| l.clone()).unwrap_or_default();
        outcome.notifications = self.notifications.drain();
        outcome
    }

    async fn reload(&self, project: Project) -> Outcome {
        // A one-shot CLI has no prior session; the caller asserts the runner
        // belongs to this project.
        self.channel.publish_current_runner(Some(&project.name));
        let controller = self.controller(project.clone(), self.policy());
        let result = controller.reload_runner(&project.project_id).await;

        let mut outcome = Outcome::new("reload", result.err().map(|e| e.to_string()));
        outcome.runner = Some(controller.snapshot());
        outcome.notifications = self.notifications.drain();
        outcome
    }

    async fn delete(&self, project: Project, pod: Option<String>, force: bool) -> Outcome {
        let pod = pod.unwrap_or_else(|| project.runner_pod_name());
        let mut policy = self.policy();
        policy.force_delete |= force;
        let controller = self.controller(project, policy);
        let result = controller.delete_runner(&pod).await;

        let mut outcome = Outcome::new("delete", result.err().map(|e| e.to_string()));
        outcome.runner = Some(controller.snapshot());
        outcome.notifications = self.notifications.drain();
        outcome
    }

    async fn push(&self, project: Project, message: Option<String>) -> Result<Outcome> {
        let (refresh_tx, mut refresh_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let refresh: RefreshHook = Arc::new(move |p: &Project| {
            let _ = refresh_tx.send(p.project_id.clone());
        });
        let coordinator = CommitPushCoordinator::new(
            self.client.clone(),
            Arc::new(self.notifications.clone()),
            refresh,
            self.config.call_timeout(),
        );

        coordinator.open_commit_dialog(message.as_deref());
        let result = coordinator.confirm_draft(&project).await;
        let mut outcome = Outcome::new("push", result.err().map(|e| e.to_string()));

        while let Ok(project_id) = refresh_rx.try_recv() {
            let fresh = self
                .client
                .fetch_project(&project_id)
                .await
                .context("refresh project after push")?;
            let files = self
                .client
                .fetch_files(&project_id)
                .await
                .context("refresh files after push")?;
            self.store.apply_refresh(fresh, files);

            let needs_commit = self.store.needs_commit();
            outcome.needs_commit = Some(needs_commit);
            outcome.last_commit = self
                .store
                .project()
                .map(|p| LastCommitPanel::new(&p, needs_commit));
        }
        outcome.notifications = self.notifications.drain();
        Ok(outcome)
    }
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("serialize outcome")?
        );
        return Ok(());
    }

    if outcome.ok {
        println!("{}: ok", outcome.operation);
    }
    if let Some(runner) = &outcome.runner {
        println!(
            "runner {}: {} (pod {})",
            runner.project_name, runner.state, runner.pod_name
        );
    }
    for log in &outcome.logs {
        println!("logs: {} {} [{}]", log.kind, log.pod_name, log.environment);
    }
    if let Some(needs_commit) = outcome.needs_commit {
        println!("needs commit: {}", if needs_commit { "yes" } else { "no" });
    }
    if let Some(panel) = &outcome.last_commit {
        println!(
            "last commit: {} ({})",
            panel.commit,
            panel.timestamp.as_deref().unwrap_or("never")
        );
    }
    for note in &outcome.notifications {
        eprintln!("! {}", note.message);
    }
    Ok(())
}
