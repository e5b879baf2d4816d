use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli_exec;

#[derive(Parser)]
#[command(name = "project-toolbar")]
#[command(about = "Run, reload, delete and push projects against the runner backend", long_about = None)]
struct Cli {
    /// Toolbar config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token (overrides the config file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Environment tag for log requests (overrides the config file)
    #[arg(long, global = true)]
    environment: Option<String>,

    /// Emit JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch a runner for a project
    Run {
        #[arg(long)]
        project_id: String,
        /// Display name (defaults to the project id)
        #[arg(long)]
        name: Option<String>,
    },

    /// Reload the project's live runner
    Reload {
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete a runner pod
    Delete {
        #[arg(long)]
        project_id: String,
        /// Pod to delete (defaults to `<project-id>-runner`)
        #[arg(long)]
        pod: Option<String>,
        /// Ask the backend to force the delete
        #[arg(long)]
        force: bool,
    },

    /// Commit and push pending changes
    Push {
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        name: Option<String>,
        /// Commit message (defaults to the current local time)
        #[arg(short = 'm', long)]
        message: Option<String>,
    },

    /// Show pending-change status from a project snapshot file
    Status {
        /// JSON file with `project` and `files`
        snapshot: PathBuf,
    },
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli_exec::resolve_config(&cli)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(cli_exec::execute(cli.command, config, cli.json))
}
