//! caraveld — the Caravel daemon.
//!
//! Single binary that assembles the deployment control plane:
//! - State store (redb)
//! - Ability registry + workload query facade
//! - GitOps and CD backends
//! - Deployment pipeline
//! - REST API
//!
//! # Usage
//!
//! ```text
//! caraveld standalone --port 8443 --data-dir /var/lib/caravel
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use caravel_api::ApiState;
use caravel_cd::{CdFacade, RecordingCd};
use caravel_core::CaravelConfig;
use caravel_gitops::InMemoryGitops;
use caravel_pipeline::Deployer;
use caravel_workload::rollout::{RolloutAbility, gvr_pod, gvr_rollout};
use caravel_workload::{AbilityRegistry, InMemoryCluster};

#[derive(Parser)]
#[command(name = "caraveld", about = "Caravel daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run in standalone mode (single-node, in-memory collaborators).
    Standalone {
        /// Port to listen on. Overrides the config file.
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state. Overrides the config file.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Path to a caravel.toml configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,caraveld=debug,caravel=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Standalone {
            port,
            data_dir,
            config,
        } => {
            let config = match config {
                Some(path) => CaravelConfig::from_file(&path)?,
                None => CaravelConfig::default(),
            };
            let port = port.unwrap_or_else(|| config.api_port());
            let data_dir = data_dir.unwrap_or_else(|| PathBuf::from(config.data_dir()));
            run_standalone(port, data_dir).await
        }
    }
}

async fn run_standalone(port: u16, data_dir: PathBuf) -> anyhow::Result<()> {
    info!("Caravel daemon starting in standalone mode");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("caravel.redb");

    // ── Initialize subsystems ──────────────────────────────────

    // State store.
    let store = caravel_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    // Ability registry. Populated once here, read-only afterwards.
    let mut registry = AbilityRegistry::new();
    registry.register(
        Arc::new(RolloutAbility),
        vec![gvr_rollout("v1alpha1"), gvr_pod()],
    );
    let registry = Arc::new(registry);
    info!(
        resources = registry.watched_resources().len(),
        "ability registry built"
    );

    // In-memory collaborators: cluster state, gitops repo, CD backend.
    let cluster = InMemoryCluster::new();
    let gitops = Arc::new(InMemoryGitops::new());
    let backend = Arc::new(RecordingCd::new());

    let cd = Arc::new(CdFacade::new(cluster.client(), registry, backend.clone()));
    let deployer = Arc::new(Deployer::new(store.clone(), gitops, backend));
    info!("pipeline deployer initialized");

    // ── Start API server ───────────────────────────────────────

    let router = caravel_api::build_router(ApiState {
        store,
        deployer,
        cd,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("Caravel daemon stopped");
    Ok(())
}
