//! pybox server - vetted Python snippet execution
//!
//! Backend for the browser playground: screens submitted snippets against
//! an import denylist, runs approved ones in a short-lived isolated
//! interpreter process, and persists the editor's virtual filesystem as an
//! opaque JSON array.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pybox_analyzer::ImportPolicy;
use pybox_sandbox::{Sandbox, SandboxConfig};
use pybox_store::FsStore;

mod routes;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "pybox")]
#[command(version)]
#[command(about = "Vetted Python snippet execution server", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 5001)]
    port: u16,

    /// Wall-clock limit for snippet execution, in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    /// Interpreter used to run snippets
    #[arg(long, default_value = "python3")]
    python: String,

    /// Path of the persisted virtual filesystem
    #[arg(long, default_value = "filesystem.json")]
    data_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let state = Arc::new(AppState {
        policy: ImportPolicy::default(),
        sandbox: Sandbox::new(SandboxConfig {
            timeout: Duration::from_secs(cli.timeout_secs),
            python: cli.python,
            workdir: None,
        }),
        store: FsStore::new(cli.data_file),
    });

    // The editor frontend is served from anywhere (file://, localhost, a
    // static host), so these routes stay wide open for CORS
    let app = Router::new()
        .route("/execute/python", post(routes::execute_python))
        .route(
            "/filesystem",
            get(routes::load_filesystem).post(routes::save_filesystem),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    info!(%addr, "pybox server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
