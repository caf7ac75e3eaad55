mod config;
mod errors;
mod guard;
mod models;
mod routes;
mod state;
mod upstream;
mod versioning;
mod workspace;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::upstream::ApiClient;
use crate::workspace::FileSelectionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PromptDesk API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize upstream client
    let upstream = ApiClient::new(
        &config.upstream_api_url,
        config.upstream_api_token.clone(),
        config.upstream_timeout,
    )?;
    if upstream.has_token() {
        info!("Upstream client initialized ({})", config.upstream_api_url);
    } else {
        warn!(
            "Upstream client initialized without a token ({}); set one via PUT /api/v1/session",
            config.upstream_api_url
        );
    }

    // Workspace selection survives restarts
    let selection_store = Arc::new(FileSelectionStore::new(config.selection_store_path.clone()));
    info!(
        "Selection store at {}",
        config.selection_store_path.display()
    );

    let state = AppState::new(upstream, config.clone(), selection_store);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
