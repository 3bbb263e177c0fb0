use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use napex_core::{
    load_config, validate_config, GcsObjectStore, ObjectStore, PipelineService,
    TriggerOrchestrator, TriggerSettings, VertexPipelineClient,
};
use napex_server::api::create_router;
use napex_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("NAPEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "napex {} starting (config {})",
        VERSION,
        &config_hash[..16]
    );
    info!(
        "Project {} in {}, staging to gs://{}/uploads",
        config.gcp.project_id, config.gcp.region, config.gcp.bucket_name
    );
    info!("Duplicate policy: {:?}", config.trigger.duplicate_policy);

    let access_token = config.gcp.access_token.clone().filter(|t| !t.is_empty());
    if access_token.is_none() {
        info!("No access token configured, cloud requests are sent unauthenticated");
    }

    // Create object store
    let store: Arc<dyn ObjectStore> = Arc::new(
        GcsObjectStore::new(&config.storage, &config.gcp.bucket_name, access_token)
            .context("Failed to create object store client")?,
    );
    info!("Object store initialized: {}", store.name());

    // Create pipeline service
    let pipelines: Arc<dyn PipelineService> = Arc::new(
        VertexPipelineClient::new(&config.pipeline, &config.storage, &config.gcp)
            .context("Failed to create pipeline client")?,
    );
    info!("Pipeline service initialized: {}", pipelines.name());

    let orchestrator = Arc::new(TriggerOrchestrator::new(
        TriggerSettings::from(&config),
        store,
        pipelines,
    ));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
