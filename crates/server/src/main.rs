use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelsmith_core::{
    load_config, validate_config, ArtifactIndex, ArtifactStore, FfmpegEngine, MediaEngine,
    PipelineEngine, ProviderSet, RunOrchestrator, RunStore, SqliteRunStore, StubPublisher,
};
use reelsmith_server::{api::create_router, state::AppState};

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
    let config_path = std::env::var("REELSMITH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Artifact directory: {:?}", config.storage.artifact_dir);

    let run_store: Arc<dyn RunStore> = Arc::new(
        SqliteRunStore::new(&config.database.path).context("Failed to create run store")?,
    );
    info!("Run store initialized");

    tokio::fs::create_dir_all(&config.storage.artifact_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create artifact directory {:?}",
                config.storage.artifact_dir
            )
        })?;
    let artifacts = Arc::new(ArtifactIndex::new(Arc::new(ArtifactStore::new(
        config.storage.artifact_dir.clone(),
        config.storage.public_base.clone(),
    ))));

    // A missing ffmpeg only fails renders, the API stays usable
    let media: Arc<dyn MediaEngine> = Arc::new(FfmpegEngine::new(config.media.clone()));
    match media.validate().await {
        Ok(()) => info!("Media engine ready: {}", media.name()),
        Err(e) => warn!("Media engine unavailable, renders will fail: {}", e),
    }

    let providers = ProviderSet::from_config(&config, Arc::clone(&media));

    let engine = Arc::new(PipelineEngine::new(
        config.engine.clone(),
        Arc::clone(&run_store),
        providers,
        artifacts,
        media,
    ));
    info!("Pipeline stages: {}", engine.stage_names().join(" -> "));

    let publisher = Arc::new(StubPublisher::new(Duration::from_millis(
        config.orchestrator.publish_delay_ms,
    )));
    let orchestrator = Arc::new(RunOrchestrator::new(
        config.orchestrator.clone(),
        run_store,
        engine,
        publisher,
    ));
    info!("Run orchestrator initialized");

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, orchestrator));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
}
