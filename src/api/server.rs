use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{alive, home, ingest_event, stats, AppState};
use crate::config::GatekeeperConfig;
use crate::pipeline::{Gatekeeper, TracingSink};
use crate::registry::RegistryConfig;
use crate::schema::SchemaCache;
use crate::sim::{RandomSource, SeededRandom, SystemClock, ThreadRandom, TokioLatency};
use crate::storage::{EventWriter, PartitionSelector};

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        // Health check
        .route("/x/alive", get(alive))
        // Event intake
        .route("/1/events/:dataset_name", post(ingest_event))
        // Stats
        .route("/stats", get(stats))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Assemble the pipeline from configuration: registries, partition logs,
/// schema cache and randomness.
pub fn build_gatekeeper(config: &GatekeeperConfig) -> Result<Gatekeeper, Box<dyn std::error::Error>> {
    let registry = match &config.registry_path {
        Some(path) => {
            tracing::info!("Loading registry from {}", path.display());
            RegistryConfig::load(path)?
        }
        None => {
            tracing::info!("Using built-in registry");
            RegistryConfig::builtin()
        }
    };
    let (credentials, datasets) = registry.build()?;
    tracing::info!(
        "Registry loaded: {} teams, {} datasets",
        credentials.len(),
        datasets.len()
    );

    let writer = EventWriter::new(&config.log_dir)?.with_sync(config.sync_on_write);

    let random: Arc<dyn RandomSource> = match config.seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    };

    let schema = SchemaCache::with_sources(
        config.schema.clone(),
        Arc::new(SystemClock),
        Arc::new(TokioLatency),
        Arc::clone(&random),
    );

    Ok(Gatekeeper::new(Arc::new(credentials), Arc::new(datasets), Arc::new(writer))
        .with_selector(PartitionSelector::with_random(random))
        .with_schema_cache(Arc::new(schema))
        .with_telemetry(Arc::new(TracingSink)))
}

/// Run the HTTP server
pub async fn run_server(config: GatekeeperConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gatekeeper = Arc::new(build_gatekeeper(&config)?);
    let state = Arc::new(AppState { gatekeeper });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting gatekeeper on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gatekeeper stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        // Without a handler, run until killed
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, draining requests...");
}
