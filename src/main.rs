//! Gatekeeper Server
//!
//! Run with: cargo run
//!
//! Configuration comes from `GATEKEEPER_*` environment variables, see
//! `gatekeeper::config`. RUST_LOG sets the log level (default: info).

use gatekeeper::api::run_server;
use gatekeeper::config::GatekeeperConfig;
use gatekeeper::schema::CacheScope;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatekeeperConfig::from_env()?;

    tracing::info!("Gatekeeper configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Partition logs: {}", config.log_dir.display());
    tracing::info!("  Sync on write: {}", config.sync_on_write);
    match &config.registry_path {
        Some(path) => tracing::info!("  Registry: {}", path.display()),
        None => tracing::info!("  Registry: built-in"),
    }
    tracing::info!("  Schema cache TTL: {:?}", config.schema.ttl);
    tracing::info!(
        "  Schema backend latency: {:?}..={:?}",
        config.schema.latency_min,
        config.schema.latency_max
    );
    if config.schema.fault_one_in > 0 {
        tracing::info!("  Schema fault injection: 1 in {}", config.schema.fault_one_in);
    } else {
        tracing::info!("  Schema fault injection: disabled");
    }
    match config.schema.scope {
        CacheScope::Global => tracing::info!("  Schema cache scope: global"),
        CacheScope::PerDataset => tracing::info!("  Schema cache scope: per dataset"),
    }
    if let Some(seed) = config.seed {
        tracing::info!("  Random seed: {}", seed);
    }

    run_server(config).await
}
