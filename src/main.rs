use std::path::Path;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coastwatch::common::AppState;
use coastwatch::config::Config;
use coastwatch::domain::location;
use coastwatch::ingest::scheduler;
use coastwatch::provider::ProviderClient;
use coastwatch::routes;
use coastwatch::scoring::ModelRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coastwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting coastwatch...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        deployment = ?config.deployment,
        host = %config.api_host,
        port = config.api_port,
        "Configuration loaded"
    );

    // Load monitored locations (fail-fast)
    let locations = location::load_locations(config.locations_file.as_deref())?;
    tracing::info!(count = locations.len(), "Locations loaded");

    // Build the model registry and load artifacts
    let models = ModelRegistry::new(&config.model_version);
    let loaded = models.load_dir(Path::new(&config.model_dir));
    tracing::info!(loaded, active = %models.active_version(), "Model registry initialized");
    if models.active().is_err() {
        tracing::error!(
            version = %config.model_version,
            "Configured model version is not registered; scoring will fail until it is loaded"
        );
    }

    // Build provider clients
    let providers = ProviderClient::from_config(&config);
    tracing::info!(count = providers.len(), "Providers initialized");

    // Create application state
    let state = AppState::new(config.clone(), providers, models);
    for loc in locations {
        state.store.upsert_location(loc);
    }

    // Spawn pipeline loops (fire-and-forget, non-blocking)
    tracing::info!("Spawning pipeline tasks...");
    tokio::spawn(scheduler::run_ingest_loop(state.clone()));
    tokio::spawn(scheduler::run_scoring_loop(state.clone()));
    tokio::spawn(scheduler::run_cleanup_loop(state.clone()));

    // Build router
    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting server");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
