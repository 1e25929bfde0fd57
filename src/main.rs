//! AISEO-RS server entry point

use aiseo_rs::{
    config,
    network::HttpClient,
    providers::ProviderLoader,
    web::{create_router, AppState},
};
use anyhow::Result;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials usually live in .env next to the binary
    let dotenv = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting AISEO-RS v{}", aiseo_rs::VERSION);
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let settings = config::load()?;
    info!(
        "Loaded configuration for instance: {}",
        settings.general.instance_name
    );

    let client = HttpClient::with_settings(&settings.outgoing)?;

    let registry = ProviderLoader::load(&settings)?;
    if registry.is_empty() {
        warn!("No providers configured; set API keys in the environment or settings.yml");
    }

    let state = AppState::new(settings.clone(), registry, client)?;
    if let Some(pipeline) = state.orchestrator.pipeline() {
        info!("Analysis enabled via provider {}", pipeline.provider_name());
        if let Some(ledger) = pipeline.ledger() {
            if let Err(e) = ledger.initialize().await {
                warn!("Analysis ledger unavailable: {:#}", e);
            }
        }
    }

    let app = create_router(state);

    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
