// ABOUTME: EscrowDesk HTTP server wiring
// ABOUTME: Builds storage from config, layers CORS and request tracing, and serves the API

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use escrowdesk_projects::AppState;
use escrowdesk_storage::StorageFactory;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod api;
pub mod config;


pub use config::{Config, ConfigError};

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let storage_config = config.storage_config();
    info!("Storage provider: {}", storage_config.provider_name());

    let storage = StorageFactory::create_storage(storage_config)
        .await
        .context("Failed to initialize storage")?;

    let app = api::create_router(AppState::new(storage))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origin)?);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
