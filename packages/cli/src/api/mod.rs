use axum::{routing::get, Router};
use escrowdesk_projects::{create_api_router, AppState};

pub mod health;

/// Full application router: health endpoints plus every resource router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/status", get(health::status_check))
        .with_state(state.clone())
        .merge(create_api_router(state))
}
