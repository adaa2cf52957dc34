// ABOUTME: HTTP request handlers for category reference data

use axum::{extract::State, response::IntoResponse};
use tracing::info;

use super::response::ok;
use crate::state::AppState;

/// List all categories
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    info!("Listing categories");

    match state.manager.list_categories().await {
        Ok(categories) => ok(categories),
        Err(e) => e.into_response(),
    }
}
