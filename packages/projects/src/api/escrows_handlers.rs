// ABOUTME: HTTP request handlers for single-payment escrows
// ABOUTME: Create, look up, list and release escrows reported by the frontend

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use escrowdesk_core::{EscrowCreateInput, EscrowFilter, ReleaseEscrowInput};
use tracing::info;

use super::response::{created, ok};
use crate::state::AppState;

/// List escrows, optionally for one party or in one status
pub async fn list_escrows(
    State(state): State<AppState>,
    Query(filter): Query<EscrowFilter>,
) -> impl IntoResponse {
    info!(
        address = ?filter.address,
        status = ?filter.status,
        "Listing escrows"
    );

    match state.manager.list_escrows(&filter).await {
        Ok(escrows) => ok(escrows),
        Err(e) => e.into_response(),
    }
}

/// Get a single escrow by ID
pub async fn get_escrow(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    info!("Getting escrow: {}", id);

    match state.manager.get_escrow(id).await {
        Ok(escrow) => ok(escrow),
        Err(e) => e.into_response(),
    }
}

/// Create a new escrow
pub async fn create_escrow(
    State(state): State<AppState>,
    Json(input): Json<EscrowCreateInput>,
) -> impl IntoResponse {
    info!(
        "Creating escrow between {} and {}",
        input.client_address, input.freelancer_address
    );

    match state.manager.create_escrow(input).await {
        Ok(escrow) => created(escrow),
        Err(e) => e.into_response(),
    }
}

/// Mark an escrow as released
pub async fn release_escrow(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    input: Option<Json<ReleaseEscrowInput>>,
) -> impl IntoResponse {
    info!("Releasing escrow: {}", id);

    let input = input.map(|Json(input)| input).unwrap_or_default();

    match state.manager.release_escrow(id, input).await {
        Ok(escrow) => ok(escrow),
        Err(e) => e.into_response(),
    }
}
