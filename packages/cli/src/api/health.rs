use axum::{extract::State, http::StatusCode, Json};
use escrowdesk_core::SERVICE_NAME;
use escrowdesk_projects::AppState;
use serde_json::{json, Value};
use tracing::error;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE_NAME
    }))
}

/// Liveness plus a summary of the storage backend
pub async fn status_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = chrono::Utc::now().timestamp();

    match state.manager.storage().get_storage_info().await {
        Ok(storage) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": timestamp,
                "version": env!("CARGO_PKG_VERSION"),
                "service": SERVICE_NAME,
                "storage": storage
            })),
        ),
        Err(e) => {
            error!(error = %e, "Storage status check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "timestamp": timestamp,
                    "version": env!("CARGO_PKG_VERSION"),
                    "service": SERVICE_NAME
                })),
            )
        }
    }
}
