use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub mod categories_handlers;
pub mod escrows_handlers;
pub mod handlers;
pub mod response;

/// Creates the categories API router
pub fn create_categories_router() -> Router<AppState> {
    Router::new().route("/", get(categories_handlers::list_categories))
}

/// Creates the escrows API router
pub fn create_escrows_router() -> Router<AppState> {
    Router::new()
        .route("/", get(escrows_handlers::list_escrows))
        .route("/", post(escrows_handlers::create_escrow))
        .route("/{id}", get(escrows_handlers::get_escrow))
        .route("/{id}/release", patch(escrows_handlers::release_escrow))
}

/// Creates the projects API router
pub fn create_projects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_projects))
        .route("/", post(handlers::create_project))
        .route("/{id}", get(handlers::get_project))
        .route("/{id}/on-chain", patch(handlers::attach_on_chain))
        // Milestone transitions
        .route(
            "/{id}/milestone/{number}/fund",
            patch(handlers::fund_milestone),
        )
        .route(
            "/{id}/milestone/{number}/complete",
            patch(handlers::complete_milestone),
        )
        .route(
            "/{id}/milestone/{number}/release",
            patch(handlers::release_milestone),
        )
}

/// All resource routers under `/api`, bound to the shared state
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/categories", create_categories_router())
        .nest("/api/escrows", create_escrows_router())
        .nest("/api/projects", create_projects_router())
        .with_state(state)
}
