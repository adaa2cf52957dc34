// ABOUTME: HTTP request handlers for milestone projects
// ABOUTME: Creation, on-chain activation and the fund/complete/release milestone steps

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use escrowdesk_core::{
    AttachOnChainInput, CompleteMilestoneInput, FundMilestoneInput, ProjectCreateInput,
    ProjectFilter, ReleaseMilestoneInput,
};
use tracing::info;

use super::response::{created, ok};
use crate::manager::parse_milestone_number;
use crate::state::AppState;

/// List projects, optionally for one party or in one status
pub async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> impl IntoResponse {
    info!(
        address = ?filter.address,
        status = ?filter.status,
        "Listing projects"
    );

    match state.manager.list_projects(&filter).await {
        Ok(projects) => ok(projects),
        Err(e) => e.into_response(),
    }
}

/// Get a single project by ID
pub async fn get_project(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    info!("Getting project: {}", id);

    match state.manager.get_project(id).await {
        Ok(project) => ok(project),
        Err(e) => e.into_response(),
    }
}

/// Create a new project with its four milestones
pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<ProjectCreateInput>,
) -> impl IntoResponse {
    info!("Creating project: {}", input.title);

    match state.manager.create_project(input).await {
        Ok(project) => created(project),
        Err(e) => e.into_response(),
    }
}

/// Attach the on-chain id once the contract call went through
pub async fn attach_on_chain(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<AttachOnChainInput>,
) -> impl IntoResponse {
    info!("Attaching on-chain id {} to project {}", input.on_chain_id, id);

    match state.manager.attach_on_chain(id, input).await {
        Ok(project) => ok(project),
        Err(e) => e.into_response(),
    }
}

/// Mark a milestone funded. The body is optional.
pub async fn fund_milestone(
    State(state): State<AppState>,
    Path((id, number)): Path<(i32, String)>,
    input: Option<Json<FundMilestoneInput>>,
) -> impl IntoResponse {
    info!("Funding milestone {} of project {}", number, id);

    let number = match parse_milestone_number(&number) {
        Ok(number) => number,
        Err(e) => return e.into_response(),
    };
    let input = input.map(|Json(input)| input).unwrap_or_default();

    match state.manager.fund_milestone(id, number, input).await {
        Ok(project) => ok(project),
        Err(e) => e.into_response(),
    }
}

pub async fn complete_milestone(
    State(state): State<AppState>,
    Path((id, number)): Path<(i32, String)>,
    input: Option<Json<CompleteMilestoneInput>>,
) -> impl IntoResponse {
    info!("Completing milestone {} of project {}", number, id);

    let number = match parse_milestone_number(&number) {
        Ok(number) => number,
        Err(e) => return e.into_response(),
    };
    let input = input.map(|Json(input)| input).unwrap_or_default();

    match state.manager.complete_milestone(id, number, input).await {
        Ok(project) => ok(project),
        Err(e) => e.into_response(),
    }
}

pub async fn release_milestone(
    State(state): State<AppState>,
    Path((id, number)): Path<(i32, String)>,
    input: Option<Json<ReleaseMilestoneInput>>,
) -> impl IntoResponse {
    info!("Releasing milestone {} of project {}", number, id);

    let number = match parse_milestone_number(&number) {
        Ok(number) => number,
        Err(e) => return e.into_response(),
    };
    let input = input.map(|Json(input)| input).unwrap_or_default();

    match state.manager.release_milestone(id, number, input).await {
        Ok(project) => ok(project),
        Err(e) => e.into_response(),
    }
}
