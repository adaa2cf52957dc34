//! # EscrowDesk Projects
//!
//! Escrow and milestone workflow for EscrowDesk, plus the axum routers that
//! expose it over HTTP.

pub mod api;
pub mod manager;
pub mod state;

pub use api::{
    create_api_router, create_categories_router, create_escrows_router, create_projects_router,
};
pub use manager::{parse_milestone_number, EscrowManager, ManagerError, ManagerResult};
pub use state::AppState;

// Re-export main types from core
pub use escrowdesk_core::{
    Category, Escrow, EscrowCreateInput, EscrowStatus, Milestone, MilestoneNumber, Project,
    ProjectCreateInput, ProjectStatus, TokenType,
};
