// ABOUTME: Core types, validation and constants for EscrowDesk
// ABOUTME: Foundational package shared by storage, workflow and server crates

pub mod constants;
pub mod types;
pub mod validation;

// Re-export main types
pub use types::{
    AttachOnChainInput, Category, CompleteMilestoneInput, Escrow, EscrowCreateInput,
    EscrowFilter, EscrowStatus, EscrowUpdate, FundMilestoneInput, InvalidMilestoneNumber,
    Milestone, MilestoneInput, MilestoneNumber, MilestoneUpdate, ParseEnumError, Project,
    ProjectCreateInput, ProjectFilter, ProjectStatus, ProjectUpdate, RecordFilter,
    ReleaseEscrowInput, ReleaseMilestoneInput, TokenType, User, UserCreateInput,
    MILESTONE_COUNT,
};

// Re-export constants
pub use constants::{DEFAULT_CATEGORIES, SERVICE_NAME};

// Re-export validation
pub use validation::{
    validate_escrow_data, validate_on_chain_input, validate_project_data, validate_tx_id,
    ValidationError,
};
