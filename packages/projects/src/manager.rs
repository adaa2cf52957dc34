use escrowdesk_core::{
    validate_escrow_data, validate_on_chain_input, validate_project_data, validate_tx_id,
    AttachOnChainInput, Category, CompleteMilestoneInput, Escrow, EscrowCreateInput,
    EscrowFilter, EscrowStatus, EscrowUpdate, FundMilestoneInput, MilestoneNumber,
    MilestoneUpdate, Project, ProjectCreateInput, ProjectFilter, ProjectStatus, ProjectUpdate,
    ReleaseEscrowInput, ReleaseMilestoneInput, ValidationError, MILESTONE_COUNT,
};
use escrowdesk_storage::{EscrowStorage, EscrowStorageExt, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Manager errors
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ManagerError {
    /// Turn a storage `NotFound` into a named one
    fn for_record(kind: &str, id: i32, err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ManagerError::NotFound(format!("{} {}", kind, id)),
            other => ManagerError::Storage(other),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

fn ensure_valid(errors: Vec<ValidationError>) -> ManagerResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ManagerError::Validation(errors))
    }
}

/// Parse a milestone number taken from a request path
pub fn parse_milestone_number(raw: &str) -> ManagerResult<MilestoneNumber> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .and_then(|n| MilestoneNumber::try_from(n).ok())
        .ok_or_else(|| {
            ManagerError::Validation(vec![ValidationError::new(
                "milestone",
                format!(
                    "Milestone number must be between 1 and {}, got {}",
                    MILESTONE_COUNT, raw
                ),
            )])
        })
}

/// Escrow and milestone workflow over an injected storage backend.
///
/// Every transition is a plain write of the flags it names. The only
/// ordering rule is that a milestone must be complete before it is
/// released; re-applying a transition is accepted.
#[derive(Clone)]
pub struct EscrowManager {
    storage: Arc<dyn EscrowStorage>,
}

impl EscrowManager {
    pub fn new(storage: Arc<dyn EscrowStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn EscrowStorage> {
        &self.storage
    }

    pub async fn list_categories(&self) -> ManagerResult<Vec<Category>> {
        let categories = self.storage.list_categories().await?;
        debug!("Retrieved {} categories", categories.len());
        Ok(categories)
    }

    // Escrows

    pub async fn list_escrows(&self, filter: &EscrowFilter) -> ManagerResult<Vec<Escrow>> {
        let escrows = self.storage.list_escrows(filter).await?;
        debug!("Retrieved {} escrows", escrows.len());
        Ok(escrows)
    }

    pub async fn get_escrow(&self, id: i32) -> ManagerResult<Escrow> {
        self.storage
            .require_escrow(id)
            .await
            .map_err(|e| ManagerError::for_record("Escrow", id, e))
    }

    /// Store a new escrow; one already reported on chain starts out locked
    pub async fn create_escrow(&self, input: EscrowCreateInput) -> ManagerResult<Escrow> {
        ensure_valid(validate_escrow_data(&input))?;

        let escrow = self.storage.create_escrow(input).await?;
        info!(
            escrow_id = escrow.id,
            status = %escrow.status,
            "Created escrow"
        );
        Ok(escrow)
    }

    /// Mark an escrow released. `funded` and `completed` are left as they are.
    pub async fn release_escrow(&self, id: i32, input: ReleaseEscrowInput) -> ManagerResult<Escrow> {
        ensure_valid(validate_tx_id(input.tx_id.as_deref()))?;

        let update = EscrowUpdate {
            tx_id: input.tx_id,
            status: Some(EscrowStatus::Released),
            released: Some(true),
            ..Default::default()
        };

        let escrow = self
            .storage
            .update_escrow(id, update)
            .await
            .map_err(|e| ManagerError::for_record("Escrow", id, e))?;
        info!(escrow_id = id, "Released escrow");
        Ok(escrow)
    }

    // Projects

    pub async fn list_projects(&self, filter: &ProjectFilter) -> ManagerResult<Vec<Project>> {
        let projects = self.storage.list_projects(filter).await?;
        debug!("Retrieved {} projects", projects.len());
        Ok(projects)
    }

    pub async fn get_project(&self, id: i32) -> ManagerResult<Project> {
        self.storage
            .require_project(id)
            .await
            .map_err(|e| ManagerError::for_record("Project", id, e))
    }

    pub async fn create_project(&self, input: ProjectCreateInput) -> ManagerResult<Project> {
        ensure_valid(validate_project_data(&input))?;

        let project = self.storage.create_project(input).await?;
        info!(project_id = project.id, title = %project.title, "Created project");
        Ok(project)
    }

    /// Record the on-chain id after the client's wallet created the contract
    pub async fn attach_on_chain(&self, id: i32, input: AttachOnChainInput) -> ManagerResult<Project> {
        ensure_valid(validate_on_chain_input(&input))?;

        let update = ProjectUpdate {
            on_chain_id: Some(input.on_chain_id),
            tx_id: input.tx_id,
            status: Some(ProjectStatus::Active),
            milestone: None,
        };

        let project = self.update_project(id, update).await?;
        info!(
            project_id = id,
            on_chain_id = input.on_chain_id,
            "Project is active on chain"
        );
        Ok(project)
    }

    pub async fn fund_milestone(
        &self,
        id: i32,
        number: MilestoneNumber,
        input: FundMilestoneInput,
    ) -> ManagerResult<Project> {
        ensure_valid(validate_tx_id(input.tx_id.as_deref()))?;

        let mut change = MilestoneUpdate::new(number);
        change.funded = Some(true);

        let project = self
            .update_project(
                id,
                ProjectUpdate {
                    milestone: Some(change),
                    ..Default::default()
                },
            )
            .await?;
        info!(
            project_id = id,
            milestone = %number,
            tx_id = ?input.tx_id,
            "Funded milestone"
        );
        Ok(project)
    }

    pub async fn complete_milestone(
        &self,
        id: i32,
        number: MilestoneNumber,
        input: CompleteMilestoneInput,
    ) -> ManagerResult<Project> {
        let mut change = MilestoneUpdate::new(number);
        change.complete = Some(true);
        change.completion_description = input.completion_description;
        change.completion_attachment = input.completion_attachment;

        let project = self
            .update_project(
                id,
                ProjectUpdate {
                    milestone: Some(change),
                    ..Default::default()
                },
            )
            .await?;
        info!(project_id = id, milestone = %number, "Completed milestone");
        Ok(project)
    }

    /// Release a completed milestone and roll the project up to
    /// `COMPLETED` once all four are released.
    pub async fn release_milestone(
        &self,
        id: i32,
        number: MilestoneNumber,
        input: ReleaseMilestoneInput,
    ) -> ManagerResult<Project> {
        ensure_valid(validate_tx_id(input.tx_id.as_deref()))?;

        let current = self.get_project(id).await?;
        if !current.milestone(number).complete {
            return Err(ManagerError::InvalidTransition(format!(
                "milestone {} of project {} must be complete before it is released",
                number, id
            )));
        }

        let mut change = MilestoneUpdate::new(number);
        change.released = Some(true);

        let mut project = self
            .update_project(
                id,
                ProjectUpdate {
                    milestone: Some(change),
                    ..Default::default()
                },
            )
            .await?;
        info!(
            project_id = id,
            milestone = %number,
            tx_id = ?input.tx_id,
            "Released milestone"
        );

        if project.all_milestones_released() && project.status != ProjectStatus::Completed {
            project = self
                .update_project(
                    id,
                    ProjectUpdate {
                        status: Some(ProjectStatus::Completed),
                        ..Default::default()
                    },
                )
                .await?;
            info!(project_id = id, "All milestones released, project completed");
        }

        Ok(project)
    }

    async fn update_project(&self, id: i32, update: ProjectUpdate) -> ManagerResult<Project> {
        self.storage
            .update_project(id, update)
            .await
            .map_err(|e| ManagerError::for_record("Project", id, e))
    }
}
