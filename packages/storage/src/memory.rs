// ABOUTME: Process-local storage backend used when no database is configured
// ABOUTME: Keeps every table in ordered maps behind a single async lock

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use escrowdesk_core::{
    Category, Escrow, EscrowCreateInput, EscrowFilter, EscrowUpdate, Project,
    ProjectCreateInput, ProjectFilter, ProjectStatus, ProjectUpdate, User, UserCreateInput,
    DEFAULT_CATEGORIES,
};

use super::{EscrowStorage, StorageError, StorageInfo, StorageResult};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    categories: BTreeMap<i32, Category>,
    escrows: BTreeMap<i32, Escrow>,
    projects: BTreeMap<i32, Project>,
    next_user_id: i32,
    next_category_id: i32,
    next_escrow_id: i32,
    next_project_id: i32,
}

impl Tables {
    /// Mirrors the foreign key the PostgreSQL schema puts on `category_id`
    fn check_category(&self, category_id: Option<i32>) -> StorageResult<()> {
        match category_id {
            Some(id) if !self.categories.contains_key(&id) => Err(StorageError::InvalidReference(
                format!("category {} does not exist", id),
            )),
            _ => Ok(()),
        }
    }
}

/// Bump a per-table counter and return the new id (ids start at 1)
fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// In-memory implementation of EscrowStorage
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    /// Create an empty store seeded with the default categories
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (name, description) in DEFAULT_CATEGORIES {
            let id = next_id(&mut tables.next_category_id);
            tables.categories.insert(
                id,
                Category {
                    id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                },
            );
        }

        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_escrow_update(escrow: &mut Escrow, update: EscrowUpdate, now: DateTime<Utc>) {
    if let Some(on_chain_id) = update.on_chain_id {
        escrow.on_chain_id = Some(on_chain_id);
    }
    if let Some(tx_id) = update.tx_id {
        escrow.tx_id = Some(tx_id);
    }
    if let Some(status) = update.status {
        escrow.status = status;
    }
    if let Some(funded) = update.funded {
        escrow.funded = funded;
    }
    if let Some(completed) = update.completed {
        escrow.completed = completed;
    }
    if let Some(released) = update.released {
        escrow.released = released;
    }
    escrow.updated_at = now;
}

fn apply_project_update(project: &mut Project, update: ProjectUpdate, now: DateTime<Utc>) {
    if let Some(on_chain_id) = update.on_chain_id {
        project.on_chain_id = Some(on_chain_id);
    }
    if let Some(tx_id) = update.tx_id {
        project.tx_id = Some(tx_id);
    }
    if let Some(status) = update.status {
        project.status = status;
    }
    if let Some(change) = update.milestone {
        let milestone = &mut project.milestones[change.number.index()];
        if let Some(funded) = change.funded {
            milestone.funded = funded;
        }
        if let Some(complete) = change.complete {
            milestone.complete = complete;
        }
        if let Some(released) = change.released {
            milestone.released = released;
        }
        if let Some(description) = change.completion_description {
            milestone.completion_description = Some(description);
        }
        if let Some(attachment) = change.completion_attachment {
            milestone.completion_attachment = Some(attachment);
        }
    }
    project.updated_at = now;
}

#[async_trait]
impl EscrowStorage for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        debug!("In-memory storage ready");
        Ok(())
    }

    async fn get_user(&self, id: i32) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, input: UserCreateInput) -> StorageResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == input.username) {
            return Err(StorageError::DuplicateUsername(input.username));
        }

        let id = next_id(&mut tables.next_user_id);
        let user = User {
            id,
            username: input.username,
            wallet_address: input.wallet_address,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        debug!("Created user '{}' with ID {}", user.username, id);
        Ok(user)
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn list_escrows(&self, filter: &EscrowFilter) -> StorageResult<Vec<Escrow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .escrows
            .values()
            .filter(|e| filter.matches(&e.client_address, &e.freelancer_address, &e.status))
            .cloned()
            .collect())
    }

    async fn get_escrow(&self, id: i32) -> StorageResult<Option<Escrow>> {
        let tables = self.tables.read().await;
        Ok(tables.escrows.get(&id).cloned())
    }

    async fn create_escrow(&self, input: EscrowCreateInput) -> StorageResult<Escrow> {
        let mut tables = self.tables.write().await;
        tables.check_category(input.category_id)?;
        let id = next_id(&mut tables.next_escrow_id);
        let now = Utc::now();

        let escrow = Escrow {
            id,
            status: input.initial_status(),
            funded: input.on_chain_id.is_some(),
            client_address: input.client_address,
            freelancer_address: input.freelancer_address,
            amount: input.amount,
            token_type: input.token_type,
            on_chain_id: input.on_chain_id,
            tx_id: input.tx_id,
            completed: false,
            released: false,
            description: input.description,
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        };
        tables.escrows.insert(id, escrow.clone());
        debug!("Created escrow with ID {}", id);
        Ok(escrow)
    }

    async fn update_escrow(&self, id: i32, update: EscrowUpdate) -> StorageResult<Escrow> {
        let mut tables = self.tables.write().await;
        let escrow = tables.escrows.get_mut(&id).ok_or(StorageError::NotFound)?;
        apply_escrow_update(escrow, update, Utc::now());
        Ok(escrow.clone())
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> StorageResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .values()
            .filter(|p| filter.matches(&p.client_address, &p.freelancer_address, &p.status))
            .cloned()
            .collect())
    }

    async fn get_project(&self, id: i32) -> StorageResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.get(&id).cloned())
    }

    async fn create_project(&self, input: ProjectCreateInput) -> StorageResult<Project> {
        let milestones = input.milestone_records().ok_or_else(|| {
            StorageError::InvalidData(format!(
                "Project requires four milestones, got {}",
                input.milestones.len()
            ))
        })?;

        let mut tables = self.tables.write().await;
        tables.check_category(input.category_id)?;
        let id = next_id(&mut tables.next_project_id);
        let now = Utc::now();

        let project = Project {
            id,
            title: input.title,
            description: input.description,
            client_address: input.client_address,
            freelancer_address: input.freelancer_address,
            total_amount: input.total_amount,
            token_type: input.token_type,
            status: ProjectStatus::Pending,
            on_chain_id: None,
            tx_id: None,
            category_id: input.category_id,
            milestones,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(id, project.clone());
        debug!("Created project '{}' with ID {}", project.title, id);
        Ok(project)
    }

    async fn update_project(&self, id: i32, update: ProjectUpdate) -> StorageResult<Project> {
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or(StorageError::NotFound)?;
        apply_project_update(project, update, Utc::now());
        Ok(project.clone())
    }

    async fn get_storage_info(&self) -> StorageResult<StorageInfo> {
        let tables = self.tables.read().await;
        Ok(StorageInfo {
            provider: "memory".to_string(),
            total_users: tables.users.len(),
            total_escrows: tables.escrows.len(),
            total_projects: tables.projects.len(),
        })
    }
}
