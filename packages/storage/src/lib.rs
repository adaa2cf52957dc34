// ABOUTME: Persistence layer for escrows, projects, categories and users
// ABOUTME: Defines the storage trait and its in-memory and PostgreSQL backends

use async_trait::async_trait;
use escrowdesk_core::{
    Category, Escrow, EscrowCreateInput, EscrowFilter, EscrowUpdate, ParseEnumError, Project,
    ProjectCreateInput, ProjectFilter, ProjectUpdate, User, UserCreateInput,
};
use serde::Serialize;
use thiserror::Error;

pub mod factory;
pub mod memory;
pub mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageProvider};
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
    #[error("Record not found")]
    NotFound,
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),
}

impl From<ParseEnumError> for StorageError {
    fn from(err: ParseEnumError) -> Self {
        StorageError::InvalidData(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Information about the active backend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub provider: String,
    pub total_users: usize,
    pub total_escrows: usize,
    pub total_projects: usize,
}

/// Main storage trait that all storage implementations must implement.
///
/// Updates are plain field writes with last-write-wins semantics; callers
/// that need ordering between flags have to check it themselves.
#[async_trait]
pub trait EscrowStorage: Send + Sync {
    // Initialization
    async fn initialize(&self) -> StorageResult<()>;

    // Users
    async fn get_user(&self, id: i32) -> StorageResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    async fn create_user(&self, input: UserCreateInput) -> StorageResult<User>;

    // Categories
    async fn list_categories(&self) -> StorageResult<Vec<Category>>;

    // Escrows
    async fn list_escrows(&self, filter: &EscrowFilter) -> StorageResult<Vec<Escrow>>;
    async fn get_escrow(&self, id: i32) -> StorageResult<Option<Escrow>>;
    async fn create_escrow(&self, input: EscrowCreateInput) -> StorageResult<Escrow>;
    async fn update_escrow(&self, id: i32, update: EscrowUpdate) -> StorageResult<Escrow>;

    // Projects
    async fn list_projects(&self, filter: &ProjectFilter) -> StorageResult<Vec<Project>>;
    async fn get_project(&self, id: i32) -> StorageResult<Option<Project>>;
    async fn create_project(&self, input: ProjectCreateInput) -> StorageResult<Project>;
    async fn update_project(&self, id: i32, update: ProjectUpdate) -> StorageResult<Project>;

    // Storage information
    async fn get_storage_info(&self) -> StorageResult<StorageInfo>;
}

/// Wrapper trait that adds convenience methods to EscrowStorage
#[async_trait]
pub trait EscrowStorageExt: EscrowStorage {
    /// Get an escrow or fail with `NotFound`
    async fn require_escrow(&self, id: i32) -> StorageResult<Escrow> {
        self.get_escrow(id).await?.ok_or(StorageError::NotFound)
    }

    /// Get a project or fail with `NotFound`
    async fn require_project(&self, id: i32) -> StorageResult<Project> {
        self.get_project(id).await?.ok_or(StorageError::NotFound)
    }

    /// Check if a username is still free
    async fn username_available(&self, username: &str) -> StorageResult<bool> {
        Ok(self.get_user_by_username(username).await?.is_none())
    }
}

// Blanket implementation for all EscrowStorage types
impl<T: EscrowStorage + ?Sized> EscrowStorageExt for T {}
