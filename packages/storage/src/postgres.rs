// ABOUTME: PostgreSQL storage backend selected when DATABASE_URL is set
// ABOUTME: Milestones are persisted as flat milestoneN_* columns on the projects table

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::time::Duration;
use tracing::{debug, info};

use escrowdesk_core::{
    Category, Escrow, EscrowCreateInput, EscrowFilter, EscrowUpdate, Milestone, MilestoneNumber,
    Project, ProjectCreateInput, ProjectFilter, ProjectStatus, ProjectUpdate, User,
    UserCreateInput, DEFAULT_CATEGORIES, MILESTONE_COUNT,
};

use super::{EscrowStorage, StorageConfig, StorageError, StorageInfo, StorageResult};

/// Milestone columns supplied at creation time, in insert order
const MILESTONE_INSERT_FIELDS: [&str; 4] = ["amount", "title", "description", "attachment"];

/// PostgreSQL implementation of EscrowStorage
pub struct PostgresStorage {
    pool: PgPool,
}

fn milestone_column(number: MilestoneNumber, field: &str) -> String {
    format!("milestone{}_{}", number, field)
}

/// Appends the shared WHERE/ORDER BY clause of list queries
fn push_record_filter<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    address: Option<&str>,
    status: Option<&'static str>,
) {
    qb.push(" WHERE TRUE");
    if let Some(address) = address {
        qb.push(" AND (client_address = ")
            .push_bind(address.to_string())
            .push(" OR freelancer_address = ")
            .push_bind(address.to_string())
            .push(")");
    }
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
    qb.push(" ORDER BY id ASC");
}

/// An unknown `category_id` surfaces as a foreign-key violation
fn map_category_error(err: sqlx::Error, category_id: Option<i32>) -> StorageError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StorageError::InvalidReference(match category_id {
                Some(id) => format!("category {} does not exist", id),
                None => db_err.message().to_string(),
            })
        }
        other => StorageError::Sqlx(other),
    }
}

impl PostgresStorage {
    /// Connect a pool to `url` using the pool limits from `config`
    pub async fn new(url: &str, config: &StorageConfig) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(url)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by the test harness)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_user(row: &PgRow) -> StorageResult<User> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            wallet_address: row.try_get("wallet_address")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_category(row: &PgRow) -> StorageResult<Category> {
        Ok(Category {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_escrow(row: &PgRow) -> StorageResult<Escrow> {
        let token_type: String = row.try_get("token_type")?;
        let status: String = row.try_get("status")?;

        Ok(Escrow {
            id: row.try_get("id")?,
            client_address: row.try_get("client_address")?,
            freelancer_address: row.try_get("freelancer_address")?,
            amount: row.try_get("amount")?,
            token_type: token_type.parse()?,
            on_chain_id: row.try_get("on_chain_id")?,
            tx_id: row.try_get("tx_id")?,
            status: status.parse()?,
            funded: row.try_get("funded")?,
            completed: row.try_get("completed")?,
            released: row.try_get("released")?,
            description: row.try_get("description")?,
            category_id: row.try_get("category_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_milestone(row: &PgRow, number: MilestoneNumber) -> StorageResult<Milestone> {
        let column = |field: &str| milestone_column(number, field);

        Ok(Milestone {
            amount: row.try_get(column("amount").as_str())?,
            title: row.try_get(column("title").as_str())?,
            description: row.try_get(column("description").as_str())?,
            attachment: row.try_get(column("attachment").as_str())?,
            funded: row.try_get(column("funded").as_str())?,
            complete: row.try_get(column("complete").as_str())?,
            released: row.try_get(column("released").as_str())?,
            completion_description: row.try_get(column("completion_description").as_str())?,
            completion_attachment: row.try_get(column("completion_attachment").as_str())?,
        })
    }

    fn row_to_project(row: &PgRow) -> StorageResult<Project> {
        let token_type: String = row.try_get("token_type")?;
        let status: String = row.try_get("status")?;

        let milestones: [Milestone; MILESTONE_COUNT] = MilestoneNumber::all()
            .map(|number| Self::row_to_milestone(row, number))
            .collect::<StorageResult<Vec<_>>>()?
            .try_into()
            .map_err(|_| StorageError::InvalidData("Project row is missing milestones".into()))?;

        Ok(Project {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            client_address: row.try_get("client_address")?,
            freelancer_address: row.try_get("freelancer_address")?,
            total_amount: row.try_get("total_amount")?,
            token_type: token_type.parse()?,
            status: status.parse()?,
            on_chain_id: row.try_get("on_chain_id")?,
            tx_id: row.try_get("tx_id")?,
            category_id: row.try_get("category_id")?,
            milestones,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn count(&self, table: &'static str) -> StorageResult<usize> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl EscrowStorage for PostgresStorage {
    async fn initialize(&self) -> StorageResult<()> {
        info!("Initializing PostgreSQL storage with migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;

        for (name, description) in DEFAULT_CATEGORIES {
            sqlx::query(
                "INSERT INTO categories (name, description) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(*name)
            .bind(*description)
            .execute(&self.pool)
            .await?;
        }

        info!("PostgreSQL storage initialized successfully");
        Ok(())
    }

    async fn get_user(&self, id: i32) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn create_user(&self, input: UserCreateInput) -> StorageResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, wallet_address) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.username)
        .bind(&input.wallet_address)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Self::row_to_user(&row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StorageError::DuplicateUsername(input.username))
            }
            Err(e) => Err(StorageError::Sqlx(e)),
        }
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_category).collect()
    }

    async fn list_escrows(&self, filter: &EscrowFilter) -> StorageResult<Vec<Escrow>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM escrows");
        push_record_filter(
            &mut qb,
            filter.address.as_deref(),
            filter.status.map(|s| s.as_str()),
        );

        let rows = qb.build().fetch_all(&self.pool).await?;
        let escrows = rows
            .iter()
            .map(Self::row_to_escrow)
            .collect::<StorageResult<Vec<_>>>()?;

        debug!("Retrieved {} escrows", escrows.len());
        Ok(escrows)
    }

    async fn get_escrow(&self, id: i32) -> StorageResult<Option<Escrow>> {
        let row = sqlx::query("SELECT * FROM escrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_escrow).transpose()
    }

    async fn create_escrow(&self, input: EscrowCreateInput) -> StorageResult<Escrow> {
        let row = sqlx::query(
            r#"
            INSERT INTO escrows (
                client_address, freelancer_address, amount, token_type, on_chain_id,
                tx_id, status, funded, description, category_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&input.client_address)
        .bind(&input.freelancer_address)
        .bind(input.amount)
        .bind(input.token_type.as_str())
        .bind(input.on_chain_id)
        .bind(&input.tx_id)
        .bind(input.initial_status().as_str())
        .bind(input.on_chain_id.is_some())
        .bind(&input.description)
        .bind(input.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_category_error(e, input.category_id))?;

        let escrow = Self::row_to_escrow(&row)?;
        debug!("Created escrow with ID {}", escrow.id);
        Ok(escrow)
    }

    async fn update_escrow(&self, id: i32, update: EscrowUpdate) -> StorageResult<Escrow> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE escrows SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(on_chain_id) = update.on_chain_id {
            qb.push(", on_chain_id = ").push_bind(on_chain_id);
        }
        if let Some(tx_id) = update.tx_id {
            qb.push(", tx_id = ").push_bind(tx_id);
        }
        if let Some(status) = update.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(funded) = update.funded {
            qb.push(", funded = ").push_bind(funded);
        }
        if let Some(completed) = update.completed {
            qb.push(", completed = ").push_bind(completed);
        }
        if let Some(released) = update.released {
            qb.push(", released = ").push_bind(released);
        }

        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Self::row_to_escrow(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> StorageResult<Vec<Project>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM projects");
        push_record_filter(
            &mut qb,
            filter.address.as_deref(),
            filter.status.map(|s| s.as_str()),
        );

        let rows = qb.build().fetch_all(&self.pool).await?;
        let projects = rows
            .iter()
            .map(Self::row_to_project)
            .collect::<StorageResult<Vec<_>>>()?;

        debug!("Retrieved {} projects", projects.len());
        Ok(projects)
    }

    async fn get_project(&self, id: i32) -> StorageResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_project).transpose()
    }

    async fn create_project(&self, input: ProjectCreateInput) -> StorageResult<Project> {
        let milestones = input.milestone_records().ok_or_else(|| {
            StorageError::InvalidData(format!(
                "Project requires four milestones, got {}",
                input.milestones.len()
            ))
        })?;

        let category_id = input.category_id;
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO projects (title, description, client_address, freelancer_address, \
             total_amount, token_type, status, category_id",
        );
        for number in MilestoneNumber::all() {
            for field in MILESTONE_INSERT_FIELDS {
                qb.push(", ").push(milestone_column(number, field));
            }
        }
        qb.push(") VALUES (");

        {
            let mut values = qb.separated(", ");
            values.push_bind(input.title);
            values.push_bind(input.description);
            values.push_bind(input.client_address);
            values.push_bind(input.freelancer_address);
            values.push_bind(input.total_amount);
            values.push_bind(input.token_type.as_str());
            values.push_bind(ProjectStatus::Pending.as_str());
            values.push_bind(input.category_id);
            for milestone in milestones {
                values.push_bind(milestone.amount);
                values.push_bind(milestone.title);
                values.push_bind(milestone.description);
                values.push_bind(milestone.attachment);
            }
        }
        qb.push(") RETURNING *");

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_category_error(e, category_id))?;
        let project = Self::row_to_project(&row)?;
        debug!("Created project '{}' with ID {}", project.title, project.id);
        Ok(project)
    }

    async fn update_project(&self, id: i32, update: ProjectUpdate) -> StorageResult<Project> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE projects SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(on_chain_id) = update.on_chain_id {
            qb.push(", on_chain_id = ").push_bind(on_chain_id);
        }
        if let Some(tx_id) = update.tx_id {
            qb.push(", tx_id = ").push_bind(tx_id);
        }
        if let Some(status) = update.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(change) = update.milestone {
            let number = change.number;
            if let Some(funded) = change.funded {
                qb.push(format!(", {} = ", milestone_column(number, "funded")))
                    .push_bind(funded);
            }
            if let Some(complete) = change.complete {
                qb.push(format!(", {} = ", milestone_column(number, "complete")))
                    .push_bind(complete);
            }
            if let Some(released) = change.released {
                qb.push(format!(", {} = ", milestone_column(number, "released")))
                    .push_bind(released);
            }
            if let Some(description) = change.completion_description {
                qb.push(format!(
                    ", {} = ",
                    milestone_column(number, "completion_description")
                ))
                .push_bind(description);
            }
            if let Some(attachment) = change.completion_attachment {
                qb.push(format!(
                    ", {} = ",
                    milestone_column(number, "completion_attachment")
                ))
                .push_bind(attachment);
            }
        }

        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Self::row_to_project(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn get_storage_info(&self) -> StorageResult<StorageInfo> {
        Ok(StorageInfo {
            provider: "postgres".to_string(),
            total_users: self.count("users").await?,
            total_escrows: self.count("escrows").await?,
            total_projects: self.count("projects").await?,
        })
    }
}
