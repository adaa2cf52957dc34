// ABOUTME: PostgreSQL backend tests against a disposable database
// ABOUTME: Enabled with the postgres-tests feature; sqlx::test provisions one database per test

#![cfg(feature = "postgres-tests")]

use escrowdesk_core::{
    EscrowCreateInput, EscrowFilter, EscrowStatus, EscrowUpdate, MilestoneInput,
    MilestoneNumber, MilestoneUpdate, ProjectCreateInput, ProjectFilter, ProjectStatus,
    ProjectUpdate, TokenType, UserCreateInput, DEFAULT_CATEGORIES,
};
use escrowdesk_storage::{EscrowStorage, EscrowStorageExt, PostgresStorage, StorageError};
use sqlx::PgPool;

async fn storage(pool: PgPool) -> PostgresStorage {
    let storage = PostgresStorage::from_pool(pool);
    storage.initialize().await.unwrap();
    storage
}

fn escrow_input(client: &str) -> EscrowCreateInput {
    EscrowCreateInput {
        client_address: client.to_string(),
        freelancer_address: "SP2FREELANCER".to_string(),
        amount: 12_000,
        token_type: TokenType::Sbtc,
        on_chain_id: Some(3),
        tx_id: Some("0xfeed".to_string()),
        description: None,
        category_id: Some(1),
    }
}

fn project_input() -> ProjectCreateInput {
    ProjectCreateInput {
        title: "Indexer".to_string(),
        description: Some("Chain indexer".to_string()),
        client_address: "SP1CLIENT".to_string(),
        freelancer_address: "SP2FREELANCER".to_string(),
        total_amount: 1_000,
        token_type: TokenType::Stx,
        category_id: None,
        milestones: [100, 200, 300, 400]
            .into_iter()
            .enumerate()
            .map(|(i, amount)| MilestoneInput {
                amount,
                title: format!("Step {}", i + 1),
                description: None,
                attachment: Some(format!("ipfs://step-{}", i + 1)),
            })
            .collect(),
    }
}

#[sqlx::test]
async fn test_initialize_seeds_categories_once(pool: PgPool) {
    let storage = storage(pool).await;
    storage.initialize().await.unwrap();

    let categories = storage.list_categories().await.unwrap();
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
}

#[sqlx::test]
async fn test_escrow_round_trip(pool: PgPool) {
    let storage = storage(pool).await;

    let created = storage.create_escrow(escrow_input("SP1CLIENT")).await.unwrap();
    assert_eq!(created.status, EscrowStatus::Locked);
    assert!(created.funded);
    assert_eq!(created.token_type, TokenType::Sbtc);

    let update = EscrowUpdate {
        released: Some(true),
        status: Some(EscrowStatus::Released),
        ..Default::default()
    };
    let released = storage.update_escrow(created.id, update).await.unwrap();
    assert!(released.released);
    assert!(!released.completed);
    assert_eq!(released.tx_id.as_deref(), Some("0xfeed"));

    let fetched = storage.require_escrow(created.id).await.unwrap();
    assert_eq!(fetched, released);
}

#[sqlx::test]
async fn test_list_escrows_filter(pool: PgPool) {
    let storage = storage(pool).await;
    storage.create_escrow(escrow_input("SP1CLIENT")).await.unwrap();
    storage.create_escrow(escrow_input("SP7CLIENT")).await.unwrap();

    let filter = EscrowFilter {
        address: Some("SP7CLIENT".to_string()),
        status: Some(EscrowStatus::Locked),
    };
    let escrows = storage.list_escrows(&filter).await.unwrap();
    assert_eq!(escrows.len(), 1);
    assert_eq!(escrows[0].client_address, "SP7CLIENT");
}

#[sqlx::test]
async fn test_project_milestone_columns(pool: PgPool) {
    let storage = storage(pool).await;
    let project = storage.create_project(project_input()).await.unwrap();

    assert_eq!(project.status, ProjectStatus::Pending);
    assert_eq!(project.milestones[2].amount, 300);
    assert_eq!(
        project.milestones[3].attachment.as_deref(),
        Some("ipfs://step-4")
    );

    let number = MilestoneNumber::try_from(3).unwrap();
    let mut change = MilestoneUpdate::new(number);
    change.funded = Some(true);
    let update = ProjectUpdate {
        on_chain_id: Some(11),
        status: Some(ProjectStatus::Active),
        milestone: Some(change),
        ..Default::default()
    };
    let updated = storage.update_project(project.id, update).await.unwrap();

    assert_eq!(updated.on_chain_id, Some(11));
    assert_eq!(updated.status, ProjectStatus::Active);
    assert!(updated.milestone(number).funded);
    assert!(!updated.milestones[0].funded);

    let active = storage
        .list_projects(&ProjectFilter {
            address: None,
            status: Some(ProjectStatus::Active),
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}

#[sqlx::test]
async fn test_update_missing_project(pool: PgPool) {
    let storage = storage(pool).await;
    let result = storage.update_project(999, ProjectUpdate::default()).await;
    assert!(matches!(result, Err(StorageError::NotFound)));
}

#[sqlx::test]
async fn test_duplicate_username(pool: PgPool) {
    let storage = storage(pool).await;
    let input = UserCreateInput {
        username: "bob".to_string(),
        wallet_address: None,
    };

    let user = storage.create_user(input.clone()).await.unwrap();
    assert_eq!(
        storage.get_user_by_username("bob").await.unwrap(),
        Some(user)
    );

    let duplicate = storage.create_user(input).await;
    assert!(matches!(duplicate, Err(StorageError::DuplicateUsername(_))));

    let info = storage.get_storage_info().await.unwrap();
    assert_eq!(info.provider, "postgres");
    assert_eq!(info.total_users, 1);
}

#[sqlx::test]
async fn test_unknown_category_is_invalid_reference(pool: PgPool) {
    let storage = storage(pool).await;

    let mut escrow = escrow_input("SP1CLIENT");
    escrow.category_id = Some(999);
    let result = storage.create_escrow(escrow).await;
    assert!(matches!(result, Err(StorageError::InvalidReference(_))));

    let mut project = project_input();
    project.category_id = Some(999);
    let result = storage.create_project(project).await;
    assert!(matches!(result, Err(StorageError::InvalidReference(_))));
}
