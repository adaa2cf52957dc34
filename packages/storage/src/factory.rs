use std::sync::Arc;
use tracing::{debug, info};

use super::{EscrowStorage, MemoryStorage, PostgresStorage, StorageResult};

/// Which backend to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    Memory,
    Postgres { url: String },
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Memory,
            max_connections: 10,
            acquire_timeout_seconds: 30,
        }
    }
}

impl StorageConfig {
    /// PostgreSQL when a non-empty database URL is given, in-memory otherwise
    pub fn from_database_url(url: Option<&str>) -> Self {
        let provider = match url.map(str::trim) {
            Some(url) if !url.is_empty() => StorageProvider::Postgres {
                url: url.to_string(),
            },
            _ => StorageProvider::Memory,
        };

        Self {
            provider,
            ..Self::default()
        }
    }

    /// Short provider name that is safe to log (never includes credentials)
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            StorageProvider::Memory => "memory",
            StorageProvider::Postgres { .. } => "postgres",
        }
    }
}

/// Factory for creating storage instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create and initialize a storage instance from configuration
    pub async fn create_storage(config: StorageConfig) -> StorageResult<Arc<dyn EscrowStorage>> {
        debug!("Creating storage with provider: {}", config.provider_name());

        let storage: Arc<dyn EscrowStorage> = match &config.provider {
            StorageProvider::Memory => {
                info!("Using in-memory storage; data will not survive a restart");
                Arc::new(MemoryStorage::new())
            }
            StorageProvider::Postgres { url } => {
                info!("Initializing PostgreSQL storage");
                Arc::new(PostgresStorage::new(url, &config).await?)
            }
        };

        storage.initialize().await?;
        Ok(storage)
    }

    /// Create an in-memory storage, mostly for tests
    pub async fn create_memory_storage() -> StorageResult<Arc<dyn EscrowStorage>> {
        Self::create_storage(StorageConfig::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrowdesk_core::EscrowFilter;

    #[test]
    fn test_config_selects_provider_from_url() {
        assert_eq!(
            StorageConfig::from_database_url(None).provider,
            StorageProvider::Memory
        );
        assert_eq!(
            StorageConfig::from_database_url(Some("  ")).provider,
            StorageProvider::Memory
        );

        let config = StorageConfig::from_database_url(Some("postgres://user:pw@localhost/escrow"));
        assert_eq!(
            config.provider,
            StorageProvider::Postgres {
                url: "postgres://user:pw@localhost/escrow".to_string()
            }
        );
        assert_eq!(config.provider_name(), "postgres");
    }

    #[tokio::test]
    async fn test_factory_create_memory_storage() {
        let storage = StorageFactory::create_memory_storage().await.unwrap();

        let escrows = storage.list_escrows(&EscrowFilter::default()).await.unwrap();
        assert_eq!(escrows.len(), 0);

        let info = storage.get_storage_info().await.unwrap();
        assert_eq!(info.provider, "memory");
    }
}
