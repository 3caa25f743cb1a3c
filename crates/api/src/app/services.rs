//! Infrastructure wiring: product store, user directory, asset manager.

use std::sync::Arc;

use thiserror::Error;

use bazaar_auth::UserDirectory;
use bazaar_infra::{
    AppConfig, CatalogService, ImageAssetManager, InMemoryProductStore, InMemoryUserDirectory,
    ProductStore,
};

pub type DynCatalogService = CatalogService<Arc<dyn ProductStore>, Arc<dyn UserDirectory>>;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("database connection failed: {0}")]
    Connect(String),

    #[error("schema setup failed: {0}")]
    Schema(String),

    #[error("seeding accounts failed: {0}")]
    Seed(String),
}

/// Shared handles used by the HTTP handlers.
pub struct AppServices {
    pub catalog: DynCatalogService,
    /// Same directory the catalog authorizes against; used for account bootstrap.
    pub users: Arc<dyn UserDirectory>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn ProductStore>,
        users: Arc<dyn UserDirectory>,
        config: &AppConfig,
    ) -> Self {
        let assets = ImageAssetManager::new(config.asset_config());
        Self {
            catalog: CatalogService::new(store, users.clone(), assets),
            users,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryUserDirectory::new()),
            config,
        )
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, ServicesError> {
    let services = select_services(config).await?;
    seed_accounts(&services, config).await?;
    Ok(services)
}

async fn select_services(config: &AppConfig) -> Result<AppServices, ServicesError> {
    if config.use_persistent_stores {
        #[cfg(feature = "postgres")]
        {
            return build_persistent_services(config).await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
            return Ok(AppServices::in_memory(config));
        }
    }

    Ok(AppServices::in_memory(config))
}

/// Register the configured seller accounts. Existing accounts are replaced.
async fn seed_accounts(services: &AppServices, config: &AppConfig) -> Result<(), ServicesError> {
    for account in &config.seed_sellers {
        services
            .users
            .register(account.clone())
            .await
            .map_err(|e| ServicesError::Seed(e.to_string()))?;
        tracing::info!(user_id = %account.id, display_name = %account.display_name, "seeded seller account");
    }
    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(config: &AppConfig) -> Result<AppServices, ServicesError> {
    use bazaar_infra::product_store::PostgresProductStore;
    use bazaar_infra::users::PostgresUserDirectory;

    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| ServicesError::Connect("DATABASE_URL is not set".to_string()))?;

    let pool = sqlx::PgPool::connect(database_url)
        .await
        .map_err(|e| ServicesError::Connect(e.to_string()))?;

    let store = PostgresProductStore::new(pool.clone());
    store
        .ensure_schema()
        .await
        .map_err(|e| ServicesError::Schema(e.to_string()))?;

    let users = PostgresUserDirectory::new(pool);
    users
        .ensure_schema()
        .await
        .map_err(|e| ServicesError::Schema(e.to_string()))?;

    tracing::info!("using postgres product store and user directory");
    Ok(AppServices::new(Arc::new(store), Arc::new(users), config))
}
