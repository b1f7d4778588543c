//! Meme catalog facade.
//!
//! Wires configuration, the store and the catalog services into a single
//! [`MemeCatalog`] handle, and re-exports the public API of the workspace
//! crates so hosts depend on one crate.
//!
//! ```no_run
//! use memebase_workspace::{CatalogConfig, MemeCatalog, MemeFilter, NewMeme, PageSpec, SortSpec};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CatalogConfig::builder().with_env()?.build()?;
//! let catalog = MemeCatalog::connect(&config).await?;
//!
//! let meme = catalog.create(&NewMeme::new("ann", "grumpy cat", "aGk=")).await?;
//! let page = catalog
//!     .list(&MemeFilter::new().artist("ann"), SortSpec::default(), PageSpec::default())
//!     .await?;
//! assert_eq!(page.items[0].id, meme.id);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tracing::info;

pub use core_catalog::{
    CatalogError, FieldErrors, InMemoryStore, ListParams, Meme, MemeFilter, MemePatch,
    MemeQueryService, MemeRepository, Metadata, NewMeme, Page, PageSpec, Result, SortDirection,
    SortField, SortSpec, SqliteStore, StoreMemeRepository,
};
pub use core_runtime::{CatalogConfig, CatalogConfigBuilder, LogFormat, LogLevel, LoggingConfig};
pub use store_traits::{DocumentStore, StoreError, TimeoutPolicy};

use core_catalog::db::{create_pool, DatabaseConfig};

/// Entry point for catalog operations
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct MemeCatalog {
    repository: StoreMemeRepository,
    queries: MemeQueryService,
}

impl MemeCatalog {
    /// Open the SQLite store named by `config`, run migrations and wire the
    /// services with the configured time budgets.
    pub async fn connect(config: &CatalogConfig) -> Result<Self> {
        let db_config = database_config(config);
        let pool = create_pool(db_config).await?;

        info!(database_url = %config.database_url, "Meme catalog connected");
        Ok(Self::with_store(
            Arc::new(SqliteStore::new(pool)),
            config.timeout_policy(),
        ))
    }

    /// Wire the services over an existing store.
    pub fn with_store(store: Arc<dyn DocumentStore>, timeouts: TimeoutPolicy) -> Self {
        Self {
            repository: StoreMemeRepository::new(Arc::clone(&store), timeouts),
            queries: MemeQueryService::new(store, timeouts),
        }
    }

    pub async fn create(&self, meme: &NewMeme) -> Result<Meme> {
        self.repository.create(meme).await
    }

    pub async fn get(&self, id: &str) -> Result<Meme> {
        self.repository.get(id).await
    }

    pub async fn update(&self, id: &str, patch: &MemePatch) -> Result<Meme> {
        self.repository.update(id, patch).await
    }

    /// Write back a full record, guarded by its `version`.
    pub async fn save(&self, meme: &Meme) -> Result<Meme> {
        self.repository.save(meme).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repository.delete(id).await
    }

    pub async fn list(&self, filter: &MemeFilter, sort: SortSpec, page: PageSpec) -> Result<Page<Meme>> {
        self.queries.list(filter, sort, page).await
    }

    /// Validate raw page/sort input, then list. Nothing reaches the store when
    /// validation fails.
    pub async fn list_params(&self, filter: &MemeFilter, params: &ListParams) -> Result<Page<Meme>> {
        self.queries.list_params(filter, params).await
    }

    pub async fn random(&self) -> Result<Meme> {
        self.queries.random().await
    }

    pub fn repository(&self) -> &StoreMemeRepository {
        &self.repository
    }

    pub fn queries(&self) -> &MemeQueryService {
        &self.queries
    }
}

fn database_config(config: &CatalogConfig) -> DatabaseConfig {
    let db_config = DatabaseConfig::from_url(config.database_url.as_str());
    if db_config.is_in_memory() {
        return DatabaseConfig::in_memory().acquire_timeout(config.acquire_timeout);
    }

    db_config
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn in_memory_catalog() -> MemeCatalog {
        MemeCatalog::with_store(Arc::new(InMemoryStore::new()), TimeoutPolicy::default())
    }

    async fn sqlite_catalog() -> MemeCatalog {
        let config = CatalogConfig::builder().build().unwrap();
        MemeCatalog::connect(&config).await.unwrap()
    }

    async fn exercise_lifecycle(catalog: &MemeCatalog) {
        let created = catalog
            .create(&NewMeme::new("ann", "Grumpy Cat", "aGk="))
            .await
            .unwrap();
        assert_eq!(created.version, 1);
        assert_eq!(catalog.get(&created.id).await.unwrap(), created);

        let updated = catalog
            .update(&created.id, &MemePatch::new().title("Happy Cat"))
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.artist, "ann");

        let stale = catalog.save(&created).await.unwrap_err();
        assert!(matches!(stale, CatalogError::EditConflict));

        let page = catalog
            .list(
                &MemeFilter::new().title("cat"),
                SortSpec::default(),
                PageSpec::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.items, vec![updated.clone()]);
        assert_eq!(page.metadata.total_records, 1);

        assert_eq!(catalog.random().await.unwrap(), updated);

        catalog.delete(&created.id).await.unwrap();
        assert!(matches!(
            catalog.get(&created.id).await,
            Err(CatalogError::NotFound)
        ));
        assert!(matches!(catalog.random().await, Err(CatalogError::NotFound)));
    }

    #[tokio::test]
    async fn test_lifecycle_in_memory() {
        exercise_lifecycle(&in_memory_catalog()).await;
    }

    #[tokio::test]
    async fn test_lifecycle_sqlite() {
        exercise_lifecycle(&sqlite_catalog().await).await;
    }

    #[tokio::test]
    async fn test_paging_through_sqlite_is_stable() {
        let catalog = sqlite_catalog().await;
        for i in 0..12 {
            catalog
                .create(&NewMeme::new("bob", format!("meme {:02}", i % 4), "eA=="))
                .await
                .unwrap();
        }

        let mut seen = HashSet::new();
        for page in 1..=3 {
            let params = ListParams::new(page, 5, "-title");
            let result = catalog
                .list_params(&MemeFilter::new().artist("bob"), &params)
                .await
                .unwrap();

            assert_eq!(result.metadata.last_page, 3);
            assert_eq!(result.metadata.total_records, 12);
            for meme in result.items {
                assert!(seen.insert(meme.id), "record repeated across pages");
            }
        }
        assert_eq!(seen.len(), 12);
    }

    #[tokio::test]
    async fn test_list_params_rejects_bad_input() {
        let catalog = in_memory_catalog();

        let err = catalog
            .list_params(&MemeFilter::new(), &ListParams::new(0, 11, "_id"))
            .await
            .unwrap_err();

        let errors = err.field_errors().unwrap();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors["sort"], "invalid sort value");
    }

    #[test]
    fn test_database_config_from_catalog_config() {
        let config = CatalogConfig::builder()
            .database_url("sqlite:memes.db")
            .max_connections(7)
            .acquire_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let db = database_config(&config);
        assert_eq!(db.database_url, "sqlite:memes.db");
        assert_eq!(db.max_connections, 7);
        assert_eq!(db.acquire_timeout, Duration::from_secs(2));

        let memory = database_config(&CatalogConfig::default());
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
    }
}
