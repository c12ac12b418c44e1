//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings,
//! product catalog, clock) and the SQLite sync database into the sync and
//! search crates. Every operation reads the host options first, so a new API
//! key or active store applies to the very next call.
//!
//! Native hosts typically enable the `desktop-shims` feature so
//! [`CoreConfig`] can fall back to the `bridge-desktop` adapters.

pub mod error;
pub mod provider;
pub mod status;

pub use error::{CoreError, Result};
pub use provider::{GeminiProviderFactory, ProviderFactory};
pub use status::{LastBulkSync, LocalDocument, ProductSyncStatus, StoreOverview, StoreSummary};

use std::collections::HashSet;
use std::sync::Arc;

use bridge_traits::{
    catalog::{ProductCatalog, ProductId},
    document_id::DocumentId,
    search::{FileSearchProvider, RemoteStore},
    storage::SettingsStore,
    time::Clock,
};
use core_runtime::config::{CoreConfig, SyncTuning};
use core_runtime::settings::{BulkSyncStamp, RuntimeSettings};
use core_search::{AiSearchResponse, SearchResponse, SearchService};
use core_sync::{
    db::{create_pool, DatabaseConfig},
    BulkSyncReport, OrphanCleanupReport, OrphanReconciler, ProductSyncStateRepository,
    SqliteProductSyncStateRepository, SqliteSyncLogRepository, SyncCoordinator, SyncLogRepository,
    SyncRecord, SyncRun,
};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

/// Log rows returned by [`CoreService::recent_sync_logs`] without a limit
pub const DEFAULT_LOG_LIMIT: u32 = 50;

/// Failures spelled out when a bulk sync finishes with errors
pub const REPORTED_ERROR_LIMIT: usize = 5;

/// Display name of a store created for a shop
pub fn default_store_display_name(site_name: &str) -> String {
    format!("WooCommerce Products - {}", site_name)
}

/// Aggregated handle to all dependencies the core requires.
pub struct CoreDependencies {
    pub settings_store: Arc<dyn SettingsStore>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub clock: Arc<dyn Clock>,
    pub providers: Arc<dyn ProviderFactory>,
    pub pool: SqlitePool,
    pub tuning: SyncTuning,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(
        settings_store: Arc<dyn SettingsStore>,
        catalog: Arc<dyn ProductCatalog>,
        clock: Arc<dyn Clock>,
        providers: Arc<dyn ProviderFactory>,
        pool: SqlitePool,
        tuning: SyncTuning,
    ) -> Self {
        Self {
            settings_store,
            catalog,
            clock,
            providers,
            pool,
            tuning,
        }
    }

    /// Take bridges and tuning from a validated [`CoreConfig`]
    pub fn from_config(
        config: &CoreConfig,
        catalog: Arc<dyn ProductCatalog>,
        pool: SqlitePool,
    ) -> Self {
        let providers = GeminiProviderFactory::new(
            Arc::clone(&config.http_client),
            config.gemini.clone(),
        );

        Self::new(
            Arc::clone(&config.settings_store),
            catalog,
            Arc::clone(&config.clock),
            Arc::new(providers),
            pool,
            config.sync.clone(),
        )
    }
}

/// Open the sync database and build the service
///
/// ```ignore
/// use core_runtime::config::CoreConfig;
///
/// let config = CoreConfig::builder()
///     .database_path("/var/lib/file-search/sync.db")
///     .build()?;
/// let core = core_service::bootstrap(config, catalog).await?;
/// let report = core.bulk_sync().await?;
/// ```
pub async fn bootstrap(config: CoreConfig, catalog: Arc<dyn ProductCatalog>) -> Result<CoreService> {
    let pool = create_pool(DatabaseConfig::new(config.database_path.clone()))
        .await
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;

    info!(database = %config.database_path.display(), "Core service ready");
    Ok(CoreService::new(CoreDependencies::from_config(
        &config, catalog, pool,
    )))
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    log: Arc<dyn SyncLogRepository>,
    state: Arc<dyn ProductSyncStateRepository>,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    pub fn new(deps: CoreDependencies) -> Self {
        let log: Arc<dyn SyncLogRepository> =
            Arc::new(SqliteSyncLogRepository::new(deps.pool.clone()));
        let state: Arc<dyn ProductSyncStateRepository> =
            Arc::new(SqliteProductSyncStateRepository::new(deps.pool.clone()));

        Self {
            deps: Arc::new(deps),
            log,
            state,
        }
    }

    /// Access the dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    async fn settings(&self) -> Result<RuntimeSettings> {
        Ok(RuntimeSettings::load(self.deps.settings_store.as_ref()).await?)
    }

    fn provider(&self, settings: &RuntimeSettings) -> Result<Arc<dyn FileSearchProvider>> {
        self.deps.providers.connect(settings)
    }

    fn coordinator(&self, settings: &RuntimeSettings) -> Result<SyncCoordinator> {
        Ok(SyncCoordinator::new(
            self.provider(settings)?,
            Arc::clone(&self.deps.catalog),
            Arc::clone(&self.log),
            Arc::clone(&self.state),
            Arc::clone(&self.deps.clock),
            self.deps.tuning.clone(),
        )
        .with_store(settings.store_id.clone()))
    }

    fn search_service(&self, settings: &RuntimeSettings) -> Result<SearchService> {
        Ok(
            SearchService::new(self.provider(settings)?, Arc::clone(&self.deps.catalog))
                .with_store(settings.store_id.clone()),
        )
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Sync one product in a run of its own
    pub async fn sync(&self, product_id: ProductId) -> Result<DocumentId> {
        self.sync_in_run(&SyncRun::new(), product_id).await
    }

    /// Start a run that several triggers of one request can share
    pub fn begin_run(&self) -> SyncRun {
        SyncRun::new()
    }

    /// Sync one product, at most once per `run`
    pub async fn sync_in_run(&self, run: &SyncRun, product_id: ProductId) -> Result<DocumentId> {
        let settings = self.settings().await?;
        Ok(self.coordinator(&settings)?.sync(run, product_id).await?)
    }

    /// Save hook: syncs only when automatic sync is enabled
    ///
    /// Hosts pass the run of the current request so repeated save triggers
    /// for one product write to the remote store at most once.
    #[instrument(skip_all, fields(product_id = %product_id, run_id = %run.id()))]
    pub async fn on_product_saved(
        &self,
        run: &SyncRun,
        product_id: ProductId,
    ) -> Result<Option<DocumentId>> {
        let settings = self.settings().await?;
        if !settings.sync_on_save {
            debug!("Automatic sync disabled");
            return Ok(None);
        }

        let document_id = self
            .coordinator(&settings)?
            .sync(run, product_id)
            .await?;
        Ok(Some(document_id))
    }

    /// Delete hook: removes the product's remote document, if any
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn on_product_deleted(&self, product_id: ProductId) -> Result<Option<DocumentId>> {
        if self.state.get(product_id).await?.is_none() {
            debug!("Product was never synced");
            return Ok(None);
        }

        let settings = self.settings().await?;
        Ok(self.coordinator(&settings)?.delete_product(product_id).await?)
    }

    /// Delete one remote document by id
    ///
    /// When `product_id` is given its log rows and sync state go too.
    #[instrument(skip(self))]
    pub async fn delete_document(
        &self,
        document_id: &str,
        product_id: Option<ProductId>,
    ) -> Result<DocumentId> {
        let document_id = document_id.trim();
        if document_id.is_empty() {
            return Err(CoreError::InvalidInput("Document ID is required".to_string()));
        }

        let settings = self.settings().await?;
        Ok(self
            .coordinator(&settings)?
            .remove_document(&DocumentId::parse(document_id), product_id)
            .await?)
    }

    /// Sync every published product and persist the report
    #[instrument(skip(self))]
    pub async fn bulk_sync(&self) -> Result<BulkSyncReport> {
        let settings = self.settings().await?;
        let report = self
            .coordinator(&settings)?
            .bulk_sync(&SyncRun::new())
            .await?;

        if report.failed > 0 {
            warn!(
                failed = report.failed,
                first_errors = ?report.error_summary(REPORTED_ERROR_LIMIT),
                "Bulk sync finished with failures"
            );
        }

        let stamp = BulkSyncStamp {
            completed_at: self.deps.clock.unix_timestamp(),
            report: serde_json::to_string(&report)?,
        };
        stamp.save(self.deps.settings_store.as_ref()).await?;

        Ok(report)
    }

    /// Completion time and report of the last bulk sync
    pub async fn last_bulk_sync(&self) -> Result<Option<LastBulkSync>> {
        let Some(stamp) = BulkSyncStamp::load(self.deps.settings_store.as_ref()).await? else {
            return Ok(None);
        };

        let report = match serde_json::from_str(&stamp.report) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Stored bulk sync report is unreadable");
                None
            }
        };

        Ok(Some(LastBulkSync {
            completed_at: stamp.completed_at,
            report,
        }))
    }

    /// Drop log rows whose document is gone from the active store
    pub async fn clean_orphans(&self) -> Result<OrphanCleanupReport> {
        let settings = self.settings().await?;
        let store_id = settings.require_store_id()?;
        let reconciler = OrphanReconciler::new(
            self.provider(&settings)?,
            Arc::clone(&self.log),
            Arc::clone(&self.state),
        );

        Ok(reconciler.clean_orphans(store_id).await?)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<SearchResponse> {
        let settings = self.settings().await?;
        Ok(self.search_service(&settings)?.search(query, limit).await?)
    }

    pub async fn search_ai(&self, query: &str) -> Result<AiSearchResponse> {
        let settings = self.settings().await?;
        Ok(self.search_service(&settings)?.search_ai(query).await?)
    }

    // ------------------------------------------------------------------
    // Store management
    // ------------------------------------------------------------------

    /// Create a store and make it the active one
    #[instrument(skip(self))]
    pub async fn create_store(&self, display_name: &str) -> Result<RemoteStore> {
        if display_name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "Store display name is required".to_string(),
            ));
        }

        let settings = self.settings().await?;
        let store = self.provider(&settings)?.create_store(display_name).await?;
        RuntimeSettings::set_active_store(self.deps.settings_store.as_ref(), &store.name).await?;

        info!(store_id = %store.name, "Active store changed");
        Ok(store)
    }

    /// Remote stores with their local product counts
    pub async fn list_stores(&self) -> Result<StoreOverview> {
        let settings = self.settings().await?;
        let remote = self.provider(&settings)?.list_stores().await?;

        let mut stores = Vec::with_capacity(remote.len());
        for store in remote {
            let local_products = self.log.count_products_for_store(&store.name).await?;
            let active = settings.store_id.as_deref() == Some(store.name.as_str());
            stores.push(StoreSummary {
                store,
                local_products,
                active,
            });
        }

        Ok(StoreOverview {
            stores,
            active_store: settings.store_id,
        })
    }

    /// Delete a store other than the active one
    #[instrument(skip(self))]
    pub async fn delete_store(&self, store_id: &str) -> Result<()> {
        let store_id = store_id.trim();
        if store_id.is_empty() {
            return Err(CoreError::InvalidInput("Store ID is required".to_string()));
        }

        let settings = self.settings().await?;
        if settings.store_id.as_deref() == Some(store_id) {
            return Err(CoreError::ActiveStore(store_id.to_string()));
        }

        self.provider(&settings)?.delete_store(store_id).await?;
        info!(store_id, "Store deleted");
        Ok(())
    }

    /// Whether the configured API key is accepted
    pub async fn test_connection(&self) -> Result<bool> {
        let settings = self.settings().await?;
        Ok(self.provider(&settings)?.test_connection().await?)
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub async fn product_sync_status(&self, product_id: ProductId) -> Result<ProductSyncStatus> {
        let state = self.state.get(product_id).await?;
        let latest = self.log.latest_for_product(product_id).await?;

        Ok(ProductSyncStatus {
            product_id,
            document_id: state.as_ref().map(|s| s.document_id.clone()),
            last_synced_at: state.map(|s| s.last_synced_at),
            latest,
        })
    }

    /// Newest log rows first, [`DEFAULT_LOG_LIMIT`] when `limit` is `None`
    pub async fn recent_sync_logs(&self, limit: Option<u32>) -> Result<Vec<SyncRecord>> {
        Ok(self
            .log
            .recent(limit.unwrap_or(DEFAULT_LOG_LIMIT))
            .await?)
    }

    /// Documents the log places in `store_id`, newest first
    pub async fn local_documents(&self, store_id: &str) -> Result<Vec<LocalDocument>> {
        let store_id = store_id.trim();
        if store_id.is_empty() {
            return Err(CoreError::InvalidInput("Store ID is required".to_string()));
        }

        let records = self.log.local_documents_for_store(store_id).await?;
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for record in records {
            if !seen.insert((record.product_id, record.document_id.clone())) {
                continue;
            }
            let product_name = self
                .deps
                .catalog
                .get_product(record.product_id)
                .await?
                .map(|p| p.name);

            documents.push(LocalDocument {
                document_id: record.document_id,
                product_id: record.product_id,
                product_name,
                synced_at: record.synced_at,
            });
        }

        Ok(documents)
    }
}
