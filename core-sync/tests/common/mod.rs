//! Shared fakes for the sync integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::catalog::{Product, ProductCatalog, ProductId, PublishStatus};
use bridge_traits::document_id::{DocumentId, StoreRef};
use bridge_traits::error::{BridgeError, ProviderFailure, Result as BridgeResult, TransportKind};
use bridge_traits::search::{
    DocumentPage, FileSearchProvider, GroundedAnswer, GroundingChunk, RemoteDocument, RemoteStore,
};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_runtime::config::SyncTuning;
use core_sync::db::create_test_pool;
use core_sync::{
    SqliteProductSyncStateRepository, SqliteSyncLogRepository, SyncCoordinator, OrphanReconciler,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const STORE: &str = "fileSearchStores/shop";

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Api,
    Transport,
}

#[derive(Default)]
struct ProviderState {
    documents: BTreeSet<String>,
    next_id: u32,
    creates: usize,
    updates: usize,
    deletes: Vec<String>,
    failures: HashMap<i64, Failure>,
}

/// In-memory File Search store
pub struct FakeProvider {
    state: Mutex<ProviderState>,
    page_size: usize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(ProviderState::default()),
            page_size,
        }
    }

    pub async fn fail_product(&self, product_id: i64, failure: Failure) {
        self.state.lock().await.failures.insert(product_id, failure);
    }

    pub async fn insert_document(&self, document_id: &str) {
        self.state
            .lock()
            .await
            .documents
            .insert(document_id.to_string());
    }

    pub async fn remove_document(&self, document_id: &str) {
        self.state.lock().await.documents.remove(document_id);
    }

    pub async fn documents(&self) -> Vec<String> {
        self.state.lock().await.documents.iter().cloned().collect()
    }

    pub async fn creates(&self) -> usize {
        self.state.lock().await.creates
    }

    pub async fn updates(&self) -> usize {
        self.state.lock().await.updates
    }

    pub async fn deletes(&self) -> Vec<String> {
        self.state.lock().await.deletes.clone()
    }

    fn injected_failure(state: &ProviderState, display_name: &str) -> Option<BridgeError> {
        state
            .failures
            .iter()
            .find(|(id, _)| display_name.ends_with(&format!("(ID: {})", id)))
            .map(|(_, failure)| match failure {
                Failure::Api => BridgeError::Provider(ProviderFailure {
                    status: 400,
                    code: Some(400),
                    status_text: Some("INVALID_ARGUMENT".to_string()),
                    message: "Invalid document".to_string(),
                }),
                Failure::Transport => BridgeError::Transport {
                    kind: TransportKind::Timeout,
                    message: "operation timed out".to_string(),
                },
            })
    }

    fn create_in(state: &mut ProviderState, store_id: &str) -> DocumentId {
        state.next_id += 1;
        let id = format!("{}/documents/doc-{}", store_id, state.next_id);
        state.documents.insert(id.clone());
        DocumentId::parse(id)
    }
}

#[async_trait]
impl FileSearchProvider for FakeProvider {
    async fn create_store(&self, display_name: &str) -> BridgeResult<RemoteStore> {
        Ok(RemoteStore {
            name: STORE.to_string(),
            display_name: Some(display_name.to_string()),
            create_time: None,
        })
    }

    async fn list_stores(&self) -> BridgeResult<Vec<RemoteStore>> {
        Ok(Vec::new())
    }

    async fn delete_store(&self, _store_id: &str) -> BridgeResult<()> {
        Ok(())
    }

    async fn create_document(
        &self,
        store_id: &str,
        display_name: &str,
        _content: &str,
    ) -> BridgeResult<DocumentId> {
        let mut state = self.state.lock().await;
        if let Some(error) = Self::injected_failure(&state, display_name) {
            return Err(error);
        }
        state.creates += 1;
        Ok(Self::create_in(&mut state, store_id))
    }

    async fn update_document(
        &self,
        document_id: &DocumentId,
        display_name: &str,
        _content: &str,
    ) -> BridgeResult<DocumentId> {
        let mut state = self.state.lock().await;
        if let Some(error) = Self::injected_failure(&state, display_name) {
            return Err(error);
        }
        let store_id = match document_id.store() {
            StoreRef::Named(store_id) => store_id,
            _ => STORE.to_string(),
        };
        let normalized = document_id.normalize();
        state.documents.remove(normalized.as_str());
        state.deletes.push(normalized.to_string());
        state.updates += 1;
        Ok(Self::create_in(&mut state, &store_id))
    }

    async fn delete_document(&self, document_id: &DocumentId) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        let normalized = document_id.normalize().to_string();
        state.deletes.push(normalized.clone());
        if state.documents.remove(&normalized) {
            Ok(())
        } else {
            Err(BridgeError::NotFound(normalized))
        }
    }

    async fn list_documents(
        &self,
        store_id: &str,
        page_token: Option<String>,
    ) -> BridgeResult<DocumentPage> {
        let state = self.state.lock().await;
        let prefix = format!("{}/", store_id);
        let all: Vec<&String> = state
            .documents
            .iter()
            .filter(|id| id.starts_with(&prefix))
            .collect();

        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(all.len());

        Ok(DocumentPage {
            documents: all[start..end]
                .iter()
                .map(|id| RemoteDocument {
                    id: DocumentId::parse(id.as_str()),
                    display_name: None,
                })
                .collect(),
            next_page_token: (end < all.len()).then(|| end.to_string()),
        })
    }

    async fn query(
        &self,
        _store_id: &str,
        _query: &str,
        _max_results: usize,
    ) -> BridgeResult<Vec<GroundingChunk>> {
        Ok(Vec::new())
    }

    async fn generate_with_search(
        &self,
        _store_id: &str,
        _prompt: &str,
    ) -> BridgeResult<GroundedAnswer> {
        Ok(GroundedAnswer::default())
    }

    async fn test_connection(&self) -> BridgeResult<bool> {
        Ok(true)
    }
}

/// In-memory product catalog
#[derive(Default)]
pub struct FakeCatalog {
    products: Mutex<BTreeMap<ProductId, Product>>,
    unavailable: AtomicBool,
}

impl FakeCatalog {
    pub async fn add(&self, id: i64, name: &str) {
        let product = Product::new(ProductId::new(id), name);
        self.products.lock().await.insert(product.id, product);
    }

    pub async fn add_draft(&self, id: i64, name: &str) {
        let mut product = Product::new(ProductId::new(id), name);
        product.status = PublishStatus::Draft;
        self.products.lock().await.insert(product.id, product);
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductCatalog for FakeCatalog {
    async fn get_product(&self, id: ProductId) -> BridgeResult<Option<Product>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("catalog offline".to_string()));
        }
        Ok(self.products.lock().await.get(&id).cloned())
    }

    async fn list_published_ids(&self) -> BridgeResult<Vec<ProductId>> {
        Ok(self
            .products
            .lock()
            .await
            .values()
            .filter(|p| p.is_published())
            .map(|p| p.id)
            .collect())
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    pub fn at(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.secs.load(Ordering::SeqCst), 0).unwrap()
    }
}

pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub catalog: Arc<FakeCatalog>,
    pub log: Arc<SqliteSyncLogRepository>,
    pub state: Arc<SqliteProductSyncStateRepository>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_provider(FakeProvider::new()).await
    }

    pub async fn with_provider(provider: FakeProvider) -> Self {
        let pool = create_test_pool().await.unwrap();
        Self {
            provider: Arc::new(provider),
            catalog: Arc::new(FakeCatalog::default()),
            log: Arc::new(SqliteSyncLogRepository::new(pool.clone())),
            state: Arc::new(SqliteProductSyncStateRepository::new(pool)),
            clock: Arc::new(ManualClock::at(1_700_000_000)),
        }
    }

    pub fn tuning() -> SyncTuning {
        SyncTuning {
            bulk_delay: Duration::from_millis(1),
            ..SyncTuning::default()
        }
    }

    pub fn coordinator(&self) -> SyncCoordinator {
        self.coordinator_for(Some(STORE.to_string()))
    }

    pub fn coordinator_for(&self, store_id: Option<String>) -> SyncCoordinator {
        SyncCoordinator::new(
            self.provider.clone(),
            self.catalog.clone(),
            self.log.clone(),
            self.state.clone(),
            self.clock.clone(),
            Self::tuning(),
        )
        .with_store(store_id)
    }

    pub fn reconciler(&self) -> OrphanReconciler {
        OrphanReconciler::new(self.provider.clone(), self.log.clone(), self.state.clone())
    }
}
