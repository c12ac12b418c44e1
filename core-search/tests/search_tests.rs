//! Search against an in-memory store and catalog

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::catalog::{Product, ProductCatalog, ProductId, PublishStatus};
use bridge_traits::document_id::DocumentId;
use bridge_traits::error::{BridgeError, ProviderFailure, Result as BridgeResult};
use bridge_traits::search::{
    DocumentPage, FileSearchProvider, GroundedAnswer, GroundingChunk, RemoteStore,
};
use core_search::{SearchError, SearchService};
use core_sync::content::build_content;
use serde_json::json;
use tokio::sync::Mutex;

const STORE: &str = "fileSearchStores/shop";

#[derive(Default)]
struct FakeProvider {
    chunks: Mutex<Vec<GroundingChunk>>,
    answer: Mutex<GroundedAnswer>,
    queries: Mutex<Vec<(String, String, usize)>>,
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeProvider {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    async fn returns(&self, texts: &[String]) {
        *self.chunks.lock().await = texts.iter().map(|t| chunk(t)).collect();
    }
}

fn chunk(text: &str) -> GroundingChunk {
    GroundingChunk {
        text: text.to_string(),
        title: None,
        uri: None,
    }
}

#[async_trait]
impl FileSearchProvider for FakeProvider {
    async fn create_store(&self, _display_name: &str) -> BridgeResult<RemoteStore> {
        unimplemented!()
    }

    async fn list_stores(&self) -> BridgeResult<Vec<RemoteStore>> {
        unimplemented!()
    }

    async fn delete_store(&self, _store_id: &str) -> BridgeResult<()> {
        unimplemented!()
    }

    async fn create_document(
        &self,
        _store_id: &str,
        _display_name: &str,
        _content: &str,
    ) -> BridgeResult<DocumentId> {
        unimplemented!()
    }

    async fn update_document(
        &self,
        _document_id: &DocumentId,
        _display_name: &str,
        _content: &str,
    ) -> BridgeResult<DocumentId> {
        unimplemented!()
    }

    async fn delete_document(&self, _document_id: &DocumentId) -> BridgeResult<()> {
        unimplemented!()
    }

    async fn list_documents(
        &self,
        _store_id: &str,
        _page_token: Option<String>,
    ) -> BridgeResult<DocumentPage> {
        unimplemented!()
    }

    async fn query(
        &self,
        store_id: &str,
        query: &str,
        max_results: usize,
    ) -> BridgeResult<Vec<GroundingChunk>> {
        if self.fail {
            return Err(BridgeError::Provider(ProviderFailure::new(500, "backend down")));
        }
        self.queries
            .lock()
            .await
            .push((store_id.to_string(), query.to_string(), max_results));
        Ok(self.chunks.lock().await.clone())
    }

    async fn generate_with_search(
        &self,
        _store_id: &str,
        prompt: &str,
    ) -> BridgeResult<GroundedAnswer> {
        self.prompts.lock().await.push(prompt.to_string());
        Ok(self.answer.lock().await.clone())
    }

    async fn test_connection(&self) -> BridgeResult<bool> {
        Ok(true)
    }
}

#[derive(Default)]
struct FakeCatalog {
    products: Mutex<BTreeMap<ProductId, Product>>,
}

impl FakeCatalog {
    async fn insert(&self, product: Product) {
        self.products.lock().await.insert(product.id, product);
    }
}

#[async_trait]
impl ProductCatalog for FakeCatalog {
    async fn get_product(&self, id: ProductId) -> BridgeResult<Option<Product>> {
        Ok(self.products.lock().await.get(&id).cloned())
    }

    async fn list_published_ids(&self) -> BridgeResult<Vec<ProductId>> {
        Ok(self.products.lock().await.keys().copied().collect())
    }
}

fn product(id: i64, name: &str) -> Product {
    let mut product = Product::new(ProductId::new(id), name);
    product.price = "19.99".to_string();
    product.categories = vec!["Calzado".to_string()];
    product
}

struct Fixture {
    provider: Arc<FakeProvider>,
    catalog: Arc<FakeCatalog>,
}

impl Fixture {
    async fn new(provider: FakeProvider) -> Self {
        let catalog = FakeCatalog::default();
        catalog.insert(product(1, "Red Shoe")).await;
        catalog.insert(product(2, "Blue Shoe")).await;
        let mut draft = product(3, "Hidden Shoe");
        draft.status = PublishStatus::Draft;
        catalog.insert(draft).await;

        Self {
            provider: Arc::new(provider),
            catalog: Arc::new(catalog),
        }
    }

    fn service(&self) -> SearchService {
        SearchService::new(self.provider.clone(), self.catalog.clone())
            .with_store(Some(STORE.to_string()))
    }

    async fn indexed_text(&self, id: i64) -> String {
        let products = self.catalog.products.lock().await;
        build_content(&products[&ProductId::new(id)])
    }
}

#[tokio::test]
async fn test_search_maps_chunks_to_published_products() {
    let f = Fixture::new(FakeProvider::default()).await;
    let texts = vec![
        f.indexed_text(2).await,
        f.indexed_text(1).await,
        f.indexed_text(2).await,
        f.indexed_text(3).await,
        "Texto sin identificador".to_string(),
        "ID del producto: 99".to_string(),
    ];
    f.provider.returns(&texts).await;

    let response = f.service().search("zapatos", Some(5)).await.unwrap();

    assert_eq!(response.query, "zapatos");
    assert_eq!(response.total_results, 2);
    let ids: Vec<i64> = response.products.iter().map(|p| p.id.get()).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(response.products[0].name, "Blue Shoe");
    assert_eq!(response.products[0].price, "19.99");
    assert_eq!(response.products[0].relevance_score, Some(1.0));
    assert!(response.products[0]
        .matched_text
        .as_deref()
        .unwrap()
        .starts_with("Nombre del producto: Blue Shoe"));

    let queries = f.provider.queries.lock().await;
    assert_eq!(
        queries.as_slice(),
        &[(STORE.to_string(), "zapatos".to_string(), 5)]
    );
}

#[tokio::test]
async fn test_search_uses_default_limit() {
    let f = Fixture::new(FakeProvider::default()).await;

    let response = f.service().search("  mug ", None).await.unwrap();

    assert_eq!(response.query, "mug");
    assert_eq!(response.total_results, 0);
    assert_eq!(f.provider.queries.lock().await[0].2, 10);
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let f = Fixture::new(FakeProvider::default()).await;

    let error = f.service().search("   ", None).await.unwrap_err();

    assert!(matches!(error, SearchError::EmptyQuery));
    assert!(f.provider.queries.lock().await.is_empty());
}

#[tokio::test]
async fn test_search_without_store_is_configuration_error() {
    let f = Fixture::new(FakeProvider::default()).await;
    let service = SearchService::new(f.provider.clone(), f.catalog.clone()).with_store(None);

    let error = service.search("mug", None).await.unwrap_err();

    assert!(matches!(error, SearchError::Configuration(_)));
}

#[tokio::test]
async fn test_provider_failure_is_surfaced() {
    let f = Fixture::new(FakeProvider::failing()).await;

    let error = f.service().search("mug", None).await.unwrap_err();

    match error {
        SearchError::Provider(BridgeError::Provider(failure)) => assert_eq!(failure.status, 500),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_search_ai_returns_answer_and_products() {
    let f = Fixture::new(FakeProvider::default()).await;
    *f.provider.answer.lock().await = GroundedAnswer {
        text: "Te recomiendo el Red Shoe.".to_string(),
        chunks: vec![chunk(&f.indexed_text(1).await)],
        grounding_metadata: Some(json!({ "groundingChunks": [] })),
    };

    let response = f.service().search_ai("zapatos rojos").await.unwrap();

    assert_eq!(response.ai_text, "Te recomiendo el Red Shoe.");
    assert_eq!(response.products.len(), 1);
    assert_eq!(response.products[0].id.get(), 1);
    assert!(response.grounding_metadata.is_some());

    let prompts = f.provider.prompts.lock().await;
    assert!(prompts[0].contains("'zapatos rojos'"));
}
