//! Semantic and AI search over the synced store

use std::collections::HashSet;
use std::sync::Arc;

use bridge_traits::catalog::{ProductCatalog, ProductId};
use bridge_traits::search::{FileSearchProvider, GroundingChunk};
use core_sync::content::extract_product_id;
use tracing::{debug, info, instrument};

use crate::error::{Result, SearchError};
use crate::results::{AiSearchResponse, ProductResult, SearchResponse};

/// Results returned when the caller gives no limit
pub const DEFAULT_LIMIT: usize = 10;

pub struct SearchService {
    provider: Arc<dyn FileSearchProvider>,
    catalog: Arc<dyn ProductCatalog>,
    store_id: Option<String>,
}

impl SearchService {
    pub fn new(provider: Arc<dyn FileSearchProvider>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self {
            provider,
            catalog,
            store_id: None,
        }
    }

    /// Set the store queries run against
    pub fn with_store(mut self, store_id: Option<String>) -> Self {
        self.store_id = store_id.filter(|id| !id.trim().is_empty());
        self
    }

    fn require_store(&self) -> Result<&str> {
        self.store_id.as_deref().ok_or_else(|| {
            SearchError::Configuration("No File Search store is configured".to_string())
        })
    }

    /// Find products whose indexed text matches `query`
    ///
    /// Chunks that do not name a product, name one twice, or point at a
    /// product that is gone or unpublished are dropped.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<SearchResponse> {
        let query = non_empty(query)?;
        let store_id = self.require_store()?;
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);

        let chunks = self.provider.query(store_id, query, limit).await?;
        debug!(chunks = chunks.len(), "Retrieved chunks");

        let products = self.resolve_products(&chunks).await?;
        info!(results = products.len(), "Search completed");

        Ok(SearchResponse {
            query: query.to_string(),
            total_results: products.len(),
            products,
        })
    }

    /// Ask the model about `query`, grounded on the store
    #[instrument(skip(self))]
    pub async fn search_ai(&self, query: &str) -> Result<AiSearchResponse> {
        let query = non_empty(query)?;
        let store_id = self.require_store()?;

        let answer = self
            .provider
            .generate_with_search(store_id, &ai_prompt(query))
            .await?;
        let products = self.resolve_products(&answer.chunks).await?;

        info!(
            results = products.len(),
            answer_len = answer.text.len(),
            "AI search completed"
        );

        Ok(AiSearchResponse {
            query: query.to_string(),
            ai_text: answer.text,
            products,
            grounding_metadata: answer.grounding_metadata,
        })
    }

    async fn resolve_products(&self, chunks: &[GroundingChunk]) -> Result<Vec<ProductResult>> {
        let mut seen: HashSet<ProductId> = HashSet::new();
        let mut products = Vec::new();

        for chunk in chunks {
            let Some(product_id) = extract_product_id(&chunk.text) else {
                continue;
            };
            if !seen.insert(product_id) {
                continue;
            }

            match self.catalog.get_product(product_id).await? {
                Some(product) if product.is_published() => {
                    products.push(ProductResult::from_product(&product).with_match(&chunk.text));
                }
                _ => debug!(product_id = %product_id, "Skipping unavailable product"),
            }
        }

        Ok(products)
    }
}

fn non_empty(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        Err(SearchError::EmptyQuery)
    } else {
        Ok(query)
    }
}

fn ai_prompt(query: &str) -> String {
    format!(
        "Busca productos que coincidan con esta consulta: '{}'. Proporciona una respuesta útil \
         que incluya los productos más relevantes con sus características principales, precios \
         y por qué son buenos para esta búsqueda.",
        query
    )
}
