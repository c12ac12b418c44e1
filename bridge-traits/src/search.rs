//! Remote File Search Abstraction
//!
//! Contract for a hosted semantic-search store holding one plain-text
//! document per product. Implemented by `provider-gemini`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document_id::DocumentId;
use crate::error::Result;

/// Remote store holding indexed documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStore {
    /// Full resource name (`fileSearchStores/{id}`)
    pub name: String,
    pub display_name: Option<String>,
    /// RFC 3339 creation time as reported by the service
    pub create_time: Option<String>,
}

/// Document entry returned by a list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: DocumentId,
    pub display_name: Option<String>,
}

/// One page of a document listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPage {
    pub documents: Vec<RemoteDocument>,
    /// Token for the next page; `None` on the last page
    pub next_page_token: Option<String>,
}

/// Retrieved passage attached to a generated answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub text: String,
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Model answer grounded on a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub text: String,
    pub chunks: Vec<GroundingChunk>,
    /// Raw grounding metadata as returned by the service
    pub grounding_metadata: Option<serde_json::Value>,
}

/// File search provider trait
///
/// Every call is a single attempt; callers decide whether to try again.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::search::FileSearchProvider;
///
/// async fn index(provider: &dyn FileSearchProvider, store: &str, text: &str) -> Result<String> {
///     let id = provider.create_document(store, "Producto: Red Shoe", text).await?;
///     Ok(id.to_string())
/// }
/// ```
#[async_trait]
pub trait FileSearchProvider: Send + Sync {
    /// Create a new store, returning its resource name
    async fn create_store(&self, display_name: &str) -> Result<RemoteStore>;

    /// List stores visible to the configured credentials
    async fn list_stores(&self) -> Result<Vec<RemoteStore>>;

    /// Delete a store
    async fn delete_store(&self, store_id: &str) -> Result<()>;

    /// Upload `content` as a new plain-text document.
    ///
    /// The returned id is always in document form.
    async fn create_document(
        &self,
        store_id: &str,
        display_name: &str,
        content: &str,
    ) -> Result<DocumentId>;

    /// Replace a document: delete the old one, then create a new one in the
    /// store that owned it.
    async fn update_document(
        &self,
        document_id: &DocumentId,
        display_name: &str,
        content: &str,
    ) -> Result<DocumentId>;

    /// Delete a document together with its chunks
    async fn delete_document(&self, document_id: &DocumentId) -> Result<()>;

    /// Fetch one page of documents in a store
    async fn list_documents(
        &self,
        store_id: &str,
        page_token: Option<String>,
    ) -> Result<DocumentPage>;

    /// Retrieve passages relevant to `query`
    async fn query(&self, store_id: &str, query: &str, max_results: usize)
        -> Result<Vec<GroundingChunk>>;

    /// Generate an answer to `prompt` grounded on the store
    async fn generate_with_search(&self, store_id: &str, prompt: &str) -> Result<GroundedAnswer>;

    /// Check that the credentials are accepted
    async fn test_connection(&self) -> Result<bool>;
}
