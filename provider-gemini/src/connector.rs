//! Gemini File Search API connector implementation
//!
//! Implements the `FileSearchProvider` trait against the Gemini REST API
//! (`v1beta`). Authentication is an API key passed as the `key` query
//! parameter; it is redacted from every logged URL.

use async_trait::async_trait;
use bridge_traits::document_id::{DocumentId, StoreRef};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::search::{
    DocumentPage, FileSearchProvider, GroundedAnswer, GroundingChunk, RemoteDocument, RemoteStore,
};
use bytes::Bytes;
use core_runtime::config::GeminiEndpoints;
use core_runtime::logging::redact_api_key;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{GeminiError, Result};
use crate::types::{
    ApiErrorEnvelope, CreateStoreRequest, FileSearchStoreResource, GenerateContentRequest,
    GenerateContentResponse, GroundingMetadata, ListDocumentsResponse, ListStoresResponse,
    UploadOperation, UploadStartRequest,
};

/// Response header carrying the resumable upload session URL
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Characters of a non-JSON error body kept in the error message
const RAW_ERROR_PREVIEW_CHARS: usize = 200;

/// Prompt used to retrieve product passages for a plain search
const QUERY_PROMPT_PREFIX: &str = "Lista los productos más relevantes para: ";

/// Connector settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Store that owns legacy `corpora/...` documents
    pub configured_store_id: Option<String>,
    pub endpoints: GeminiEndpoints,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            configured_store_id: None,
            endpoints: GeminiEndpoints::default(),
        }
    }

    pub fn with_configured_store(mut self, store_id: Option<String>) -> Self {
        self.configured_store_id = store_id;
        self
    }

    pub fn with_endpoints(mut self, endpoints: GeminiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// Gemini File Search connector
///
/// Implements `FileSearchProvider` for the Gemini API.
///
/// # Features
///
/// - Three-step resumable upload (start, upload + finalize, operation id rewrite)
/// - Delete-then-create document replacement
/// - Cursor-based document listing
/// - Grounded generation with the `file_search` tool
///
/// # Example
///
/// ```ignore
/// use provider_gemini::{GeminiConfig, GeminiConnector};
/// use bridge_traits::search::FileSearchProvider;
///
/// let connector = GeminiConnector::new(http_client, GeminiConfig::new(api_key))?;
/// let id = connector
///     .create_document("fileSearchStores/products", "Producto: Red Shoe", &content)
///     .await?;
/// ```
pub struct GeminiConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    config: GeminiConfig,
}

impl GeminiConnector {
    /// Create a new connector
    ///
    /// Fails with [`GeminiError::Configuration`] when the API key is blank.
    pub fn new(http_client: Arc<dyn HttpClient>, config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiError::Configuration(
                "Gemini API key is not configured".to_string(),
            ));
        }

        Ok(Self {
            http_client,
            config,
        })
    }

    fn endpoints(&self) -> &GeminiEndpoints {
        &self.config.endpoints
    }

    /// `{api_base}/{path}?{params}&key={api_key}`
    fn api_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let url = format!("{}/{}", self.endpoints().api_base, path);
        self.with_query(url, params)
    }

    fn upload_start_url(&self, store_id: &str) -> String {
        let url = format!(
            "{}/{}:uploadToFileSearchStore",
            self.endpoints().upload_base,
            store_id
        );
        self.with_query(url, &[])
    }

    fn with_query(&self, mut url: String, params: &[(&str, &str)]) -> String {
        let mut separator = '?';
        for (name, value) in params
            .iter()
            .copied()
            .chain(std::iter::once(("key", self.config.api_key.as_str())))
        {
            url.push(separator);
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
            separator = '&';
        }
        url
    }

    /// Execute a request, turning 4xx/5xx responses into [`GeminiError::Api`]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = redact_api_key(&request.url);
        debug!(method = ?request.method, url = %url, "Calling Gemini API");

        let response = self.http_client.execute(request).await?;

        if response.status >= 400 {
            let error = Self::parse_api_error(&response);
            warn!(status = response.status, url = %url, error = %error, "Gemini API request failed");
            return Err(error);
        }

        Ok(response)
    }

    fn parse_api_error(response: &HttpResponse) -> GeminiError {
        match serde_json::from_slice::<ApiErrorEnvelope>(&response.body) {
            Ok(envelope) => GeminiError::Api {
                status_code: response.status,
                error_status: envelope.error.status,
                error_code: envelope.error.code,
                message: envelope
                    .error
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
            Err(_) => {
                let body = String::from_utf8_lossy(&response.body);
                let preview: String = body.chars().take(RAW_ERROR_PREVIEW_CHARS).collect();
                GeminiError::Api {
                    status_code: response.status,
                    error_status: None,
                    error_code: None,
                    message: format!("HTTP {}: {}", response.status, preview),
                }
            }
        }
    }

    fn parse_json<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| GeminiError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }

    /// Store owning `document_id`
    fn resolve_store(&self, document_id: &DocumentId) -> Result<String> {
        let unresolvable = || GeminiError::UnresolvableStore(document_id.to_string());

        match document_id.store() {
            StoreRef::Named(store_id) => Ok(store_id),
            StoreRef::Configured => self
                .config
                .configured_store_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(unresolvable),
            StoreRef::Unknown => Err(unresolvable()),
        }
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    async fn upload_document(
        &self,
        store_id: &str,
        display_name: &str,
        content: &str,
    ) -> Result<DocumentId> {
        // Step 1: open a resumable upload session
        let start = HttpRequest::new(HttpMethod::Post, self.upload_start_url(store_id))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", content.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", "text/plain")
            .json(&UploadStartRequest { display_name })?
            .timeout(self.endpoints().request_timeout);

        let start_response = self.send(start).await?;
        let session_url = start_response
            .header(UPLOAD_URL_HEADER)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or(GeminiError::UploadUrlMissing {
                status: start_response.status,
            })?;

        // Step 2: send the content and finalize in one call
        let upload = HttpRequest::new(HttpMethod::Post, session_url)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .header("Content-Type", "text/plain")
            .body(Bytes::from(content.to_owned()))
            .timeout(self.endpoints().upload_timeout);

        let upload_response = self.send(upload).await?;
        let operation: UploadOperation = Self::parse_json(&upload_response, "upload operation")?;
        let operation_id = operation
            .name
            .filter(|name| !name.is_empty())
            .ok_or(GeminiError::MissingOperationId)?;

        // Step 3: the operation id names the same resource as the document
        let document_id = DocumentId::parse(operation_id.as_str()).normalize();

        info!(
            operation_id = %operation_id,
            document_id = %document_id,
            "Document uploaded"
        );

        Ok(document_id)
    }

    #[instrument(skip_all, fields(document_id = %document_id))]
    async fn remove_document(&self, document_id: &DocumentId) -> Result<()> {
        let normalized = document_id.normalize();
        if normalized != *document_id {
            debug!(normalized = %normalized, "Converted operation id to document id");
        }

        let request = HttpRequest::new(
            HttpMethod::Delete,
            self.api_url(normalized.as_str(), &[("force", "true")]),
        )
        .timeout(self.endpoints().request_timeout);

        match self.send(request).await {
            Ok(_) => {
                info!(document_id = %normalized, "Document deleted");
                Ok(())
            }
            Err(GeminiError::Api {
                status_code: 404, ..
            }) => Err(GeminiError::NotFound(normalized.to_string())),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, fields(document_id = %document_id))]
    async fn replace_document(
        &self,
        document_id: &DocumentId,
        display_name: &str,
        content: &str,
    ) -> Result<DocumentId> {
        let store_id = self.resolve_store(document_id)?;

        // The old document may already be gone; the new one is created regardless
        if let Err(e) = self.remove_document(document_id).await {
            warn!(
                document_id = %document_id,
                error = %e,
                "Old document could not be deleted, creating replacement anyway"
            );
        }

        self.upload_document(&store_id, display_name, content).await
    }

    async fn documents_page(
        &self,
        store_id: &str,
        page_token: Option<String>,
    ) -> Result<DocumentPage> {
        let path = format!("{}/documents", store_id);
        let params: Vec<(&str, &str)> = page_token
            .as_deref()
            .map(|token| vec![("pageToken", token)])
            .unwrap_or_default();

        let request = HttpRequest::new(HttpMethod::Get, self.api_url(&path, &params))
            .timeout(self.endpoints().request_timeout);
        let response = self.send(request).await?;
        let list: ListDocumentsResponse = Self::parse_json(&response, "documents list")?;

        let documents: Vec<RemoteDocument> = list
            .documents
            .into_iter()
            .map(|doc| RemoteDocument {
                id: DocumentId::parse(doc.name),
                display_name: doc.display_name,
            })
            .collect();

        debug!(store_id = %store_id, count = documents.len(), "Listed documents page");

        Ok(DocumentPage {
            documents,
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn generate(&self, store_id: &str, prompt: String) -> Result<GenerateContentResponse> {
        let path = format!("models/{}:generateContent", self.endpoints().model);
        let request = HttpRequest::new(HttpMethod::Post, self.api_url(&path, &[]))
            .json(&GenerateContentRequest::with_file_search(prompt, store_id))?
            .timeout(self.endpoints().request_timeout);

        let response = self.send(request).await?;
        Self::parse_json(&response, "generateContent response")
    }

    fn extract_chunks(grounding_metadata: Option<&serde_json::Value>) -> Vec<GroundingChunk> {
        let metadata: GroundingMetadata = grounding_metadata
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();

        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| {
                let text = chunk.text()?.to_string();
                let context = chunk.retrieved_context.as_ref();
                Some(GroundingChunk {
                    text,
                    title: context.and_then(|c| c.title.clone()),
                    uri: context.and_then(|c| c.uri.clone()),
                })
            })
            .collect()
    }

    fn convert_store(resource: FileSearchStoreResource) -> RemoteStore {
        RemoteStore {
            name: resource.name,
            display_name: resource.display_name,
            create_time: resource.create_time,
        }
    }

    async fn fetch_stores(&self) -> Result<Vec<RemoteStore>> {
        let mut stores = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let params: Vec<(&str, &str)> = page_token
                .as_deref()
                .map(|token| vec![("pageToken", token)])
                .unwrap_or_default();
            let request = HttpRequest::new(HttpMethod::Get, self.api_url("fileSearchStores", &params))
                .timeout(self.endpoints().request_timeout);

            let response = self.send(request).await?;
            let list: ListStoresResponse = Self::parse_json(&response, "stores list")?;
            stores.extend(list.file_search_stores.into_iter().map(Self::convert_store));

            match list.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(stores)
    }
}

#[async_trait]
impl FileSearchProvider for GeminiConnector {
    #[instrument(skip(self))]
    async fn create_store(&self, display_name: &str) -> BridgeResult<RemoteStore> {
        let request = HttpRequest::new(HttpMethod::Post, self.api_url("fileSearchStores", &[]))
            .json(&CreateStoreRequest { display_name })?
            .timeout(self.endpoints().request_timeout);

        let response = self.send(request).await?;
        let resource: FileSearchStoreResource = Self::parse_json(&response, "store")?;

        info!(store_id = %resource.name, "Created File Search store");
        Ok(Self::convert_store(resource))
    }

    async fn list_stores(&self) -> BridgeResult<Vec<RemoteStore>> {
        let stores = self.fetch_stores().await?;
        info!(count = stores.len(), "Listed File Search stores");
        Ok(stores)
    }

    #[instrument(skip(self))]
    async fn delete_store(&self, store_id: &str) -> BridgeResult<()> {
        let request = HttpRequest::new(HttpMethod::Delete, self.api_url(store_id, &[]))
            .timeout(self.endpoints().request_timeout);

        match self.send(request).await {
            Ok(_) => {
                info!(store_id = %store_id, "Deleted File Search store");
                Ok(())
            }
            Err(GeminiError::Api {
                status_code: 404, ..
            }) => Err(GeminiError::NotFound(store_id.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_document(
        &self,
        store_id: &str,
        display_name: &str,
        content: &str,
    ) -> BridgeResult<DocumentId> {
        Ok(self.upload_document(store_id, display_name, content).await?)
    }

    async fn update_document(
        &self,
        document_id: &DocumentId,
        display_name: &str,
        content: &str,
    ) -> BridgeResult<DocumentId> {
        Ok(self
            .replace_document(document_id, display_name, content)
            .await?)
    }

    async fn delete_document(&self, document_id: &DocumentId) -> BridgeResult<()> {
        Ok(self.remove_document(document_id).await?)
    }

    async fn list_documents(
        &self,
        store_id: &str,
        page_token: Option<String>,
    ) -> BridgeResult<DocumentPage> {
        Ok(self.documents_page(store_id, page_token).await?)
    }

    #[instrument(skip(self))]
    async fn query(
        &self,
        store_id: &str,
        query: &str,
        max_results: usize,
    ) -> BridgeResult<Vec<GroundingChunk>> {
        let response = self
            .generate(store_id, format!("{}{}", QUERY_PROMPT_PREFIX, query))
            .await?;

        let metadata = response
            .candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref());
        let mut chunks = Self::extract_chunks(metadata);

        if max_results > 0 {
            chunks.truncate(max_results);
        }

        if chunks.is_empty() {
            debug!(query = %query, "Query returned no grounding chunks");
        } else {
            debug!(query = %query, count = chunks.len(), "Query returned grounding chunks");
        }

        Ok(chunks)
    }

    #[instrument(skip(self, prompt))]
    async fn generate_with_search(
        &self,
        store_id: &str,
        prompt: &str,
    ) -> BridgeResult<GroundedAnswer> {
        let response = self.generate(store_id, prompt.to_string()).await?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Ok(GroundedAnswer::default());
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        let chunks = Self::extract_chunks(candidate.grounding_metadata.as_ref());

        Ok(GroundedAnswer {
            text,
            chunks,
            grounding_metadata: candidate.grounding_metadata,
        })
    }

    async fn test_connection(&self) -> BridgeResult<bool> {
        let request = HttpRequest::new(HttpMethod::Get, self.api_url("fileSearchStores", &[]))
            .timeout(self.endpoints().request_timeout);

        match self.send(request).await {
            Ok(_) => Ok(true),
            Err(GeminiError::Api { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, TransportKind};
    use mockall::{mock, Sequence};
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn is_connected(&self) -> bool;
        }
    }

    const API: &str = "https://generativelanguage.googleapis.com/v1beta";
    const UPLOAD: &str = "https://generativelanguage.googleapis.com/upload/v1beta";

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn session_response(url: &str) -> HttpResponse {
        let mut headers = HashMap::new();
        headers.insert("x-goog-upload-url".to_string(), url.to_string());
        HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        }
    }

    fn connector(mock_http: MockHttpClient) -> GeminiConnector {
        GeminiConnector::new(Arc::new(mock_http), GeminiConfig::new("test-key")).unwrap()
    }

    fn expect_upload(
        mock_http: &mut MockHttpClient,
        seq: &mut Sequence,
        store_id: &'static str,
        operation: &'static str,
    ) {
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(seq)
            .returning(move |req| {
                assert_eq!(req.method, HttpMethod::Post);
                assert_eq!(
                    req.url,
                    format!("{}/{}:uploadToFileSearchStore?key=test-key", UPLOAD, store_id)
                );
                assert_eq!(req.headers.get("X-Goog-Upload-Protocol").unwrap(), "resumable");
                assert_eq!(req.headers.get("X-Goog-Upload-Command").unwrap(), "start");
                assert_eq!(
                    req.headers.get("X-Goog-Upload-Header-Content-Type").unwrap(),
                    "text/plain"
                );
                Ok(session_response("https://upload.example.com/session/1"))
            });

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(seq)
            .returning(move |req| {
                assert_eq!(req.url, "https://upload.example.com/session/1");
                assert_eq!(
                    req.headers.get("X-Goog-Upload-Command").unwrap(),
                    "upload, finalize"
                );
                assert_eq!(req.headers.get("X-Goog-Upload-Offset").unwrap(), "0");
                Ok(json_response(200, &format!(r#"{{"name": "{}"}}"#, operation)))
            });
    }

    #[test]
    fn test_new_rejects_blank_api_key() {
        let result = GeminiConnector::new(Arc::new(MockHttpClient::new()), GeminiConfig::new("  "));
        assert!(matches!(result, Err(GeminiError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_create_document_rewrites_operation_id() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        let content = "Nombre del producto: Red Shoe\nID del producto: 42";

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |req| {
                assert_eq!(
                    req.headers.get("X-Goog-Upload-Header-Content-Length").unwrap(),
                    &content.len().to_string()
                );
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                assert_eq!(body["display_name"], "Producto: Red Shoe");
                Ok(session_response("https://upload.example.com/session/1"))
            });

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |req| {
                assert_eq!(req.headers.get("Content-Type").unwrap(), "text/plain");
                assert_eq!(req.body.as_deref(), Some(content.as_bytes()));
                Ok(json_response(
                    200,
                    r#"{"name": "fileSearchStores/shop/upload/operations/op-1"}"#,
                ))
            });

        let id = connector(mock_http)
            .create_document("fileSearchStores/shop", "Producto: Red Shoe", content)
            .await
            .unwrap();

        assert_eq!(
            id,
            DocumentId::Current("fileSearchStores/shop/documents/op-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_document_without_upload_url() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, "{}")));

        let err = connector(mock_http)
            .create_document("fileSearchStores/shop", "Producto: A", "text")
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::OperationFailed(msg) if msg.contains("Status: 200")));
    }

    #[tokio::test]
    async fn test_create_document_without_operation_name() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(session_response("https://upload.example.com/session/1")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json_response(200, r#"{"done": true}"#)));

        let err = connector(mock_http)
            .create_document("fileSearchStores/shop", "Producto: A", "text")
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }

    #[tokio::test]
    async fn test_delete_normalizes_legacy_operation_id() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Delete);
            assert_eq!(
                req.url,
                format!(
                    "{}/fileSearchStores/shop/documents/op-1?force=true&key=test-key",
                    API
                )
            );
            Ok(json_response(200, "{}"))
        });

        let id = DocumentId::parse("fileSearchStores/shop/upload/operations/op-1");
        connector(mock_http).delete_document(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_document_is_not_found() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                404,
                r#"{"error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}}"#,
            ))
        });

        let id = DocumentId::parse("fileSearchStores/shop/documents/gone");
        let err = connector(mock_http).delete_document(&id).await.unwrap_err();

        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_continues_when_delete_fails() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Delete);
                Ok(json_response(404, r#"{"error": {"message": "gone"}}"#))
            });
        expect_upload(
            &mut mock_http,
            &mut seq,
            "fileSearchStores/shop",
            "fileSearchStores/shop/upload/operations/new",
        );

        let old = DocumentId::parse("fileSearchStores/shop/documents/old");
        let new = connector(mock_http)
            .update_document(&old, "Producto: A", "text")
            .await
            .unwrap();

        assert_eq!(new.as_str(), "fileSearchStores/shop/documents/new");
    }

    #[tokio::test]
    async fn test_update_legacy_corpus_uses_configured_store() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(
                    req.url,
                    format!("{}/corpora/old/documents/d?force=true&key=test-key", API)
                );
                Ok(json_response(200, "{}"))
            });
        expect_upload(
            &mut mock_http,
            &mut seq,
            "fileSearchStores/active",
            "fileSearchStores/active/upload/operations/n1",
        );

        let config = GeminiConfig::new("test-key")
            .with_configured_store(Some("fileSearchStores/active".to_string()));
        let connector = GeminiConnector::new(Arc::new(mock_http), config).unwrap();

        let old = DocumentId::parse("corpora/old/documents/d");
        let new = connector
            .update_document(&old, "Producto: A", "text")
            .await
            .unwrap();

        assert_eq!(new.as_str(), "fileSearchStores/active/documents/n1");
    }

    #[tokio::test]
    async fn test_update_without_resolvable_store_makes_no_calls() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let old = DocumentId::parse("corpora/old/documents/d");
        let err = connector(mock_http)
            .update_document(&old, "Producto: A", "text")
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_list_documents_with_page_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(
                req.url,
                format!(
                    "{}/fileSearchStores/shop/documents?pageToken=next%20page&key=test-key",
                    API
                )
            );
            Ok(json_response(
                200,
                r#"{
                    "documents": [
                        { "name": "fileSearchStores/shop/documents/a", "displayName": "Producto: A" },
                        { "name": "fileSearchStores/shop/documents/b" }
                    ],
                    "nextPageToken": "page-3"
                }"#,
            ))
        });

        let page = connector(mock_http)
            .list_documents("fileSearchStores/shop", Some("next page".to_string()))
            .await
            .unwrap();

        assert_eq!(page.documents.len(), 2);
        assert_eq!(page.documents[0].display_name.as_deref(), Some("Producto: A"));
        assert_eq!(page.next_page_token.as_deref(), Some("page-3"));
    }

    #[tokio::test]
    async fn test_query_tolerates_both_chunk_shapes() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(
                req.url,
                format!("{}/models/gemini-2.5-flash:generateContent?key=test-key", API)
            );
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(
                body["contents"][0]["parts"][0]["text"],
                "Lista los productos más relevantes para: zapatos"
            );
            Ok(json_response(
                200,
                r#"{
                    "candidates": [{
                        "content": { "parts": [{ "text": "..." }] },
                        "groundingMetadata": {
                            "groundingChunks": [
                                { "retrievedContext": { "text": "ID del producto: 1", "title": "Producto: A" } },
                                { "chunk": { "data": { "stringValue": "ID del producto: 2" } } }
                            ]
                        }
                    }]
                }"#,
            ))
        });

        let chunks = connector(mock_http)
            .query("fileSearchStores/shop", "zapatos", 10)
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "ID del producto: 1");
        assert_eq!(chunks[0].title.as_deref(), Some("Producto: A"));
        assert_eq!(chunks[1].text, "ID del producto: 2");
    }

    #[tokio::test]
    async fn test_query_without_candidates_is_empty() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, "{}")));

        let chunks = connector(mock_http)
            .query("fileSearchStores/shop", "nada", 5)
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_generate_with_search_joins_text() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                200,
                r#"{
                    "candidates": [{
                        "content": { "parts": [{ "text": "Te recomiendo " }, { "text": "Red Shoe." }] },
                        "groundingMetadata": { "groundingChunks": [] }
                    }]
                }"#,
            ))
        });

        let answer = connector(mock_http)
            .generate_with_search("fileSearchStores/shop", "zapatos rojos")
            .await
            .unwrap();

        assert_eq!(answer.text, "Te recomiendo Red Shoe.");
        assert!(answer.chunks.is_empty());
        assert!(answer.grounding_metadata.is_some());
    }

    #[tokio::test]
    async fn test_structured_api_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                400,
                r#"{"error": {"code": 400, "message": "Invalid store name", "status": "INVALID_ARGUMENT"}}"#,
            ))
        });

        let err = connector(mock_http)
            .list_documents("bad", None)
            .await
            .unwrap_err();

        match err {
            BridgeError::Provider(failure) => {
                assert_eq!(failure.status, 400);
                assert_eq!(failure.code, Some(400));
                assert_eq!(failure.status_text.as_deref(), Some("INVALID_ARGUMENT"));
                assert_eq!(failure.message, "Invalid store name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_error_body() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(502, "<html>Bad Gateway</html>")));

        let err = connector(mock_http).list_stores().await.unwrap_err();

        match err {
            BridgeError::Provider(failure) => {
                assert_eq!(failure.message, "HTTP 502: <html>Bad Gateway</html>");
                assert_eq!(failure.code, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Err(BridgeError::Transport {
                kind: TransportKind::Timeout,
                message: "deadline exceeded".to_string(),
            })
        });

        let err = connector(mock_http).list_stores().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_list_stores_follows_pages() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert!(!req.url.contains("pageToken"));
                Ok(json_response(
                    200,
                    r#"{"fileSearchStores": [{"name": "fileSearchStores/a", "displayName": "A"}], "nextPageToken": "p2"}"#,
                ))
            });
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert!(req.url.contains("pageToken=p2"));
                Ok(json_response(
                    200,
                    r#"{"fileSearchStores": [{"name": "fileSearchStores/b"}]}"#,
                ))
            });

        let stores = connector(mock_http).list_stores().await.unwrap();
        let names: Vec<&str> = stores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["fileSearchStores/a", "fileSearchStores/b"]);
    }

    #[tokio::test]
    async fn test_create_store_sends_display_name() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, format!("{}/fileSearchStores?key=test-key", API));
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["displayName"], "WooCommerce Products");
            Ok(json_response(
                200,
                r#"{"name": "fileSearchStores/new-1", "displayName": "WooCommerce Products"}"#,
            ))
        });

        let store = connector(mock_http)
            .create_store("WooCommerce Products")
            .await
            .unwrap();
        assert_eq!(store.name, "fileSearchStores/new-1");
    }

    #[tokio::test]
    async fn test_connection_check() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json_response(200, r#"{"fileSearchStores": []}"#)));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(json_response(
                    403,
                    r#"{"error": {"code": 403, "message": "API key not valid"}}"#,
                ))
            });

        let connector = connector(mock_http);
        assert!(connector.test_connection().await.unwrap());
        assert!(!connector.test_connection().await.unwrap());
    }
}
