//! Gemini API request and response types
//!
//! Data structures for the File Search store endpoints and
//! `models/{model}:generateContent` with the `file_search` tool.

use serde::{Deserialize, Serialize};

/// Error envelope returned with 4xx/5xx responses
///
/// See: https://ai.google.dev/api/rest/v1beta/Status
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// Numeric code (usually mirrors the HTTP status)
    pub code: Option<i64>,
    pub message: Option<String>,
    /// Symbolic status such as `INVALID_ARGUMENT`
    pub status: Option<String>,
}

/// `fileSearchStores` resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearchStoreResource {
    /// `fileSearchStores/{id}`
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Creation time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest<'a> {
    pub display_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStoresResponse {
    #[serde(default)]
    pub file_search_stores: Vec<FileSearchStoreResource>,

    pub next_page_token: Option<String>,
}

/// Metadata sent with the resumable upload start command
#[derive(Debug, Serialize)]
pub struct UploadStartRequest<'a> {
    pub display_name: &'a str,
}

/// Operation returned once the upload is finalized
#[derive(Debug, Deserialize)]
pub struct UploadOperation {
    /// `fileSearchStores/{store}/upload/operations/{id}`
    pub name: Option<String>,
}

/// `fileSearchStores.documents` resource
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResource {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<DocumentResource>,

    pub next_page_token: Option<String>,
}

/// `generateContent` request body with a single user turn
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub tools: Vec<Tool>,
}

impl GenerateContentRequest {
    pub fn with_file_search(prompt: impl Into<String>, store_id: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            tools: vec![Tool {
                file_search: FileSearchTool {
                    file_search_store_names: vec![store_id.into()],
                },
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Tool {
    pub file_search: FileSearchTool,
}

#[derive(Debug, Serialize)]
pub struct FileSearchTool {
    pub file_search_store_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,

    /// Kept raw so callers can pass it through untouched
    pub grounding_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

/// Typed view over `groundingMetadata`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<RawGroundingChunk>,
}

/// A grounding chunk in either response shape
///
/// Current responses carry `retrievedContext.text`; older ones nest the
/// text under `chunk.data.stringValue`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGroundingChunk {
    pub retrieved_context: Option<RetrievedContext>,
    pub chunk: Option<LegacyChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrievedContext {
    pub text: Option<String>,
    pub title: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LegacyChunk {
    pub data: Option<LegacyChunkData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyChunkData {
    pub string_value: Option<String>,
}

impl RawGroundingChunk {
    /// Text of the chunk, whichever shape it came in
    pub fn text(&self) -> Option<&str> {
        let current = self
            .retrieved_context
            .as_ref()
            .and_then(|ctx| ctx.text.as_deref())
            .filter(|text| !text.is_empty());
        let legacy = || {
            self.chunk
                .as_ref()
                .and_then(|c| c.data.as_ref())
                .and_then(|d| d.string_value.as_deref())
                .filter(|text| !text.is_empty())
        };

        current.or_else(legacy)
    }
}
