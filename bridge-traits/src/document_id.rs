//! Remote Document Identifiers
//!
//! Documents in a File Search store are addressed by hierarchical paths:
//!
//! ```text
//! fileSearchStores/{store}/documents/{doc}            current
//! fileSearchStores/{store}/upload/operations/{doc}    legacy: operation id stored as-is
//! corpora/{corpus}/documents/{doc}                    legacy: pre-store API
//! ```
//!
//! An operation id and a document id refer to the same resource; every
//! consumer must normalize before comparing or storing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const OPERATIONS_SEGMENT: &str = "/upload/operations/";
const DOCUMENTS_SEGMENT: &str = "/documents/";
const CORPUS_PREFIX: &str = "corpora/";

static STORE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(fileSearchStores/[^/]+)").expect("store prefix pattern is valid")
});

/// Rewrite operation-path ids into document-path ids.
///
/// Ids without an operations segment are returned unchanged. Idempotent.
pub fn normalize_document_id(raw: &str) -> String {
    let mut normalized = raw.to_string();
    while normalized.contains(OPERATIONS_SEGMENT) {
        normalized = normalized.replace(OPERATIONS_SEGMENT, DOCUMENTS_SEGMENT);
    }
    normalized
}

/// Backward-compatible identifier shapes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LegacyDocumentId {
    /// `.../upload/operations/{id}` as returned by the upload call
    Operation(String),
    /// `corpora/...`, owned by whichever store is configured
    Corpus(String),
}

/// Store that owns a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRef {
    /// Explicit `fileSearchStores/{id}` prefix
    Named(String),
    /// Legacy corpus ids belong to the globally configured store
    Configured,
    /// Prefix not recognised
    Unknown,
}

/// Identifier of a remote document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentId {
    Current(String),
    Legacy(LegacyDocumentId),
}

impl DocumentId {
    /// Classify a raw identifier string
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.contains(OPERATIONS_SEGMENT) {
            Self::Legacy(LegacyDocumentId::Operation(raw))
        } else if raw.starts_with(CORPUS_PREFIX) {
            Self::Legacy(LegacyDocumentId::Corpus(raw))
        } else {
            Self::Current(raw)
        }
    }

    /// Raw identifier exactly as stored
    pub fn as_str(&self) -> &str {
        match self {
            Self::Current(id) => id,
            Self::Legacy(LegacyDocumentId::Operation(id))
            | Self::Legacy(LegacyDocumentId::Corpus(id)) => id,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Convert operation ids to their document form.
    ///
    /// Corpus ids have no document-path equivalent and are kept as they are.
    pub fn normalize(&self) -> DocumentId {
        match self {
            Self::Legacy(LegacyDocumentId::Operation(id)) => {
                Self::Current(normalize_document_id(id))
            }
            other => other.clone(),
        }
    }

    /// Store owning this document
    pub fn store(&self) -> StoreRef {
        match self {
            Self::Legacy(LegacyDocumentId::Corpus(_)) => StoreRef::Configured,
            other => STORE_PATTERN
                .captures(other.as_str())
                .and_then(|caps| caps.get(1))
                .map(|m| StoreRef::Named(m.as_str().to_string()))
                .unwrap_or(StoreRef::Unknown),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DocumentId {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<&str> for DocumentId {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        match id {
            DocumentId::Current(raw)
            | DocumentId::Legacy(LegacyDocumentId::Operation(raw))
            | DocumentId::Legacy(LegacyDocumentId::Corpus(raw)) => raw,
        }
    }
}
