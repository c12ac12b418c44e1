//! # Sync Log Records
//!
//! One row per sync or delete attempt. Rows are never updated; they are
//! superseded by newer rows or removed by cleanup.

use bridge_traits::catalog::ProductId;
use bridge_traits::document_id::DocumentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Result, SyncError};

/// Outcome of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

impl SyncStatus {
    /// Get the string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            _ => Err(SyncError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the attempt tried to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// Create or replace the product's document
    Sync,
    /// Remove the product's document
    Delete,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Sync => "sync",
            SyncAction::Delete => "delete",
        }
    }
}

impl FromStr for SyncAction {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sync" => Ok(SyncAction::Sync),
            "delete" => Ok(SyncAction::Delete),
            _ => Err(SyncError::InvalidAction(s.to_string())),
        }
    }
}

/// Stored log row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub id: i64,
    pub product_id: ProductId,
    /// Empty for failed attempts
    pub document_id: String,
    pub action: SyncAction,
    pub status: SyncStatus,
    /// Unix seconds
    pub synced_at: i64,
    pub error_message: Option<String>,
}

impl SyncRecord {
    /// Document id in documents-path form, `None` when the row has none
    pub fn normalized_document_id(&self) -> Option<DocumentId> {
        if self.document_id.is_empty() {
            None
        } else {
            Some(DocumentId::parse(self.document_id.as_str()).normalize())
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

/// Row to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncRecord {
    pub product_id: ProductId,
    pub document_id: String,
    pub action: SyncAction,
    pub status: SyncStatus,
    pub synced_at: i64,
    pub error_message: Option<String>,
}

impl NewSyncRecord {
    pub fn success(
        product_id: ProductId,
        action: SyncAction,
        document_id: &DocumentId,
        synced_at: i64,
    ) -> Self {
        Self {
            product_id,
            document_id: document_id.to_string(),
            action,
            status: SyncStatus::Success,
            synced_at,
            error_message: None,
        }
    }

    /// Failed attempt; the message is cut to `max_len` characters
    pub fn failure(
        product_id: ProductId,
        action: SyncAction,
        message: &str,
        max_len: usize,
        synced_at: i64,
    ) -> Self {
        Self {
            product_id,
            document_id: String::new(),
            action,
            status: SyncStatus::Error,
            synced_at,
            error_message: Some(truncate_chars(message, max_len)),
        }
    }
}

fn truncate_chars(message: &str, max_len: usize) -> String {
    match message.char_indices().nth(max_len) {
        Some((byte_index, _)) => message[..byte_index].to_string(),
        None => message.to_string(),
    }
}
