//! # Runtime Settings
//!
//! Options the host keeps in its key-value store. They are read at the start
//! of every operation so changes made by an administrator apply immediately.

use crate::error::{Error, Result};
use bridge_traits::storage::SettingsStore;
use serde::{Deserialize, Serialize};

/// Setting keys
pub mod keys {
    pub const GEMINI_API_KEY: &str = "gemini_api_key";
    pub const FILE_SEARCH_STORE_ID: &str = "file_search_store_id";
    pub const SYNC_ON_SAVE: &str = "sync_on_save";
    pub const LAST_BULK_SYNC_AT: &str = "last_bulk_sync_at";
    pub const LAST_BULK_SYNC_REPORT: &str = "last_bulk_sync_report";
}

/// Snapshot of the host options relevant to syncing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Gemini API key; `None` when unset or blank
    pub api_key: Option<String>,
    /// Active File Search store; `None` when unset or blank
    pub store_id: Option<String>,
    /// Sync products automatically when they are saved
    pub sync_on_save: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            store_id: None,
            sync_on_save: true,
        }
    }
}

impl RuntimeSettings {
    /// Read the current options from the settings store
    pub async fn load(store: &dyn SettingsStore) -> Result<Self> {
        let api_key = non_blank(store.get_string(keys::GEMINI_API_KEY).await?);
        let store_id = non_blank(store.get_string(keys::FILE_SEARCH_STORE_ID).await?);
        let sync_on_save = store.get_bool(keys::SYNC_ON_SAVE).await?.unwrap_or(true);

        Ok(Self {
            api_key,
            store_id,
            sync_on_save,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "Gemini API key is not configured. Set the '{}' option.",
                keys::GEMINI_API_KEY
            ))
        })
    }

    pub fn require_store_id(&self) -> Result<&str> {
        self.store_id.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "No File Search store is configured. Create one or set the '{}' option.",
                keys::FILE_SEARCH_STORE_ID
            ))
        })
    }

    /// Make `store_id` the active store
    pub async fn set_active_store(store: &dyn SettingsStore, store_id: &str) -> Result<()> {
        store
            .set_string(keys::FILE_SEARCH_STORE_ID, store_id)
            .await?;
        Ok(())
    }
}

/// Last completed bulk sync as persisted in the settings store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSyncStamp {
    /// Completion time, Unix seconds
    pub completed_at: i64,
    /// JSON-encoded report
    pub report: String,
}

impl BulkSyncStamp {
    pub async fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        store
            .set_i64(keys::LAST_BULK_SYNC_AT, self.completed_at)
            .await?;
        store
            .set_string(keys::LAST_BULK_SYNC_REPORT, &self.report)
            .await?;
        Ok(())
    }

    pub async fn load(store: &dyn SettingsStore) -> Result<Option<Self>> {
        let Some(completed_at) = store.get_i64(keys::LAST_BULK_SYNC_AT).await? else {
            return Ok(None);
        };
        let report = store
            .get_string(keys::LAST_BULK_SYNC_REPORT)
            .await?
            .unwrap_or_default();

        Ok(Some(Self {
            completed_at,
            report,
        }))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
