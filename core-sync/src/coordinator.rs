//! # Sync Coordinator
//!
//! Keeps each product's remote document in step with the catalog.
//!
//! ## Workflow
//!
//! ### Single product
//! 1. Claim the product in the current [`SyncRun`] (one remote write per run)
//! 2. Skip when the product was synced within the debounce window
//! 3. Build the document text from the catalog product
//! 4. Create a document, or replace the current one
//! 5. After a replacement, drop log rows that point at the old document
//! 6. Append one log row and store the new document pointer
//!
//! ### Bulk
//! Every published product in catalog order, one at a time, pausing between
//! products. Failures are collected, never fatal.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncCoordinator, SyncRun};
//!
//! let run = SyncRun::new();
//! let document_id = coordinator.sync(&run, ProductId::new(42)).await?;
//! let report = coordinator.bulk_sync(&SyncRun::new()).await?;
//! println!("{} synced, {} failed", report.success, report.failed);
//! ```

use crate::{
    content,
    record::{NewSyncRecord, SyncAction},
    repository::SyncLogRepository,
    state::{ProductSyncState, ProductSyncStateRepository},
    Result, SyncError,
};
use bridge_traits::{
    catalog::{ProductCatalog, ProductId},
    document_id::DocumentId,
    error::BridgeError,
    search::FileSearchProvider,
    time::Clock,
};
use core_runtime::config::SyncTuning;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Outcome shared by every trigger of one product within a run
type SyncOutcome = std::result::Result<DocumentId, String>;

/// Scope inside which each product is synced at most once
///
/// Concurrent triggers for the same product wait for the first one and get
/// its outcome. A failure is not retried within the same run.
#[derive(Debug)]
pub struct SyncRun {
    id: Uuid,
    claims: Mutex<HashMap<ProductId, Arc<OnceCell<SyncOutcome>>>>,
}

impl SyncRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            claims: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of products claimed so far
    pub async fn claimed(&self) -> usize {
        self.claims.lock().await.len()
    }

    async fn claim(&self, product_id: ProductId) -> Arc<OnceCell<SyncOutcome>> {
        self.claims
            .lock()
            .await
            .entry(product_id)
            .or_default()
            .clone()
    }
}

impl Default for SyncRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-product failure in a bulk sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSyncFailure {
    pub product_id: ProductId,
    pub error: String,
}

/// Aggregate result of a bulk sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSyncReport {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<BulkSyncFailure>,
}

impl BulkSyncReport {
    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// First `limit` failures, one `#{id}: {error}` line each
    pub fn error_summary(&self, limit: usize) -> Vec<String> {
        self.errors
            .iter()
            .take(limit)
            .map(|failure| format!("#{}: {}", failure.product_id, failure.error))
            .collect()
    }
}

/// Sync coordinator for a single File Search store
pub struct SyncCoordinator {
    provider: Arc<dyn FileSearchProvider>,
    catalog: Arc<dyn ProductCatalog>,
    log: Arc<dyn SyncLogRepository>,
    state: Arc<dyn ProductSyncStateRepository>,
    clock: Arc<dyn Clock>,
    tuning: SyncTuning,
    /// Store new documents are created in
    store_id: Option<String>,
}

impl SyncCoordinator {
    pub fn new(
        provider: Arc<dyn FileSearchProvider>,
        catalog: Arc<dyn ProductCatalog>,
        log: Arc<dyn SyncLogRepository>,
        state: Arc<dyn ProductSyncStateRepository>,
        clock: Arc<dyn Clock>,
        tuning: SyncTuning,
    ) -> Self {
        Self {
            provider,
            catalog,
            log,
            state,
            clock,
            tuning,
            store_id: None,
        }
    }

    /// Set the store new documents are created in
    pub fn with_store(mut self, store_id: Option<String>) -> Self {
        self.store_id = store_id.filter(|id| !id.trim().is_empty());
        self
    }

    fn require_store(&self) -> Result<&str> {
        self.store_id.as_deref().ok_or_else(|| {
            SyncError::Configuration("No File Search store is configured".to_string())
        })
    }

    fn debounce_secs(&self) -> i64 {
        i64::try_from(self.tuning.debounce_window.as_secs()).unwrap_or(i64::MAX)
    }

    /// Sync one product, at most once per `run`
    ///
    /// Returns the product's current document id. Later triggers in the same
    /// run get the first trigger's outcome without touching the provider.
    pub async fn sync(&self, run: &SyncRun, product_id: ProductId) -> Result<DocumentId> {
        let cell = run.claim(product_id).await;

        let mut fresh_failure: Option<SyncError> = None;
        let failure_slot = &mut fresh_failure;

        let outcome = cell
            .get_or_init(move || async move {
                self.sync_product(product_id).await.map_err(|e| {
                    let message = e.log_message();
                    *failure_slot = Some(e);
                    message
                })
            })
            .await;

        match outcome {
            Ok(document_id) => Ok(document_id.clone()),
            Err(message) => Err(fresh_failure.unwrap_or_else(|| {
                debug!(product_id = %product_id, run_id = %run.id(), "Skipping duplicate sync");
                SyncError::AlreadyFailed {
                    product_id,
                    message: message.clone(),
                }
            })),
        }
    }

    #[instrument(skip_all, fields(product_id = %product_id))]
    async fn sync_product(&self, product_id: ProductId) -> Result<DocumentId> {
        let now = self.clock.unix_timestamp();
        let existing = match self.state.get(product_id).await {
            Ok(existing) => existing,
            Err(e) => return Err(self.record_failure(product_id, SyncAction::Sync, e).await),
        };

        if let Some(state) = &existing {
            if now - state.last_synced_at < self.debounce_secs() {
                debug!(
                    document_id = %state.document_id,
                    last_synced_at = state.last_synced_at,
                    "Product synced recently, skipping"
                );
                return Ok(state.document_id.clone());
            }
        }

        let product = match self.catalog.get_product(product_id).await {
            Ok(Some(product)) if product.is_published() => product,
            Ok(_) => {
                return Err(self
                    .record_failure(product_id, SyncAction::Sync, SyncError::InvalidProduct { product_id })
                    .await)
            }
            Err(e) => {
                return Err(self
                    .record_failure(product_id, SyncAction::Sync, SyncError::Provider(e))
                    .await)
            }
        };

        let store_id = self.require_store()?;
        let text = content::build_content(&product);
        let display_name = content::display_name(&product);

        let result = match &existing {
            Some(state) => {
                debug!(document_id = %state.document_id, "Replacing existing document");
                self.provider
                    .update_document(&state.document_id, &display_name, &text)
                    .await
            }
            None => {
                debug!(store_id = %store_id, "Creating document");
                self.provider
                    .create_document(store_id, &display_name, &text)
                    .await
            }
        };

        let document_id = match result {
            Ok(document_id) => document_id,
            Err(e) => {
                return Err(self
                    .record_failure(product_id, SyncAction::Sync, SyncError::Provider(e))
                    .await)
            }
        };

        if let Some(state) = &existing {
            let removed = self.forget_document(product_id, &state.document_id).await?;
            debug!(old_document_id = %state.document_id, removed, "Removed log rows of replaced document");
        }

        self.log
            .insert(&NewSyncRecord::success(
                product_id,
                SyncAction::Sync,
                &document_id,
                now,
            ))
            .await?;
        self.state
            .upsert(&ProductSyncState {
                product_id,
                document_id: document_id.clone(),
                last_synced_at: now,
            })
            .await?;

        info!(document_id = %document_id, "Product synced");
        Ok(document_id)
    }

    /// Sync every published product, pausing between products
    ///
    /// Individual failures are collected in the report; only catalog,
    /// configuration and database errors abort the run.
    #[instrument(skip_all, fields(run_id = %run.id()))]
    pub async fn bulk_sync(&self, run: &SyncRun) -> Result<BulkSyncReport> {
        self.require_store()?;
        let product_ids = self.catalog.list_published_ids().await?;

        info!(count = product_ids.len(), "Starting bulk sync");

        let mut report = BulkSyncReport::default();
        for (index, product_id) in product_ids.into_iter().enumerate() {
            if index > 0 && !self.tuning.bulk_delay.is_zero() {
                tokio::time::sleep(self.tuning.bulk_delay).await;
            }

            match self.sync(run, product_id).await {
                Ok(_) => report.success += 1,
                Err(e @ SyncError::Database(_)) => return Err(e),
                Err(e) => {
                    report.failed += 1;
                    report.errors.push(BulkSyncFailure {
                        product_id,
                        error: e.log_message(),
                    });
                }
            }
        }

        info!(
            success = report.success,
            failed = report.failed,
            "Bulk sync completed"
        );
        Ok(report)
    }

    /// Remove a product's document after the product is deleted
    ///
    /// Returns the removed document id, `None` when the product had none.
    /// A document that is already gone remotely counts as removed.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<Option<DocumentId>> {
        let Some(state) = self.state.get(product_id).await? else {
            debug!("Product has no remote document");
            return Ok(None);
        };

        self.remove_document(&state.document_id, Some(product_id))
            .await
            .map(Some)
    }

    /// Delete a remote document and, when `product_id` is given, the local
    /// records that point at it
    #[instrument(skip_all, fields(document_id = %document_id))]
    pub async fn remove_document(
        &self,
        document_id: &DocumentId,
        product_id: Option<ProductId>,
    ) -> Result<DocumentId> {
        let normalized = document_id.normalize();

        match self.provider.delete_document(document_id).await {
            Ok(()) => {}
            Err(BridgeError::NotFound(_)) => {
                warn!("Document already deleted remotely");
            }
            Err(e) => {
                let error = SyncError::Provider(e);
                return Err(match product_id {
                    Some(product_id) => {
                        self.record_failure(product_id, SyncAction::Delete, error)
                            .await
                    }
                    None => error,
                });
            }
        }

        if let Some(product_id) = product_id {
            self.forget_document(product_id, document_id).await?;
            self.state.clear(product_id).await?;
            self.log
                .insert(&NewSyncRecord::success(
                    product_id,
                    SyncAction::Delete,
                    &normalized,
                    self.clock.unix_timestamp(),
                ))
                .await?;
        }

        info!(document_id = %normalized, "Document removed");
        Ok(normalized)
    }

    /// Delete a product's log rows for `document_id` in raw and normalized form
    async fn forget_document(&self, product_id: ProductId, document_id: &DocumentId) -> Result<u64> {
        let mut removed = self
            .log
            .delete_for_document(product_id, document_id.as_str())
            .await?;

        let normalized = document_id.normalize();
        if normalized != *document_id {
            removed += self
                .log
                .delete_for_document(product_id, normalized.as_str())
                .await?;
        }

        Ok(removed)
    }

    /// Append an error row for a failed attempt and hand the error back
    async fn record_failure(
        &self,
        product_id: ProductId,
        action: SyncAction,
        error: SyncError,
    ) -> SyncError {
        error!(product_id = %product_id, action = action.as_str(), error = %error, "Sync attempt failed");

        let record = NewSyncRecord::failure(
            product_id,
            action,
            &error.log_message(),
            self.tuning.max_error_message_len,
            self.clock.unix_timestamp(),
        );
        if let Err(log_error) = self.log.insert(&record).await {
            warn!(product_id = %product_id, error = %log_error, "Could not write sync log row");
        }

        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let report = BulkSyncReport {
            success: 3,
            failed: 2,
            errors: vec![
                BulkSyncFailure {
                    product_id: ProductId::new(4),
                    error: "quota".to_string(),
                },
                BulkSyncFailure {
                    product_id: ProductId::new(9),
                    error: "timeout".to_string(),
                },
            ],
        };

        assert_eq!(report.total(), 5);
        assert_eq!(report.error_summary(1), vec!["#4: quota".to_string()]);
    }

    #[test]
    fn test_report_serializes_with_plain_ids() {
        let report = BulkSyncReport {
            success: 1,
            failed: 1,
            errors: vec![BulkSyncFailure {
                product_id: ProductId::new(7),
                error: "boom".to_string(),
            }],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][0]["product_id"], 7);
        assert_eq!(json["success"], 1);
    }

    #[tokio::test]
    async fn test_run_claims_each_product_once() {
        let run = SyncRun::new();
        let first = run.claim(ProductId::new(1)).await;
        let again = run.claim(ProductId::new(1)).await;
        let other = run.claim(ProductId::new(2)).await;

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(run.claimed().await, 2);
    }
}
