//! Read models returned by the status and store management operations

use bridge_traits::catalog::ProductId;
use bridge_traits::document_id::DocumentId;
use bridge_traits::search::RemoteStore;
use core_sync::{BulkSyncReport, SyncRecord};
use serde::{Deserialize, Serialize};

/// Remote store with the number of products synced into it locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub store: RemoteStore,
    /// Distinct products with a successful sync row under this store
    pub local_products: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOverview {
    pub stores: Vec<StoreSummary>,
    pub active_store: Option<String>,
}

/// A document the sync log says lives in a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDocument {
    pub document_id: String,
    pub product_id: ProductId,
    /// `None` once the product has been deleted from the catalog
    pub product_name: Option<String>,
    pub synced_at: i64,
}

impl LocalDocument {
    pub fn product_exists(&self) -> bool {
        self.product_name.is_some()
    }
}

/// Where a product stands with respect to the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSyncStatus {
    pub product_id: ProductId,
    pub document_id: Option<DocumentId>,
    pub last_synced_at: Option<i64>,
    /// Most recent log row, success or failure
    pub latest: Option<SyncRecord>,
}

impl ProductSyncStatus {
    pub fn is_synced(&self) -> bool {
        self.document_id.is_some()
    }
}

/// Last completed bulk sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastBulkSync {
    pub completed_at: i64,
    /// `None` when the stored report could not be read back
    pub report: Option<BulkSyncReport>,
}
