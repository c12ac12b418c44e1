//! # Orphan Reconciler
//!
//! Removes local log rows whose document no longer exists in the remote
//! store. Drift comes from partial failures (a replacement whose delete
//! silently failed) and from documents removed on the provider side.

use crate::{
    record::SyncRecord, repository::SyncLogRepository, state::ProductSyncStateRepository, Result,
};
use bridge_traits::{catalog::ProductId, document_id::DocumentId, search::FileSearchProvider};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Result of an orphan cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanCleanupReport {
    /// Local rows removed
    pub cleaned: usize,
    /// Local successful sync rows examined
    pub total: usize,
    /// Documents present in the remote store
    pub remote: usize,
}

/// Local rows whose normalized document id is not in `remote`
///
/// `remote` must already hold normalized ids.
pub fn find_orphans<'a>(
    remote: &HashSet<DocumentId>,
    local: &'a [SyncRecord],
) -> Vec<&'a SyncRecord> {
    local
        .iter()
        .filter(|record| match record.normalized_document_id() {
            Some(document_id) => !remote.contains(&document_id),
            None => true,
        })
        .collect()
}

pub struct OrphanReconciler {
    provider: Arc<dyn FileSearchProvider>,
    log: Arc<dyn SyncLogRepository>,
    state: Arc<dyn ProductSyncStateRepository>,
}

impl OrphanReconciler {
    pub fn new(
        provider: Arc<dyn FileSearchProvider>,
        log: Arc<dyn SyncLogRepository>,
        state: Arc<dyn ProductSyncStateRepository>,
    ) -> Self {
        Self {
            provider,
            log,
            state,
        }
    }

    /// Every document id in `store_id`, normalized, following all pages
    async fn remote_documents(&self, store_id: &str) -> Result<HashSet<DocumentId>> {
        let mut documents = HashSet::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .provider
                .list_documents(store_id, page_token.take())
                .await?;
            documents.extend(page.documents.into_iter().map(|doc| doc.id.normalize()));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Compare the log with the remote store and delete rows for missing documents
    ///
    /// Products left without any successful sync row also lose their
    /// document pointer and last sync time. Fails without touching the log
    /// when the remote listing fails.
    #[instrument(skip(self))]
    pub async fn clean_orphans(&self, store_id: &str) -> Result<OrphanCleanupReport> {
        let remote = self.remote_documents(store_id).await?;
        let local = self.log.successful_syncs().await?;

        let orphans = find_orphans(&remote, &local);
        let mut affected: BTreeSet<ProductId> = BTreeSet::new();

        for record in &orphans {
            self.log.delete_by_id(record.id).await?;
            affected.insert(record.product_id);
            debug!(
                product_id = %record.product_id,
                document_id = %record.document_id,
                "Removed orphaned log row"
            );
        }

        for product_id in affected {
            if self.log.count_successful_for_product(product_id).await? == 0 {
                self.state.clear(product_id).await?;
                debug!(product_id = %product_id, "Cleared sync state of orphaned product");
            }
        }

        let report = OrphanCleanupReport {
            cleaned: orphans.len(),
            total: local.len(),
            remote: remote.len(),
        };

        info!(
            cleaned = report.cleaned,
            total = report.total,
            remote = report.remote,
            "Orphan cleanup completed"
        );
        Ok(report)
    }
}
