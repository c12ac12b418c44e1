//! # Sync & Indexing Module
//!
//! Keeps the File Search store in step with the product catalog.
//!
//! ## Overview
//!
//! This module manages:
//! - Building the indexed text of each product
//! - Creating and replacing remote documents
//! - The durable sync log and per-product document pointers
//! - Bulk syncs and orphan cleanup
//!
//! ## Components
//!
//! - **Content Builder** (`content`): Product → plain text, and back to a product id
//! - **Records** (`record`): Sync log row types
//! - **Repositories** (`repository`, `state`): SQLite persistence
//! - **Database** (`db`): Pool creation and migrations
//! - **Sync Coordinator** (`coordinator`): Single and bulk syncs, deletions
//! - **Orphan Reconciler** (`reconciler`): Log cleanup against the remote store

pub mod content;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod reconciler;
pub mod record;
pub mod repository;
pub mod state;

pub use coordinator::{BulkSyncFailure, BulkSyncReport, SyncCoordinator, SyncRun};
pub use error::{Result, SyncError};
pub use reconciler::{find_orphans, OrphanCleanupReport, OrphanReconciler};
pub use record::{NewSyncRecord, SyncAction, SyncRecord, SyncStatus};
pub use repository::{SqliteSyncLogRepository, SyncLogRepository};
pub use state::{
    ProductSyncState, ProductSyncStateRepository, SqliteProductSyncStateRepository,
};
