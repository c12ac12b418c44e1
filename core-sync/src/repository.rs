//! # Sync Log Repository
//!
//! Provides database persistence for sync log rows.
//!
//! ## Overview
//!
//! The log is append-only from the orchestrator's point of view. Rows are
//! removed in three situations:
//! - after an update, for the document it replaced
//! - after a product's document is deleted
//! - by orphan reconciliation

use crate::{NewSyncRecord, Result, SyncError, SyncRecord};
use async_trait::async_trait;
use bridge_traits::catalog::ProductId;
use sqlx::{FromRow, SqlitePool};

// ============================================================================
// Repository Trait
// ============================================================================

/// Repository trait for sync log persistence
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    /// Append a row, returning its id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn insert(&self, record: &NewSyncRecord) -> Result<i64>;

    /// Most recent row for a product
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn latest_for_product(&self, product_id: ProductId) -> Result<Option<SyncRecord>>;

    /// Most recent rows across all products
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn recent(&self, limit: u32) -> Result<Vec<SyncRecord>>;

    /// Every successful sync row
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn successful_syncs(&self) -> Result<Vec<SyncRecord>>;

    /// Delete a product's rows that reference `document_id` exactly
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn delete_for_document(&self, product_id: ProductId, document_id: &str) -> Result<u64>;

    /// Delete a single row
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn delete_by_id(&self, id: i64) -> Result<()>;

    /// Number of successful sync rows left for a product
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn count_successful_for_product(&self, product_id: ProductId) -> Result<i64>;

    /// Successful sync rows whose document lives in `store_id`, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn local_documents_for_store(&self, store_id: &str) -> Result<Vec<SyncRecord>>;

    /// Distinct products with a successful sync row in `store_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    async fn count_products_for_store(&self, store_id: &str) -> Result<i64>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of SyncLogRepository
pub struct SqliteSyncLogRepository {
    pool: SqlitePool,
}

impl SqliteSyncLogRepository {
    /// Create a new SQLite sync log repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a sync log entry
#[derive(Debug, FromRow)]
struct SyncLogRow {
    id: i64,
    product_id: i64,
    document_id: String,
    action: String,
    sync_status: String,
    synced_at: i64,
    error_message: Option<String>,
}

impl TryFrom<SyncLogRow> for SyncRecord {
    type Error = SyncError;

    fn try_from(row: SyncLogRow) -> Result<Self> {
        Ok(SyncRecord {
            id: row.id,
            product_id: ProductId::new(row.product_id),
            document_id: row.document_id,
            action: row.action.parse()?,
            status: row.sync_status.parse()?,
            synced_at: row.synced_at,
            error_message: row.error_message,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, product_id, document_id, action, sync_status, synced_at, error_message FROM sync_log";

fn store_prefix(store_id: &str) -> String {
    format!("{}/", store_id.trim_end_matches('/'))
}

fn convert_rows(rows: Vec<SyncLogRow>) -> Result<Vec<SyncRecord>> {
    rows.into_iter().map(SyncRecord::try_from).collect()
}

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn insert(&self, record: &NewSyncRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sync_log (
                product_id, document_id, action, sync_status, synced_at, error_message
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.product_id.get())
        .bind(&record.document_id)
        .bind(record.action.as_str())
        .bind(record.status.as_str())
        .bind(record.synced_at)
        .bind(&record.error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn latest_for_product(&self, product_id: ProductId) -> Result<Option<SyncRecord>> {
        let sql = format!(
            "{} WHERE product_id = ? ORDER BY synced_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row: Option<SyncLogRow> = sqlx::query_as(&sql)
            .bind(product_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;

        row.map(SyncRecord::try_from).transpose()
    }

    async fn recent(&self, limit: u32) -> Result<Vec<SyncRecord>> {
        let sql = format!("{} ORDER BY synced_at DESC, id DESC LIMIT ?", SELECT_COLUMNS);
        let rows: Vec<SyncLogRow> = sqlx::query_as(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;

        convert_rows(rows)
    }

    async fn successful_syncs(&self) -> Result<Vec<SyncRecord>> {
        let sql = format!(
            "{} WHERE action = 'sync' AND sync_status = 'success' ORDER BY id",
            SELECT_COLUMNS
        );
        let rows: Vec<SyncLogRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;

        convert_rows(rows)
    }

    async fn delete_for_document(&self, product_id: ProductId, document_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sync_log WHERE product_id = ? AND document_id = ?")
            .bind(product_id.get())
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sync_log WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count_successful_for_product(&self, product_id: ProductId) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sync_log WHERE product_id = ? AND action = 'sync' AND sync_status = 'success'",
        )
        .bind(product_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(count.0)
    }

    async fn local_documents_for_store(&self, store_id: &str) -> Result<Vec<SyncRecord>> {
        let sql = format!(
            "{} WHERE action = 'sync' AND sync_status = 'success' AND instr(document_id, ?) = 1 \
             ORDER BY synced_at DESC, id DESC",
            SELECT_COLUMNS
        );
        let rows: Vec<SyncLogRow> = sqlx::query_as(&sql)
            .bind(store_prefix(store_id))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;

        convert_rows(rows)
    }

    async fn count_products_for_store(&self, store_id: &str) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT product_id) FROM sync_log \
             WHERE action = 'sync' AND sync_status = 'success' AND instr(document_id, ?) = 1",
        )
        .bind(store_prefix(store_id))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(count.0)
    }
}
