//! # Product Sync State
//!
//! The two pieces of sync metadata attached to a product: its current
//! remote document and when it was last synced. A product has at most one
//! current document.

use crate::{Result, SyncError};
use async_trait::async_trait;
use bridge_traits::catalog::ProductId;
use bridge_traits::document_id::DocumentId;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Current document pointer of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSyncState {
    pub product_id: ProductId,
    pub document_id: DocumentId,
    /// Unix seconds
    pub last_synced_at: i64,
}

/// Repository trait for per-product sync state
#[async_trait]
pub trait ProductSyncStateRepository: Send + Sync {
    async fn get(&self, product_id: ProductId) -> Result<Option<ProductSyncState>>;

    /// Insert or replace the product's state
    async fn upsert(&self, state: &ProductSyncState) -> Result<()>;

    /// Forget the product's document and last sync time
    async fn clear(&self, product_id: ProductId) -> Result<()>;
}

/// SQLite implementation of ProductSyncStateRepository
pub struct SqliteProductSyncStateRepository {
    pool: SqlitePool,
}

impl SqliteProductSyncStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProductSyncStateRow {
    product_id: i64,
    document_id: String,
    last_synced_at: i64,
}

impl From<ProductSyncStateRow> for ProductSyncState {
    fn from(row: ProductSyncStateRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            document_id: DocumentId::parse(row.document_id),
            last_synced_at: row.last_synced_at,
        }
    }
}

#[async_trait]
impl ProductSyncStateRepository for SqliteProductSyncStateRepository {
    async fn get(&self, product_id: ProductId) -> Result<Option<ProductSyncState>> {
        let row: Option<ProductSyncStateRow> = sqlx::query_as(
            "SELECT product_id, document_id, last_synced_at FROM product_sync_state WHERE product_id = ?",
        )
        .bind(product_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(row.map(ProductSyncState::from))
    }

    async fn upsert(&self, state: &ProductSyncState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_sync_state (product_id, document_id, last_synced_at)
            VALUES (?, ?, ?)
            ON CONFLICT(product_id) DO UPDATE SET
                document_id = excluded.document_id,
                last_synced_at = excluded.last_synced_at
            "#,
        )
        .bind(state.product_id.get())
        .bind(state.document_id.as_str())
        .bind(state.last_synced_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, product_id: ProductId) -> Result<()> {
        sqlx::query("DELETE FROM product_sync_state WHERE product_id = ?")
            .bind(product_id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;

        Ok(())
    }
}
