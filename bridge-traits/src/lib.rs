//! # Host Bridge Traits
//!
//! Abstraction traits that the host application implements for the sync core.
//!
//! ## Overview
//!
//! This crate defines the contract between the core and the host it is
//! embedded in. Each trait represents a capability that the core requires but
//! that the host provides: the product catalog, option storage, outbound HTTP,
//! and the remote file search store.
//!
//! ## Traits
//!
//! ### Host Data
//! - [`ProductCatalog`](catalog::ProductCatalog) - Read-only product access
//! - [`SettingsStore`](storage::SettingsStore) - Key-value options storage
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP
//! - [`FileSearchProvider`](search::FileSearchProvider) - Remote store operations
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Transport
//! failures ([`BridgeError::Transport`]) are kept apart from API failures
//! ([`BridgeError::Provider`]) so the sync log can record both faithfully.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent usage
//! across async tasks.

pub mod catalog;
pub mod document_id;
pub mod error;
pub mod http;
pub mod search;
pub mod storage;
pub mod time;

pub use error::{BridgeError, ProviderFailure, TransportKind};

// Re-export commonly used types
pub use catalog::{Product, ProductAttribute, ProductCatalog, ProductId, ProductKind, PublishStatus, StockStatus};
pub use document_id::{normalize_document_id, DocumentId, LegacyDocumentId, StoreRef};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use search::{
    DocumentPage, FileSearchProvider, GroundedAnswer, GroundingChunk, RemoteDocument, RemoteStore,
};
pub use storage::SettingsStore;
pub use time::{Clock, SystemClock};
