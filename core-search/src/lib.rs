//! # Search Module
//!
//! Semantic and AI-assisted product search over the File Search store
//! kept up to date by `core-sync`.
//!
//! Each retrieved chunk is mapped back to a catalog product through the
//! `ID del producto:` line the content builder writes.

pub mod error;
pub mod results;
pub mod service;

pub use error::{Result, SearchError};
pub use results::{AiSearchResponse, ProductResult, SearchResponse};
pub use service::{SearchService, DEFAULT_LIMIT};
