//! # Gemini Provider
//!
//! Implements `FileSearchProvider` for the Gemini File Search API (`v1beta`).
//!
//! ## Overview
//!
//! This module provides:
//! - Store management (create, list, delete)
//! - Resumable plain-text document uploads
//! - Document replacement, deletion and paginated listing
//! - Grounded generation and passage retrieval through the `file_search` tool

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{GeminiConfig, GeminiConnector};
pub use error::{GeminiError, Result};
