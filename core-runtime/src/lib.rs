//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the file search sync core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Host options (API key, active store, sync-on-save)
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other crates depend on. It
//! establishes the configuration surface and the logging conventions used
//! throughout the workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod settings;

pub use error::{Error, Result};
