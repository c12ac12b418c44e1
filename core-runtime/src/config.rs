//! # Core Configuration Module
//!
//! Provides configuration management for the file search sync core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings. It enforces
//! fail-fast validation so missing bridges are reported before any sync runs.
//!
//! ## Dependencies
//!
//! - `HttpClient` - Outbound HTTPS (desktop default: reqwest)
//! - `SettingsStore` - Host options (desktop default: SQLite next to the database)
//! - `Clock` - Time source (default: system clock)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `HttpClient` and `SettingsStore` are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, SyncTuning};
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/var/lib/file-search/sync.db")
//!     .sync_tuning(SyncTuning {
//!         bulk_delay: Duration::from_secs(1),
//!         ..SyncTuning::default()
//!     })
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, SettingsStore, SystemClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Timing and limits of the sync orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTuning {
    /// A product synced more recently than this is not uploaded again
    pub debounce_window: Duration,
    /// Pause between products during a bulk sync
    pub bulk_delay: Duration,
    /// Maximum length (in characters) of an error message stored in the sync log
    pub max_error_message_len: usize,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_secs(10),
            bulk_delay: Duration::from_millis(500),
            max_error_message_len: 500,
        }
    }
}

impl SyncTuning {
    pub fn validate(&self) -> Result<()> {
        if self.max_error_message_len == 0 {
            return Err(Error::Config(
                "Error message cap must be greater than 0 characters".to_string(),
            ));
        }

        if self.bulk_delay > Duration::from_secs(60) {
            return Err(Error::Config(
                "Bulk delay exceeds maximum of 60 seconds".to_string(),
            ));
        }

        if self.debounce_window > Duration::from_secs(3600) {
            return Err(Error::Config(
                "Debounce window exceeds maximum of 1 hour".to_string(),
            ));
        }

        Ok(())
    }
}

/// Gemini REST endpoints and per-request limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiEndpoints {
    /// Base URL for JSON calls
    pub api_base: String,
    /// Base URL for the resumable upload init call
    pub upload_base: String,
    /// Model used for grounded generation
    pub model: String,
    /// Timeout of ordinary API calls
    pub request_timeout: Duration,
    /// Timeout of the content upload call
    pub upload_timeout: Duration,
}

impl Default for GeminiEndpoints {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            upload_base: "https://generativelanguage.googleapis.com/upload/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiEndpoints {
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("API base", &self.api_base), ("Upload base", &self.upload_base)] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
            if url.ends_with('/') {
                return Err(Error::Config(format!(
                    "{} must not end with '/', got '{}'",
                    name, url
                )));
            }
        }

        if self.model.trim().is_empty() {
            return Err(Error::Config("Model name cannot be empty".to_string()));
        }

        if self.request_timeout.is_zero() || self.upload_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Core configuration for the sync core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database holding the sync log
    pub database_path: PathBuf,

    /// HTTP client for the Gemini API
    pub http_client: Arc<dyn HttpClient>,

    /// Host options storage
    pub settings_store: Arc<dyn SettingsStore>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Orchestrator timing
    pub sync: SyncTuning,

    /// Remote API endpoints
    pub gemini: GeminiEndpoints,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("clock", &"Clock { ... }")
            .field("sync", &self.sync)
            .field("gemini", &self.gemini)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        self.sync.validate()?;
        self.gemini.validate()?;

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the Gemini API. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Embedded hosts: inject an adapter over the host's HTTP stack."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for the API key and active store. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
                 Embedded hosts: inject an adapter over the host's option table."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to initialize default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let candidate = database_path.with_file_name("settings.db");

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on panics inside a runtime, so build the store on a fresh thread there
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(candidate))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(candidate)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
    sync: Option<SyncTuning>,
    gemini: Option<GeminiEndpoints>,
}

impl CoreConfigBuilder {
    /// Sets the path of the SQLite database holding the sync log.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Overrides the time source (tests use a fixed clock).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn sync_tuning(mut self, tuning: SyncTuning) -> Self {
        self.sync = Some(tuning);
        self
    }

    pub fn gemini_endpoints(mut self, endpoints: GeminiEndpoints) -> Self {
        self.gemini = Some(endpoints);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The database path is missing
    /// - Required bridges are missing and no desktop default is available
    /// - Tuning or endpoint values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let gemini = self.gemini.unwrap_or_default();

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(gemini.upload_timeout)?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(&database_path)?,
        };

        let config = CoreConfig {
            database_path,
            http_client,
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            sync: self.sync.unwrap_or_default(),
            gemini,
        };

        config.validate()?;

        Ok(config)
    }
}
