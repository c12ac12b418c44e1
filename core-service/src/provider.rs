//! Per-operation provider construction
//!
//! The API key and active store are host options that may change between
//! calls, so a provider is built from the current settings each time.

use std::sync::Arc;

use bridge_traits::http::HttpClient;
use bridge_traits::search::FileSearchProvider;
use core_runtime::config::GeminiEndpoints;
use core_runtime::settings::RuntimeSettings;
use provider_gemini::{GeminiConfig, GeminiConnector};

use crate::error::Result;

/// Builds a `FileSearchProvider` for the current settings
pub trait ProviderFactory: Send + Sync {
    fn connect(&self, settings: &RuntimeSettings) -> Result<Arc<dyn FileSearchProvider>>;
}

/// Factory producing Gemini connectors
pub struct GeminiProviderFactory {
    http_client: Arc<dyn HttpClient>,
    endpoints: GeminiEndpoints,
}

impl GeminiProviderFactory {
    pub fn new(http_client: Arc<dyn HttpClient>, endpoints: GeminiEndpoints) -> Self {
        Self {
            http_client,
            endpoints,
        }
    }
}

impl ProviderFactory for GeminiProviderFactory {
    fn connect(&self, settings: &RuntimeSettings) -> Result<Arc<dyn FileSearchProvider>> {
        let api_key = settings.require_api_key()?;
        let config = GeminiConfig::new(api_key)
            .with_configured_store(settings.store_id.clone())
            .with_endpoints(self.endpoints.clone());

        let connector = GeminiConnector::new(Arc::clone(&self.http_client), config)?;
        Ok(Arc::new(connector))
    }
}
