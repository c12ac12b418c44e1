use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store {0} is the active store; switch to another store before deleting it")]
    ActiveStore(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Search error: {0}")]
    Search(#[from] core_search::SearchError),

    #[error("Provider error: {0}")]
    Provider(#[from] bridge_traits::BridgeError),

    #[error("Gemini error: {0}")]
    Gemini(#[from] provider_gemini::GeminiError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Missing API key or store, at whatever layer it was detected
    pub fn is_configuration(&self) -> bool {
        use bridge_traits::BridgeError;

        match self {
            CoreError::Runtime(core_runtime::Error::Config(_)) => true,
            CoreError::Sync(core_sync::SyncError::Configuration(_)) => true,
            CoreError::Search(core_search::SearchError::Configuration(_)) => true,
            CoreError::Provider(BridgeError::Configuration(_)) => true,
            CoreError::Gemini(provider_gemini::GeminiError::Configuration(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
