use bridge_traits::catalog::ProductId;
use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Product {product_id} is not valid or not published")]
    InvalidProduct { product_id: ProductId },

    #[error("Provider error: {0}")]
    Provider(#[from] BridgeError),

    #[error("Sync of product {product_id} already failed in this run: {message}")]
    AlreadyFailed {
        product_id: ProductId,
        message: String,
    },

    #[error("Invalid sync status: {0}")]
    InvalidStatus(String),

    #[error("Invalid sync action: {0}")]
    InvalidAction(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl SyncError {
    /// Only transport failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Provider(e) if e.is_transport())
    }

    /// Message written to the sync log
    pub fn log_message(&self) -> String {
        match self {
            SyncError::Provider(e) => e.log_message(),
            other => other.to_string(),
        }
    }
}

impl From<core_runtime::Error> for SyncError {
    fn from(error: core_runtime::Error) -> Self {
        match error {
            core_runtime::Error::Settings(e) => SyncError::Provider(e),
            other => SyncError::Configuration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
