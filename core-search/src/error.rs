use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Provider error: {0}")]
    Provider(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
