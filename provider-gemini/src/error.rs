//! Error types for the Gemini provider

use bridge_traits::error::{BridgeError, ProviderFailure};
use thiserror::Error;

/// Gemini provider errors
#[derive(Error, Debug)]
pub enum GeminiError {
    /// API key or store missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// API request returned a 4xx/5xx status
    #[error("Gemini API error (status {status_code}): {message}")]
    Api {
        status_code: u16,
        /// `error.status`, e.g. `INVALID_ARGUMENT`
        error_status: Option<String>,
        /// `error.code`
        error_code: Option<i64>,
        message: String,
    },

    /// The resumable upload start call did not return a session URL
    #[error("Upload URL not received (status {status})")]
    UploadUrlMissing { status: u16 },

    /// The finalized upload did not return an operation name
    #[error("Upload finished without an operation id")]
    MissingOperationId,

    /// The owning store of a document could not be determined
    #[error("Could not determine the File Search store for document {0}")]
    UnresolvableStore(String),

    /// Resource already gone
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Gemini operations
pub type Result<T> = std::result::Result<T, GeminiError>;

impl From<GeminiError> for BridgeError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::Configuration(msg) => BridgeError::Configuration(msg),
            GeminiError::Api {
                status_code,
                error_status,
                error_code,
                message,
            } => BridgeError::Provider(ProviderFailure {
                status: status_code,
                code: error_code,
                status_text: error_status,
                message,
            }),
            GeminiError::UploadUrlMissing { status } => BridgeError::OperationFailed(format!(
                "Upload URL not received. Status: {}",
                status
            )),
            GeminiError::MissingOperationId => {
                BridgeError::OperationFailed("Upload operation id not received".to_string())
            }
            GeminiError::UnresolvableStore(document_id) => BridgeError::Configuration(format!(
                "Could not determine the File Search store for document {}",
                document_id
            )),
            GeminiError::NotFound(resource) => BridgeError::NotFound(resource),
            GeminiError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            GeminiError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GeminiError::Api {
            status_code: 403,
            error_status: Some("PERMISSION_DENIED".to_string()),
            error_code: Some(403),
            message: "API key not valid".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Gemini API error (status 403): API key not valid"
        );
    }

    #[test]
    fn test_api_error_keeps_structure() {
        let error = GeminiError::Api {
            status_code: 400,
            error_status: Some("INVALID_ARGUMENT".to_string()),
            error_code: Some(400),
            message: "Bad request".to_string(),
        };

        let bridge_error: BridgeError = error.into();
        match bridge_error {
            BridgeError::Provider(failure) => {
                assert_eq!(failure.status, 400);
                assert_eq!(
                    failure.detailed_message(),
                    "Bad request [Status: INVALID_ARGUMENT] [Code: 400]"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_conversion() {
        let bridge_error: BridgeError =
            GeminiError::NotFound("fileSearchStores/s/documents/d".to_string()).into();
        assert!(matches!(bridge_error, BridgeError::NotFound(_)));
    }
}
