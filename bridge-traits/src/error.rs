use std::fmt;

use thiserror::Error;

/// What went wrong below the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The request did not complete before its deadline
    Timeout,
    /// No connection could be established
    Connect,
    /// Any other I/O level failure (TLS, body read, redirect loop)
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connect"),
            Self::Other => write!(f, "transport"),
        }
    }
}

/// Structured failure reported by a remote API (HTTP 4xx/5xx)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// HTTP status code
    pub status: u16,
    /// Numeric provider error code (`error.code`)
    pub code: Option<i64>,
    /// Symbolic provider status (`error.status`, e.g. `NOT_FOUND`)
    pub status_text: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl ProviderFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            status_text: None,
            message: message.into(),
        }
    }

    /// Message augmented with provider status/code, as written to the sync log
    pub fn detailed_message(&self) -> String {
        let mut message = self.message.clone();
        if let Some(status_text) = &self.status_text {
            message.push_str(&format!(" [Status: {}]", status_text));
        }
        if let Some(code) = self.code {
            message.push_str(&format!(" [Code: {}]", code));
        }
        message
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network {kind} error: {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("Provider error: {0}")]
    Provider(ProviderFailure),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Transport failures may succeed when the caller tries again
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Message suitable for the sync log, with provider status/code appended
    pub fn log_message(&self) -> String {
        match self {
            Self::Provider(failure) => failure.detailed_message(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
