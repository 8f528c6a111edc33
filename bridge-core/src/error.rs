//! Error types for bridge operations

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The API listener could not be bound. Fatal at startup.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The inbound request never completed its header block, or its request line
    /// had fewer than two tokens
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors returned to API clients
    #[error("Client error: {0}")]
    Client(String),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a failed `/history/{n}` lookup.
///
/// `InvalidIndex` means the path segment never parsed; `NotFound` means it parsed but no
/// retained entry carries that index (evicted, out of range or negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Invalid index")]
    InvalidIndex,
    #[error("Item not found")]
    NotFound,
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Client(err.to_string())
    }
}
