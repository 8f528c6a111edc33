//! Bridge Core Library
//!
//! Captures completed request/response pairs from an interception host into a bounded
//! in-memory history and serves that history over a loopback HTTP/JSON API.

/// Capture adapter and intercepted-message types
pub mod capture;
/// HTTP client for the history API
pub mod client;

/// Configuration types and utilities
pub mod config;
pub mod context;

/// Error types for bridge operations
pub mod error;
pub mod history;
pub mod request;
pub mod response;
pub mod router;
pub mod scanner;
/// Loopback API server
pub mod server;
pub mod serde_helpers;

pub use capture::{CaptureAdapter, InterceptedMessage, MessageInfo, ServiceDescriptor};
pub use client::{BridgeClient, HealthInfo, StatsInfo};
pub use config::BridgeConfig;
pub use context::{BridgeContext, ShutdownSignal};
pub use error::{BridgeError, LookupError};
pub use history::{CaptureEntry, HistoryStats, HistoryStore};
pub use scanner::{Finding, Severity};
pub use server::BridgeServer;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

pub const EXTENSION_NAME: &str = "Burp AI Bridge";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = "Can Hieu";
