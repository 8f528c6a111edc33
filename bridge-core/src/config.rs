//! Configuration types and utilities

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Default listen address
pub const LOOPBACK: &str = "127.0.0.1";

/// Default API port
pub const DEFAULT_PORT: u16 = 8899;

/// Default number of capture entries retained before FIFO eviction
pub const DEFAULT_MAX_HISTORY: usize = 1000;

/// Default upper bound on an inbound request header block
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;

/// Static bridge configuration.
/// These settings are set at startup and do not change during runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address to listen on. Must be a loopback address.
    pub listen_address: String,
    /// Port to listen on
    pub listen_port: u16,
    /// Capacity of the history store
    pub max_history: usize,
    /// Largest request header block accepted from API clients
    pub max_header_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_address: LOOPBACK.to_string(),
            listen_port: DEFAULT_PORT,
            max_history: DEFAULT_MAX_HISTORY,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }
}

impl BridgeConfig {
    /// Reject settings the service cannot honor.
    pub fn validate(&self) -> Result<(), BridgeError> {
        let ip: IpAddr = self.listen_address.parse().map_err(|e| {
            BridgeError::Configuration(format!(
                "Invalid listen address '{}': {}",
                self.listen_address, e
            ))
        })?;
        if !ip.is_loopback() {
            return Err(BridgeError::Configuration(format!(
                "Listen address {} is not a loopback address",
                ip
            )));
        }
        if self.max_history == 0 {
            return Err(BridgeError::Configuration(
                "max_history must be at least 1".to_string(),
            ));
        }
        if self.max_header_bytes == 0 {
            return Err(BridgeError::Configuration(
                "max_header_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address the acceptor binds to. Validates first.
    pub fn socket_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.validate()?;
        let ip: IpAddr = self
            .listen_address
            .parse()
            .map_err(|e| BridgeError::Configuration(format!("Invalid listen address: {}", e)))?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }
}
