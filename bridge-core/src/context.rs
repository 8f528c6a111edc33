//! Service context shared by the acceptor and the capture path.

use crate::capture::CaptureAdapter;
use crate::config::BridgeConfig;
use crate::history::HistoryStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

/// Running flag plus a wake-up for an acceptor parked in `accept()`.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting new connections. In-flight connections finish on their own.
    pub fn trigger(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
        self.notify.notify_waiters();
    }

    pub(crate) fn notify(&self) -> &Notify {
        &self.notify
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one bridge instance owns. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct BridgeContext {
    config: Arc<BridgeConfig>,
    history: Arc<HistoryStore>,
    shutdown: ShutdownSignal,
}

impl BridgeContext {
    pub fn new(config: BridgeConfig) -> Self {
        let history = Arc::new(HistoryStore::new(config.max_history));
        Self {
            config: Arc::new(config),
            history,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Adapter to register with the interception host.
    pub fn capture_adapter(&self) -> CaptureAdapter {
        CaptureAdapter::new(Arc::clone(&self.history))
    }
}
