//! Bounded capture history
//!
//! [`HistoryStore`] is the only shared mutable state in the bridge. The capture path
//! appends to it from whatever thread the host drives, while any number of API
//! connections take snapshots of it. A single lock covers both sides.
//!
//! Entry indexes are assigned from the store length at append time. Once the store is
//! full, eviction keeps the length pinned at capacity, so retained entries no longer sit
//! at the position their `index` names and later appends reuse the same index value.
//! Lookups therefore search by the stored field, never by position.

use crate::error::LookupError;
use crate::serde_helpers::base64_bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::debug;

/// One recorded request/response transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEntry {
    pub index: usize,
    pub host: String,
    pub port: u16,
    pub protocol: String,
    #[serde(rename = "request", with = "base64_bytes")]
    pub request_raw: Vec<u8>,
    #[serde(rename = "response", with = "base64_bytes")]
    pub response_raw: Vec<u8>,
    pub request_text: String,
    pub response_length: usize,
    pub method: String,
    pub url: String,
    #[serde(rename = "headers")]
    pub request_headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub response_headers: Vec<String>,
}

impl CaptureEntry {
    /// Raw request bytes, as they crossed the wire. Base64 only exists in the JSON
    /// form; deserializing an entry already decodes it.
    pub fn request_bytes(&self) -> &[u8] {
        &self.request_raw
    }

    /// Raw response bytes, as they crossed the wire.
    pub fn response_bytes(&self) -> &[u8] {
        &self.response_raw
    }
}

/// Aggregate view over one snapshot of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_requests: usize,
    /// Distinct destination hosts, sorted
    pub hosts: Vec<String>,
    /// Occurrence count per request method
    pub methods: BTreeMap<String, usize>,
}

/// Thread-safe, size-bounded FIFO log of capture entries.
#[derive(Debug)]
pub struct HistoryStore {
    entries: RwLock<VecDeque<Arc<CaptureEntry>>>,
    max_history: usize,
}

impl HistoryStore {
    /// Create an empty store holding at most `max_history` entries.
    ///
    /// A capacity of zero is raised to one so the store can always hold the latest
    /// capture.
    pub fn new(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_history.min(1024))),
            max_history,
        }
    }

    // Entries are immutable once pushed, so a panic in another holder cannot leave a
    // half-written entry behind; recovering the guard is sound.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<Arc<CaptureEntry>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry and return the index assigned to it.
    ///
    /// The index is the store length before this append, then the oldest entries are
    /// evicted until the store is back within capacity.
    pub fn append(&self, mut entry: CaptureEntry) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let assigned = entries.len();
        entry.index = assigned;
        entries.push_back(Arc::new(entry));

        let mut evicted = 0usize;
        while entries.len() > self.max_history {
            entries.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!(evicted, retained = entries.len(), "evicted oldest captures");
        }
        assigned
    }

    /// Point-in-time snapshot of every retained entry, oldest first.
    pub fn get_all(&self) -> Vec<Arc<CaptureEntry>> {
        self.read().iter().cloned().collect()
    }

    /// Find the oldest retained entry whose stored `index` equals `index`.
    pub fn get_by_index(&self, index: i64) -> Result<Arc<CaptureEntry>, LookupError> {
        let wanted = usize::try_from(index).map_err(|_| LookupError::NotFound)?;
        self.read()
            .iter()
            .find(|e| e.index == wanted)
            .cloned()
            .ok_or(LookupError::NotFound)
    }

    /// Totals computed over a single snapshot.
    pub fn stats(&self) -> HistoryStats {
        let entries = self.read();
        let hosts: BTreeSet<&str> = entries.iter().map(|e| e.host.as_str()).collect();
        let mut methods = BTreeMap::new();
        for entry in entries.iter() {
            *methods.entry(entry.method.clone()).or_insert(0) += 1;
        }
        HistoryStats {
            total_requests: entries.len(),
            hosts: hosts.into_iter().map(str::to_string).collect(),
            methods,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_history
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_HISTORY)
    }
}
