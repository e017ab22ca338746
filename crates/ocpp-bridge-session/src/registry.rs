//! Pending transaction registry.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Transaction ids pre-registered by remote start commands, keyed by charge point.
///
/// An id is put before the RemoteStartTransaction is dispatched and consumed
/// when that charge point next reports a StartTransaction. Entries never
/// expire; a stale one stays until it is consumed or overwritten.
#[derive(Debug, Default)]
pub struct PendingTransactions {
    entries: Mutex<HashMap<String, i32>>,
}

impl PendingTransactions {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `transaction_id` for `client_id`, replacing any existing entry.
    ///
    /// Returns the replaced id, if there was one.
    pub fn put(&self, client_id: impl Into<String>, transaction_id: i32) -> Option<i32> {
        self.entries.lock().insert(client_id.into(), transaction_id)
    }

    /// Remove and return the entry for `client_id`.
    pub fn take_if_present(&self, client_id: &str) -> Option<i32> {
        self.entries.lock().remove(client_id)
    }

    /// Number of unconsumed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether there are no unconsumed entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
