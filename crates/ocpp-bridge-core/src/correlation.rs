//! Per-call correlation between a dispatched command and its completion.
//!
//! Every outbound command registers a waiter keyed by a fresh correlation id.
//! The session engine receives the `Completion` half and resolves it at most once;
//! the caller awaits the `Waiter` half with a deadline. Dropping either half
//! unregisters the id, so a completion arriving after the caller gave up is
//! discarded instead of lingering in the table.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::RemoteError;

/// What a completed call delivers: the raw confirmation payload or the remote failure.
pub type CallOutcome = Result<Value, RemoteError>;

/// Correlation token for one in-flight call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Table of in-flight calls awaiting a completion.
#[derive(Debug, Default)]
pub struct PendingCalls {
    waiters: Mutex<HashMap<CorrelationId, oneshot::Sender<CallOutcome>>>,
}

impl PendingCalls {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new call, returning the engine-side and caller-side halves.
    #[must_use]
    pub fn register(self: &Arc<Self>) -> (Completion, Waiter) {
        let id = CorrelationId(Uuid::new_v4());
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(id, tx);

        let completion = Completion {
            id,
            calls: Arc::downgrade(self),
        };
        let waiter = Waiter {
            id,
            calls: Arc::clone(self),
            rx,
        };
        (completion, waiter)
    }

    /// Number of calls still waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Whether no call is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }

    fn contains(&self, id: CorrelationId) -> bool {
        self.waiters.lock().contains_key(&id)
    }

    fn take(&self, id: CorrelationId) -> Option<oneshot::Sender<CallOutcome>> {
        self.waiters.lock().remove(&id)
    }
}

/// Engine-side handle that resolves one call exactly once.
#[derive(Debug)]
pub struct Completion {
    id: CorrelationId,
    calls: Weak<PendingCalls>,
}

impl Completion {
    /// Correlation id of the call.
    #[must_use]
    pub const fn id(&self) -> CorrelationId {
        self.id
    }

    /// Hand the outcome to the caller's channel.
    ///
    /// Returns `false` when the call was already unregistered (timed out or gone)
    /// and the outcome is dropped. `true` only means the outcome reached the
    /// channel; a caller whose deadline fires concurrently on another thread may
    /// still report a timeout and never observe it.
    pub fn complete(self, outcome: CallOutcome) -> bool {
        let Some(tx) = self.take_sender() else {
            tracing::debug!(correlation_id = %self.id, "Discarding completion for abandoned call");
            return false;
        };
        tx.send(outcome).is_ok()
    }

    /// Whether the caller has already stopped waiting for this call.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.calls
            .upgrade()
            .is_none_or(|calls| !calls.contains(self.id))
    }

    fn take_sender(&self) -> Option<oneshot::Sender<CallOutcome>> {
        self.calls.upgrade()?.take(self.id)
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        // Unresolved: closing the sender wakes the waiter with `Abandoned`.
        drop(self.take_sender());
    }
}

/// Why a waiter stopped without an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("No completion within {0:?}")]
    Timeout(Duration),
    #[error("Completion dropped without an outcome")]
    Abandoned,
}

/// Caller-side half of a call.
#[derive(Debug)]
pub struct Waiter {
    id: CorrelationId,
    calls: Arc<PendingCalls>,
    rx: oneshot::Receiver<CallOutcome>,
}

impl Waiter {
    /// Correlation id of the call.
    #[must_use]
    pub const fn id(&self) -> CorrelationId {
        self.id
    }

    /// Wait for the outcome, giving up after `deadline`.
    ///
    /// # Errors
    /// Returns `WaitError::Timeout` when the deadline elapses first and
    /// `WaitError::Abandoned` when the completion was dropped unresolved.
    pub async fn wait(mut self, deadline: Duration) -> Result<CallOutcome, WaitError> {
        match tokio::time::timeout(deadline, &mut self.rx).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(WaitError::Abandoned),
            Err(_) => Err(WaitError::Timeout(deadline)),
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.calls.take(self.id);
    }
}
