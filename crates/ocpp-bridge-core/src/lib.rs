//! Core abstractions for the OCPP command bridge.
//!
//! This crate provides the building blocks shared by the bridge and the session engine:
//! - `types` - OCPP 1.6 core profile requests and confirmations
//! - `PendingCalls` / `Completion` / `Waiter` - per-call correlation
//! - `CoreHandler`, `ConnectionHooks`, `CommandDispatcher` - the engine contracts
//! - Error taxonomy for commands and inbound handling

pub mod correlation;
pub mod error;
pub mod traits;
pub mod types;

pub use correlation::{CallOutcome, Completion, CorrelationId, PendingCalls, WaitError, Waiter};
pub use error::{CommandError, DispatchError, ErrorCode, HandlerError, RemoteError};
pub use traits::{CommandDispatcher, ConnectionHooks, CoreHandler, OutboundCall, OutboundRequest};
pub use types::Action;
