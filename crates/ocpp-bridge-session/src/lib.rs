//! Command bridge and inbound event handling for charge points.
//!
//! Provides:
//! - `CommandBridge` - Remote start/stop and reset with confirmation timeout
//! - `EventHandler` - Core profile handler and connection hooks
//! - `PendingTransactions` - Transaction ids awaiting a StartTransaction

pub mod bridge;
pub mod handler;
pub mod registry;

pub use bridge::{COMMAND_TIMEOUT, CommandBridge};
pub use handler::EventHandler;
pub use registry::PendingTransactions;
