//! Network surfaces of the OCPP command bridge.
//!
//! Provides:
//! - Wire protocol (OCPP-J frames)
//! - WebSocket session engine for charge points (`CentralSystem`)
//! - HTTP command router with an operator console

pub mod http;
pub mod protocol;
pub mod websocket;

pub use http::{ApiError, create_command_router};
pub use protocol::{FrameError, OCPP_SUBPROTOCOL, OcppMessage};
pub use websocket::CentralSystem;
