//! Error taxonomy for commands and inbound message handling.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// OCPP-J CALLERROR codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    NotImplemented,
    NotSupported,
    InternalError,
    ProtocolError,
    SecurityError,
    FormationViolation,
    PropertyConstraintViolation,
    // Spelling as published in OCPP-J 1.6.
    OccurenceConstraintViolation,
    TypeConstraintViolation,
    GenericError,
}

impl ErrorCode {
    /// Parse a wire code, mapping anything unrecognised to `GenericError`.
    #[must_use]
    pub fn from_wire(code: &str) -> Self {
        serde_json::from_value(Value::String(code.to_string())).unwrap_or(Self::GenericError)
    }

    /// Wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotImplemented => "NotImplemented",
            Self::NotSupported => "NotSupported",
            Self::InternalError => "InternalError",
            Self::ProtocolError => "ProtocolError",
            Self::SecurityError => "SecurityError",
            Self::FormationViolation => "FormationViolation",
            Self::PropertyConstraintViolation => "PropertyConstraintViolation",
            Self::OccurenceConstraintViolation => "OccurenceConstraintViolation",
            Self::TypeConstraintViolation => "TypeConstraintViolation",
            Self::GenericError => "GenericError",
        }
    }
}

/// Failure reported by the remote side of a call (CALLERROR content).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {description}")]
pub struct RemoteError {
    pub code: ErrorCode,
    pub description: String,
    pub details: Value,
}

impl RemoteError {
    /// Remote error with empty details.
    #[must_use]
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// The connection went away before the call was answered.
    #[must_use]
    pub fn connection_closed() -> Self {
        Self::new(
            ErrorCode::GenericError,
            "connection closed before a confirmation was received",
        )
    }
}

/// Synchronous rejection of an outbound command by the session engine.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Charge point not connected: {0}")]
    NotConnected(String),
    #[error("Connection to charge point {0} is closed")]
    ConnectionClosed(String),
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outcome of a failed bridge command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("Charge point rejected the request: {0}")]
    Remote(#[from] RemoteError),
    #[error("Timeout after {0:?} waiting for the charge point")]
    Timeout(Duration),
}

/// Failure of an inbound handler, answered to the device as a CALLERROR.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// CALLERROR code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotSupported(_) => ErrorCode::NotSupported,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_wire() {
        assert_eq!(ErrorCode::from_wire("NotImplemented"), ErrorCode::NotImplemented);
        assert_eq!(
            ErrorCode::from_wire("OccurenceConstraintViolation"),
            ErrorCode::OccurenceConstraintViolation
        );
        assert_eq!(ErrorCode::from_wire("SomethingElse"), ErrorCode::GenericError);
    }

    #[test]
    fn test_timeout_is_distinct_from_remote() {
        let timeout = CommandError::Timeout(Duration::from_secs(10));
        let remote = CommandError::from(RemoteError::new(ErrorCode::GenericError, "Timeout"));
        assert!(matches!(timeout, CommandError::Timeout(_)));
        assert!(matches!(remote, CommandError::Remote(_)));
        assert!(timeout.to_string().starts_with("Timeout after"));
    }
}
