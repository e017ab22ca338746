//! OCPP-J wire framing.
//!
//! Every frame is a JSON array:
//! - CALL: `[2, messageId, action, payload]`
//! - CALLRESULT: `[3, messageId, payload]`
//! - CALLERROR: `[4, messageId, errorCode, errorDescription, errorDetails]`

use ocpp_bridge_core::{ErrorCode, RemoteError};
use serde_json::{Value, json};
use thiserror::Error;

/// WebSocket subprotocol negotiated with charge points.
pub const OCPP_SUBPROTOCOL: &str = "ocpp1.6";

/// OCPP-J message type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call = 2,
    CallResult = 3,
    CallError = 4,
}

/// Framing error.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid frame: {0}")]
    Invalid(&'static str),
    #[error("Unknown message type: {0}")]
    UnknownMessageType(i64),
}

/// Request frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub message_id: String,
    /// Kept as received; unknown actions are answered with `NotImplemented`.
    pub action: String,
    pub payload: Value,
}

/// Success response frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub message_id: String,
    pub payload: Value,
}

/// Error response frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CallError {
    pub message_id: String,
    pub error_code: ErrorCode,
    pub error_description: String,
    pub error_details: Value,
}

impl CallError {
    /// Error frame with empty details.
    #[must_use]
    pub fn new(
        message_id: impl Into<String>,
        error_code: ErrorCode,
        error_description: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            error_code,
            error_description: error_description.into(),
            error_details: json!({}),
        }
    }

    /// Error frame carrying `error` in answer to `message_id`.
    #[must_use]
    pub fn from_remote(message_id: impl Into<String>, error: RemoteError) -> Self {
        Self {
            message_id: message_id.into(),
            error_code: error.code,
            error_description: error.description,
            error_details: error.details,
        }
    }

    /// Content of this frame as seen by the caller that issued the request.
    #[must_use]
    pub fn into_remote(self) -> RemoteError {
        RemoteError {
            code: self.error_code,
            description: self.error_description,
            details: self.error_details,
        }
    }
}

/// Any OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OcppMessage {
    Call(Call),
    CallResult(CallResult),
    CallError(CallError),
}

impl OcppMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    /// Returns error if the text is not a well-formed OCPP-J frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: Vec<Value> = serde_json::from_str(text)?;
        let kind = frame
            .first()
            .and_then(Value::as_i64)
            .ok_or(FrameError::Invalid("missing message type id"))?;
        let message_id = frame
            .get(1)
            .and_then(Value::as_str)
            .ok_or(FrameError::Invalid("missing message id"))?
            .to_string();

        match kind {
            2 => {
                let [_, _, action, payload] = frame.as_slice() else {
                    return Err(FrameError::Invalid("CALL must have 4 elements"));
                };
                let action = action
                    .as_str()
                    .ok_or(FrameError::Invalid("action must be a string"))?
                    .to_string();
                Ok(Self::Call(Call {
                    message_id,
                    action,
                    payload: payload.clone(),
                }))
            }
            3 => {
                let [_, _, payload] = frame.as_slice() else {
                    return Err(FrameError::Invalid("CALLRESULT must have 3 elements"));
                };
                Ok(Self::CallResult(CallResult {
                    message_id,
                    payload: payload.clone(),
                }))
            }
            4 => {
                let [_, _, code, description, details] = frame.as_slice() else {
                    return Err(FrameError::Invalid("CALLERROR must have 5 elements"));
                };
                Ok(Self::CallError(CallError {
                    message_id,
                    error_code: code.as_str().map_or(ErrorCode::GenericError, ErrorCode::from_wire),
                    error_description: description.as_str().unwrap_or_default().to_string(),
                    error_details: details.clone(),
                }))
            }
            other => Err(FrameError::UnknownMessageType(other)),
        }
    }

    /// Serialize to a text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        let frame = match self {
            Self::Call(call) => json!([
                MessageType::Call as i32,
                call.message_id,
                call.action,
                call.payload
            ]),
            Self::CallResult(result) => json!([
                MessageType::CallResult as i32,
                result.message_id,
                result.payload
            ]),
            Self::CallError(error) => json!([
                MessageType::CallError as i32,
                error.message_id,
                error.error_code.as_str(),
                error.error_description,
                error.error_details
            ]),
        };
        serde_json::to_string(&frame)
    }

    /// Message id of the frame.
    #[must_use]
    pub fn message_id(&self) -> &str {
        match self {
            Self::Call(c) => &c.message_id,
            Self::CallResult(r) => &r.message_id,
            Self::CallError(e) => &e.message_id,
        }
    }
}

/// Message id of a text that looks like a CALL, even if the frame is otherwise malformed.
///
/// Used to answer broken requests with a CALLERROR instead of dropping them.
#[must_use]
pub fn call_message_id(text: &str) -> Option<String> {
    let frame: Vec<Value> = serde_json::from_str(text).ok()?;
    if frame.first().and_then(Value::as_i64) != Some(MessageType::Call as i64) {
        return None;
    }
    frame.get(1).and_then(Value::as_str).map(str::to_string)
}
