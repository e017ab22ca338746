//! Contracts between the core and the session protocol engine.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    Completion,
    error::{DispatchError, HandlerError},
    types::{
        Action, AuthorizeConfirmation, AuthorizeRequest, BootNotificationConfirmation,
        BootNotificationRequest, DataTransferConfirmation, DataTransferRequest,
        HeartbeatConfirmation, HeartbeatRequest, MeterValuesConfirmation, MeterValuesRequest,
        StartTransactionConfirmation, StartTransactionRequest, StatusNotificationConfirmation,
        StatusNotificationRequest, StopTransactionConfirmation, StopTransactionRequest,
    },
};

/// A request the central system sends to a charge point.
pub trait OutboundRequest: Serialize + Send {
    /// Action name on the wire.
    const ACTION: Action;
    /// Confirmation the charge point answers with.
    type Confirmation: DeserializeOwned + Serialize + Send;
}

/// An encoded outbound request, ready for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCall {
    pub action: Action,
    pub payload: Value,
}

impl OutboundCall {
    /// Encode a typed request.
    ///
    /// # Errors
    /// Returns error if the request cannot be serialized.
    pub fn encode<R: OutboundRequest>(request: &R) -> Result<Self, DispatchError> {
        Ok(Self {
            action: R::ACTION,
            payload: serde_json::to_value(request)?,
        })
    }
}

/// Outbound half of the session engine.
///
/// `dispatch` must either fail synchronously or take ownership of the
/// completion and resolve it once the charge point answers. Dropping the
/// completion unresolved (for example when the connection closes) ends the
/// caller's wait early.
pub trait CommandDispatcher: Send + Sync {
    /// Send `call` to the charge point identified by `client_id`.
    ///
    /// # Errors
    /// Returns error if the charge point is not connected or the call cannot be sent.
    fn dispatch(
        &self,
        client_id: &str,
        call: OutboundCall,
        completion: Completion,
    ) -> Result<(), DispatchError>;
}

/// Handler for messages initiated by charge points (core profile).
///
/// The engine invokes these concurrently; one invocation per inbound message.
#[async_trait]
pub trait CoreHandler: Send + Sync {
    async fn on_authorize(
        &self,
        client_id: &str,
        request: AuthorizeRequest,
    ) -> Result<AuthorizeConfirmation, HandlerError>;

    async fn on_boot_notification(
        &self,
        client_id: &str,
        request: BootNotificationRequest,
    ) -> Result<BootNotificationConfirmation, HandlerError>;

    async fn on_data_transfer(
        &self,
        client_id: &str,
        request: DataTransferRequest,
    ) -> Result<DataTransferConfirmation, HandlerError>;

    async fn on_heartbeat(
        &self,
        client_id: &str,
        request: HeartbeatRequest,
    ) -> Result<HeartbeatConfirmation, HandlerError>;

    async fn on_meter_values(
        &self,
        client_id: &str,
        request: MeterValuesRequest,
    ) -> Result<MeterValuesConfirmation, HandlerError>;

    async fn on_status_notification(
        &self,
        client_id: &str,
        request: StatusNotificationRequest,
    ) -> Result<StatusNotificationConfirmation, HandlerError>;

    async fn on_start_transaction(
        &self,
        client_id: &str,
        request: StartTransactionRequest,
    ) -> Result<StartTransactionConfirmation, HandlerError>;

    async fn on_stop_transaction(
        &self,
        client_id: &str,
        request: StopTransactionRequest,
    ) -> Result<StopTransactionConfirmation, HandlerError>;
}

/// Connection lifecycle callbacks.
pub trait ConnectionHooks: Send + Sync {
    /// A charge point connected.
    fn on_connect(&self, client_id: &str);

    /// A charge point disconnected.
    fn on_disconnect(&self, client_id: &str);
}
