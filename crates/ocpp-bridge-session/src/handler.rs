//! Inbound event handler for charge point initiated messages.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ocpp_bridge_core::{
    Action, ConnectionHooks, CoreHandler, HandlerError,
    types::{
        AuthorizationStatus, AuthorizeConfirmation, AuthorizeRequest, BootNotificationConfirmation,
        BootNotificationRequest, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_TRANSACTION_ID,
        DataTransferConfirmation, DataTransferRequest, DataTransferStatus, HeartbeatConfirmation,
        HeartbeatRequest, IdTagInfo, MeterValuesConfirmation, MeterValuesRequest,
        RegistrationStatus, StartTransactionConfirmation, StartTransactionRequest,
        StatusNotificationConfirmation, StatusNotificationRequest, StopTransactionConfirmation,
        StopTransactionRequest,
    },
};
use serde::Serialize;

use crate::registry::PendingTransactions;

/// Accept-everything handler for the core profile.
///
/// Every message is answered with an accepted/default confirmation and logged
/// together with its confirmation. StartTransaction consumes the transaction id
/// pre-registered for the charge point, if any.
#[derive(Debug, Clone)]
pub struct EventHandler {
    transactions: Arc<PendingTransactions>,
}

impl EventHandler {
    /// Create a handler sharing the given registry.
    #[must_use]
    pub const fn new(transactions: Arc<PendingTransactions>) -> Self {
        Self { transactions }
    }

    fn log_exchange(
        client_id: &str,
        action: Action,
        request: &impl Serialize,
        confirmation: &impl Serialize,
    ) {
        tracing::info!(
            client_id,
            %action,
            request = %to_json(request),
            confirmation = %to_json(confirmation),
            "Handled charge point message"
        );
    }
}

fn to_json(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

#[async_trait]
impl CoreHandler for EventHandler {
    async fn on_authorize(
        &self,
        client_id: &str,
        request: AuthorizeRequest,
    ) -> Result<AuthorizeConfirmation, HandlerError> {
        let confirmation = AuthorizeConfirmation {
            id_tag_info: IdTagInfo::new(AuthorizationStatus::Accepted),
        };
        Self::log_exchange(client_id, Action::Authorize, &request, &confirmation);
        Ok(confirmation)
    }

    async fn on_boot_notification(
        &self,
        client_id: &str,
        request: BootNotificationRequest,
    ) -> Result<BootNotificationConfirmation, HandlerError> {
        let confirmation = BootNotificationConfirmation {
            current_time: Utc::now(),
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            status: RegistrationStatus::Accepted,
        };
        Self::log_exchange(client_id, Action::BootNotification, &request, &confirmation);
        Ok(confirmation)
    }

    async fn on_data_transfer(
        &self,
        client_id: &str,
        request: DataTransferRequest,
    ) -> Result<DataTransferConfirmation, HandlerError> {
        let confirmation = DataTransferConfirmation {
            status: DataTransferStatus::Accepted,
            data: None,
        };
        Self::log_exchange(client_id, Action::DataTransfer, &request, &confirmation);
        Ok(confirmation)
    }

    async fn on_heartbeat(
        &self,
        client_id: &str,
        request: HeartbeatRequest,
    ) -> Result<HeartbeatConfirmation, HandlerError> {
        let confirmation = HeartbeatConfirmation {
            current_time: Utc::now(),
        };
        Self::log_exchange(client_id, Action::Heartbeat, &request, &confirmation);
        Ok(confirmation)
    }

    async fn on_meter_values(
        &self,
        client_id: &str,
        request: MeterValuesRequest,
    ) -> Result<MeterValuesConfirmation, HandlerError> {
        let confirmation = MeterValuesConfirmation {};
        Self::log_exchange(client_id, Action::MeterValues, &request, &confirmation);
        Ok(confirmation)
    }

    async fn on_status_notification(
        &self,
        client_id: &str,
        request: StatusNotificationRequest,
    ) -> Result<StatusNotificationConfirmation, HandlerError> {
        let confirmation = StatusNotificationConfirmation {};
        Self::log_exchange(client_id, Action::StatusNotification, &request, &confirmation);
        Ok(confirmation)
    }

    async fn on_start_transaction(
        &self,
        client_id: &str,
        request: StartTransactionRequest,
    ) -> Result<StartTransactionConfirmation, HandlerError> {
        let transaction_id = self
            .transactions
            .take_if_present(client_id)
            .unwrap_or(DEFAULT_TRANSACTION_ID);
        let confirmation = StartTransactionConfirmation {
            id_tag_info: IdTagInfo::new(AuthorizationStatus::Accepted),
            transaction_id,
        };
        Self::log_exchange(client_id, Action::StartTransaction, &request, &confirmation);
        Ok(confirmation)
    }

    async fn on_stop_transaction(
        &self,
        client_id: &str,
        request: StopTransactionRequest,
    ) -> Result<StopTransactionConfirmation, HandlerError> {
        let confirmation = StopTransactionConfirmation {
            id_tag_info: Some(IdTagInfo::new(AuthorizationStatus::Accepted)),
        };
        Self::log_exchange(client_id, Action::StopTransaction, &request, &confirmation);
        Ok(confirmation)
    }
}

impl ConnectionHooks for EventHandler {
    fn on_connect(&self, client_id: &str) {
        tracing::info!(client_id, "Charge point connected");
    }

    fn on_disconnect(&self, client_id: &str) {
        tracing::info!(client_id, "Charge point disconnected");
    }
}
