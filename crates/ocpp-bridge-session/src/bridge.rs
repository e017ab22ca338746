//! Command bridge: synchronous commands on top of the asynchronous session engine.

use std::{sync::Arc, time::Duration};

use ocpp_bridge_core::{
    CommandDispatcher, CommandError, ErrorCode, OutboundCall, OutboundRequest, PendingCalls,
    RemoteError, WaitError,
    types::{
        ID_TAG_MAX_LEN, RemoteStartTransactionConfirmation, RemoteStartTransactionRequest,
        RemoteStopTransactionConfirmation, RemoteStopTransactionRequest, ResetConfirmation,
        ResetRequest, ResetType,
    },
};

use crate::registry::PendingTransactions;

/// How long a command waits for the charge point's confirmation.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues commands to charge points and waits for their confirmations.
///
/// Each command is dispatched through the session engine with a one-shot
/// completion, then awaited for at most [`COMMAND_TIMEOUT`].
pub struct CommandBridge<D>
where
    D: CommandDispatcher,
{
    dispatcher: D,
    transactions: Arc<PendingTransactions>,
    calls: Arc<PendingCalls>,
}

impl<D> CommandBridge<D>
where
    D: CommandDispatcher,
{
    /// Create a new bridge over `dispatcher`, pre-registering transaction ids in `transactions`.
    #[must_use]
    pub fn new(dispatcher: D, transactions: Arc<PendingTransactions>) -> Self {
        Self {
            dispatcher,
            transactions,
            calls: Arc::new(PendingCalls::new()),
        }
    }

    /// The underlying session engine.
    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Number of commands currently waiting for a confirmation.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }

    /// Ask a charge point to start a transaction for `id_tag`.
    ///
    /// `transaction_id` is registered for the charge point before dispatch and
    /// handed out when it reports the resulting StartTransaction.
    ///
    /// # Errors
    /// Returns error on invalid input, dispatch failure, remote rejection or timeout.
    pub async fn remote_start_transaction(
        &self,
        client_id: &str,
        id_tag: &str,
        transaction_id: i32,
    ) -> Result<RemoteStartTransactionConfirmation, CommandError> {
        validate_client_id(client_id)?;
        validate_id_tag(id_tag)?;

        if let Some(previous) = self.transactions.put(client_id, transaction_id) {
            tracing::warn!(
                client_id,
                previous,
                transaction_id,
                "Replaced unconsumed pending transaction id"
            );
        }

        self.call(client_id, RemoteStartTransactionRequest::new(id_tag))
            .await
    }

    /// Ask a charge point to stop `transaction_id`.
    ///
    /// # Errors
    /// Returns error on invalid input, dispatch failure, remote rejection or timeout.
    pub async fn remote_stop_transaction(
        &self,
        client_id: &str,
        transaction_id: i32,
    ) -> Result<RemoteStopTransactionConfirmation, CommandError> {
        validate_client_id(client_id)?;
        self.call(client_id, RemoteStopTransactionRequest { transaction_id })
            .await
    }

    /// Ask a charge point to reset.
    ///
    /// # Errors
    /// Returns error on invalid input, dispatch failure, remote rejection or timeout.
    pub async fn reset(
        &self,
        client_id: &str,
        kind: ResetType,
    ) -> Result<ResetConfirmation, CommandError> {
        validate_client_id(client_id)?;
        self.call(client_id, ResetRequest { kind }).await
    }

    async fn call<R>(&self, client_id: &str, request: R) -> Result<R::Confirmation, CommandError>
    where
        R: OutboundRequest,
    {
        let call = OutboundCall::encode(&request)?;
        let action = call.action;

        // Dropping the waiter on any early return unregisters the call.
        let (completion, waiter) = self.calls.register();
        tracing::debug!(client_id, %action, correlation_id = %waiter.id(), "Dispatching command");
        self.dispatcher.dispatch(client_id, call, completion)?;

        let payload = match waiter.wait(COMMAND_TIMEOUT).await {
            Ok(outcome) => outcome?,
            Err(WaitError::Timeout(after)) => {
                tracing::warn!(client_id, %action, ?after, "Command timed out");
                return Err(CommandError::Timeout(after));
            }
            Err(WaitError::Abandoned) => return Err(RemoteError::connection_closed().into()),
        };

        serde_json::from_value(payload).map_err(|e| {
            RemoteError::new(
                ErrorCode::FormationViolation,
                format!("Invalid {action} confirmation: {e}"),
            )
            .into()
        })
    }
}

fn validate_client_id(client_id: &str) -> Result<(), CommandError> {
    if client_id.is_empty() {
        return Err(CommandError::Validation("clientId must not be empty".into()));
    }
    if client_id.trim() != client_id {
        return Err(CommandError::Validation(
            "clientId must not have leading or trailing whitespace".into(),
        ));
    }
    Ok(())
}

fn validate_id_tag(id_tag: &str) -> Result<(), CommandError> {
    if id_tag.is_empty() {
        return Err(CommandError::Validation("idTag must not be empty".into()));
    }
    if id_tag.chars().count() > ID_TAG_MAX_LEN {
        return Err(CommandError::Validation(format!(
            "idTag must be at most {ID_TAG_MAX_LEN} characters"
        )));
    }
    Ok(())
}
