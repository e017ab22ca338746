//! HTTP surface for issuing commands to charge points.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use ocpp_bridge_core::{
    CommandDispatcher, CommandError, DispatchError,
    types::{
        RemoteStartTransactionConfirmation, RemoteStopTransactionConfirmation, ResetConfirmation,
        ResetType,
    },
};
use ocpp_bridge_session::CommandBridge;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteStartParams {
    client_id: String,
    id_tag: String,
    transaction_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteStopParams {
    client_id: String,
    transaction_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetParams {
    client_id: String,
    reset_type: ResetType,
}

/// Failure of an HTTP command request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl ApiError {
    /// HTTP status for this failure.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Body(_) | Self::Command(CommandError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Command(CommandError::Dispatch(DispatchError::NotConnected(_))) => {
                StatusCode::NOT_FOUND
            }
            Self::Command(CommandError::Dispatch(DispatchError::ConnectionClosed(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Command(CommandError::Dispatch(DispatchError::Encode(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Command(CommandError::Remote(_)) => StatusCode::BAD_GATEWAY,
            Self::Command(CommandError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, "Command failed: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Router exposing the bridge commands and the operator console.
///
/// # Example
/// ```ignore
/// let bridge = Arc::new(CommandBridge::new(central_system, transactions));
/// axum::serve(listener, create_command_router(bridge)).await?;
/// ```
#[must_use]
pub fn create_command_router<D>(bridge: Arc<CommandBridge<D>>) -> Router
where
    D: CommandDispatcher + 'static,
{
    Router::new()
        .route("/", get(index_handler))
        .route("/remote_start_transaction", post(remote_start_transaction::<D>))
        .route("/remote_stop_transaction", post(remote_stop_transaction::<D>))
        .route("/reset", post(reset::<D>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(bridge)
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn remote_start_transaction<D: CommandDispatcher>(
    State(bridge): State<Arc<CommandBridge<D>>>,
    body: Result<Json<RemoteStartParams>, JsonRejection>,
) -> Result<Json<RemoteStartTransactionConfirmation>, ApiError> {
    let Json(params) = body?;
    let confirmation = bridge
        .remote_start_transaction(&params.client_id, &params.id_tag, params.transaction_id)
        .await?;
    Ok(Json(confirmation))
}

async fn remote_stop_transaction<D: CommandDispatcher>(
    State(bridge): State<Arc<CommandBridge<D>>>,
    body: Result<Json<RemoteStopParams>, JsonRejection>,
) -> Result<Json<RemoteStopTransactionConfirmation>, ApiError> {
    let Json(params) = body?;
    let confirmation = bridge
        .remote_stop_transaction(&params.client_id, params.transaction_id)
        .await?;
    Ok(Json(confirmation))
}

async fn reset<D: CommandDispatcher>(
    State(bridge): State<Arc<CommandBridge<D>>>,
    body: Result<Json<ResetParams>, JsonRejection>,
) -> Result<Json<ResetConfirmation>, ApiError> {
    let Json(params) = body?;
    let confirmation = bridge.reset(&params.client_id, params.reset_type).await?;
    Ok(Json(confirmation))
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>OCPP Central System</title>
    <style>
        body {
            margin: 0;
            padding: 20px;
            background: #f4f4f4;
            font-family: system-ui, sans-serif;
        }
        h1 { margin-bottom: 10px; }
        form {
            background: #fff;
            border: 1px solid #ddd;
            border-radius: 4px;
            padding: 12px;
            margin-bottom: 16px;
            max-width: 480px;
        }
        label { display: block; margin: 6px 0; }
        input, select { margin-left: 6px; }
        pre { white-space: pre-wrap; margin: 8px 0 0; }
        .ok { color: #262; }
        .failed { color: #a22; }
    </style>
</head>
<body>
    <h1>OCPP Central System</h1>

    <form data-action="remote_start_transaction">
        <h2>Remote start transaction</h2>
        <label>Client ID<input name="clientId" required></label>
        <label>ID tag<input name="idTag" maxlength="20" required></label>
        <label>Transaction ID<input name="transactionId" type="number" required></label>
        <button type="submit">Send</button>
        <pre class="result"></pre>
    </form>

    <form data-action="remote_stop_transaction">
        <h2>Remote stop transaction</h2>
        <label>Client ID<input name="clientId" required></label>
        <label>Transaction ID<input name="transactionId" type="number" required></label>
        <button type="submit">Send</button>
        <pre class="result"></pre>
    </form>

    <form data-action="reset">
        <h2>Reset</h2>
        <label>Client ID<input name="clientId" required></label>
        <label>Type
            <select name="resetType">
                <option>Soft</option>
                <option>Hard</option>
            </select>
        </label>
        <button type="submit">Send</button>
        <pre class="result"></pre>
    </form>

    <script>
        for (const form of document.querySelectorAll('form[data-action]')) {
            const button = form.querySelector('button');
            const result = form.querySelector('.result');

            form.addEventListener('submit', async (event) => {
                event.preventDefault();
                const values = {};
                for (const input of form.querySelectorAll('input, select')) {
                    values[input.name] = input.type === 'number'
                        ? parseInt(input.value, 10)
                        : input.value;
                }

                button.disabled = true;
                try {
                    const response = await fetch(`/${form.dataset.action}`, {
                        method: 'POST',
                        headers: { 'Content-Type': 'application/json' },
                        body: JSON.stringify(values),
                    });
                    const body = await response.json();
                    result.textContent = JSON.stringify(body, null, 2);
                    result.className = 'result ' + (response.ok ? 'ok' : 'failed');
                } catch (e) {
                    result.textContent = String(e);
                    result.className = 'result failed';
                } finally {
                    button.disabled = false;
                }
            });
        }
    </script>
</body>
</html>
"#;
