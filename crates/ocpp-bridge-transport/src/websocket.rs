//! WebSocket session engine for charge point connections.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{CloseFrame, Message, WebSocket, close_code},
    },
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use ocpp_bridge_core::{
    Action, CommandDispatcher, Completion, ConnectionHooks, CoreHandler, DispatchError, ErrorCode,
    HandlerError, OutboundCall, RemoteError,
};
use parking_lot::{Mutex, RwLock};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::protocol::{
    Call, CallError, CallResult, OCPP_SUBPROTOCOL, OcppMessage, call_message_id,
};

/// Outstanding outbound calls of one connection, keyed by OCPP message id.
type PendingReplies = Arc<Mutex<HashMap<String, Completion>>>;

/// How long a replaced connection gets to flush its Close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

struct Connection {
    generation: Uuid,
    outbound: mpsc::UnboundedSender<Message>,
    pending: PendingReplies,
    /// Fired when a newer connection takes over this identity.
    evict: oneshot::Sender<()>,
}

struct Inner {
    connections: RwLock<HashMap<String, Connection>>,
    handler: Arc<dyn CoreHandler>,
    hooks: Arc<dyn ConnectionHooks>,
}

/// Central system side of the OCPP-J protocol.
///
/// Accepts charge point connections on `/{client_id}`, answers their requests
/// through a [`CoreHandler`] and sends outbound commands as a
/// [`CommandDispatcher`]. Cloning shares the same connection table.
#[derive(Clone)]
pub struct CentralSystem {
    inner: Arc<Inner>,
}

impl CentralSystem {
    /// Create a central system with no connections.
    #[must_use]
    pub fn new(handler: Arc<dyn CoreHandler>, hooks: Arc<dyn ConnectionHooks>) -> Self {
        Self {
            inner: Arc::new(Inner {
                connections: RwLock::new(HashMap::new()),
                handler,
                hooks,
            }),
        }
    }

    /// Router accepting charge point WebSocket connections.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/{client_id}", get(ws_handler))
            .with_state(self.clone())
    }

    /// Whether a charge point with this identity is currently connected.
    #[must_use]
    pub fn is_connected(&self, client_id: &str) -> bool {
        self.inner.connections.read().contains_key(client_id)
    }

    async fn serve_connection(self, client_id: String, socket: WebSocket) {
        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let (evict, mut evicted_rx) = oneshot::channel::<()>();
        let generation = Uuid::new_v4();
        let pending = PendingReplies::default();

        let replaced = self.inner.connections.write().insert(
            client_id.clone(),
            Connection {
                generation,
                outbound: tx.clone(),
                pending: Arc::clone(&pending),
                evict,
            },
        );
        if let Some(previous) = replaced {
            tracing::warn!(%client_id, "Replacing existing connection for charge point");
            let _ = previous.evict.send(());
        }
        self.inner.hooks.on_connect(&client_id);

        let mut send_task = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if sink.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        let evicted = loop {
            let msg = tokio::select! {
                biased;
                _ = &mut evicted_rx => break true,
                msg = stream.next() => msg,
            };
            let text = match msg {
                None | Some(Ok(Message::Close(_))) => break false,
                Some(Ok(Message::Text(t))) => t.as_str().to_owned(),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(s) => s,
                    Err(_) => continue,
                },
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!(%client_id, "WebSocket error: {e}");
                    break false;
                }
            };
            self.handle_frame(&client_id, &text, &tx, &pending);
        };

        if evicted {
            let _ = tx.send(Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: "replaced by a newer connection".into(),
            })));
            let _ = tokio::time::timeout(CLOSE_GRACE, &mut send_task).await;
        }
        send_task.abort();

        let still_registered = {
            let mut connections = self.inner.connections.write();
            let current = connections
                .get(&client_id)
                .is_some_and(|c| c.generation == generation);
            if current {
                connections.remove(&client_id);
            }
            current
        };
        // Dropped outside the lock; each one wakes its caller with a closed-connection error.
        let abandoned: Vec<Completion> = pending.lock().drain().map(|(_, c)| c).collect();
        if !abandoned.is_empty() {
            tracing::debug!(%client_id, count = abandoned.len(), "Dropping unanswered calls");
        }
        drop(abandoned);

        if still_registered {
            self.inner.hooks.on_disconnect(&client_id);
        } else {
            tracing::info!(%client_id, "Closed replaced connection");
        }
    }

    fn handle_frame(
        &self,
        client_id: &str,
        text: &str,
        tx: &mpsc::UnboundedSender<Message>,
        pending: &PendingReplies,
    ) {
        match OcppMessage::parse(text) {
            Ok(OcppMessage::Call(call)) => {
                let handler = Arc::clone(&self.inner.handler);
                let client_id = client_id.to_string();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reply = handle_call(handler.as_ref(), &client_id, call).await;
                    send_frame(&tx, &client_id, &reply);
                });
            }
            Ok(OcppMessage::CallResult(CallResult {
                message_id,
                payload,
            })) => resolve(client_id, pending, &message_id, Ok(payload)),
            Ok(OcppMessage::CallError(error)) => {
                let message_id = error.message_id.clone();
                resolve(client_id, pending, &message_id, Err(error.into_remote()));
            }
            Err(e) => {
                tracing::warn!(client_id, frame = text, "Invalid frame: {e}");
                if let Some(message_id) = call_message_id(text) {
                    let reply = CallError::new(message_id, ErrorCode::ProtocolError, e.to_string());
                    send_frame(tx, client_id, &OcppMessage::CallError(reply));
                }
            }
        }
    }
}

impl CommandDispatcher for CentralSystem {
    fn dispatch(
        &self,
        client_id: &str,
        call: OutboundCall,
        completion: Completion,
    ) -> Result<(), DispatchError> {
        let (outbound, pending) = {
            let connections = self.inner.connections.read();
            let connection = connections
                .get(client_id)
                .ok_or_else(|| DispatchError::NotConnected(client_id.to_string()))?;
            (connection.outbound.clone(), Arc::clone(&connection.pending))
        };

        let message_id = Uuid::new_v4().to_string();
        let text = OcppMessage::Call(Call {
            message_id: message_id.clone(),
            action: call.action.as_str().to_string(),
            payload: call.payload,
        })
        .to_text()?;

        let pruned: Vec<Completion> = {
            let mut pending = pending.lock();
            let abandoned: Vec<String> = pending
                .iter()
                .filter(|(_, c)| c.is_abandoned())
                .map(|(id, _)| id.clone())
                .collect();
            let pruned = abandoned
                .iter()
                .filter_map(|id| pending.remove(id))
                .collect();
            pending.insert(message_id.clone(), completion);
            pruned
        };
        drop(pruned);

        if outbound.send(Message::Text(text.into())).is_err() {
            let unsent = pending.lock().remove(&message_id);
            drop(unsent);
            return Err(DispatchError::ConnectionClosed(client_id.to_string()));
        }
        tracing::debug!(client_id, action = %call.action, %message_id, "Sent CALL");
        Ok(())
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(system): State<CentralSystem>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !requests_ocpp_subprotocol(&headers) {
        tracing::warn!(
            %client_id,
            offered = ?headers.get(header::SEC_WEBSOCKET_PROTOCOL),
            "Charge point did not request the {OCPP_SUBPROTOCOL} subprotocol"
        );
    }
    ws.protocols([OCPP_SUBPROTOCOL])
        .on_upgrade(move |socket| system.serve_connection(client_id, socket))
}

/// Whether the upgrade request lists the OCPP subprotocol.
fn requests_ocpp_subprotocol(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|protocol| protocol.trim() == OCPP_SUBPROTOCOL)
}

fn resolve(
    client_id: &str,
    pending: &PendingReplies,
    message_id: &str,
    outcome: Result<Value, RemoteError>,
) {
    let completion = pending.lock().remove(message_id);
    match completion {
        Some(completion) => {
            if !completion.complete(outcome) {
                tracing::debug!(client_id, message_id, "Caller stopped waiting for reply");
            }
        }
        None => tracing::warn!(client_id, message_id, "Reply to unknown call"),
    }
}

fn send_frame(tx: &mpsc::UnboundedSender<Message>, client_id: &str, frame: &OcppMessage) {
    match frame.to_text() {
        Ok(text) => {
            if tx.send(Message::Text(text.into())).is_err() {
                tracing::debug!(client_id, "Connection closed before reply was sent");
            }
        }
        Err(e) => tracing::error!(client_id, "Failed to serialize frame: {e}"),
    }
}

async fn handle_call(handler: &dyn CoreHandler, client_id: &str, call: Call) -> OcppMessage {
    let Call {
        message_id,
        action,
        payload,
    } = call;

    let outcome = match action.parse::<Action>() {
        Err(e) => Err(RemoteError::new(ErrorCode::NotImplemented, e.to_string())),
        Ok(action) if !action.is_initiated_by_charge_point() => Err(RemoteError::new(
            ErrorCode::NotSupported,
            format!("{action} is not accepted from a charge point"),
        )),
        Ok(action) => route(handler, client_id, action, payload).await,
    };

    match outcome {
        Ok(payload) => OcppMessage::CallResult(CallResult {
            message_id,
            payload,
        }),
        Err(error) => {
            tracing::warn!(
                client_id,
                %action,
                code = error.code.as_str(),
                "Rejected CALL: {}",
                error.description
            );
            OcppMessage::CallError(CallError::from_remote(message_id, error))
        }
    }
}

async fn route(
    handler: &dyn CoreHandler,
    client_id: &str,
    action: Action,
    payload: Value,
) -> Result<Value, RemoteError> {
    match action {
        Action::Authorize => invoke(payload, move |r| handler.on_authorize(client_id, r)).await,
        Action::BootNotification => {
            invoke(payload, move |r| handler.on_boot_notification(client_id, r)).await
        }
        Action::DataTransfer => {
            invoke(payload, move |r| handler.on_data_transfer(client_id, r)).await
        }
        Action::Heartbeat => invoke(payload, move |r| handler.on_heartbeat(client_id, r)).await,
        Action::MeterValues => {
            invoke(payload, move |r| handler.on_meter_values(client_id, r)).await
        }
        Action::StatusNotification => {
            invoke(payload, move |r| handler.on_status_notification(client_id, r)).await
        }
        Action::StartTransaction => {
            invoke(payload, move |r| handler.on_start_transaction(client_id, r)).await
        }
        Action::StopTransaction => {
            invoke(payload, move |r| handler.on_stop_transaction(client_id, r)).await
        }
        Action::RemoteStartTransaction | Action::RemoteStopTransaction | Action::Reset => Err(
            RemoteError::new(ErrorCode::NotSupported, format!("{action} is not accepted here")),
        ),
    }
}

async fn invoke<Req, Conf, F, Fut>(payload: Value, handle: F) -> Result<Value, RemoteError>
where
    Req: DeserializeOwned,
    Conf: Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Conf, HandlerError>>,
{
    let request = serde_json::from_value(payload)
        .map_err(|e| RemoteError::new(ErrorCode::FormationViolation, e.to_string()))?;
    let confirmation = handle(request)
        .await
        .map_err(|e| RemoteError::new(e.code(), e.to_string()))?;
    serde_json::to_value(confirmation)
        .map_err(|e| RemoteError::new(ErrorCode::InternalError, e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, time::Duration};

    use futures::{SinkExt, StreamExt};
    use ocpp_bridge_core::{
        CommandError,
        types::{RemoteStartStopStatus, ResetStatus, ResetType},
    };
    use ocpp_bridge_session::{CommandBridge, EventHandler, PendingTransactions};
    use serde_json::json;
    use tokio::net::TcpStream;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite};

    use super::*;

    type Device = WebSocketStream<MaybeTlsStream<TcpStream>>;

    #[derive(Debug, PartialEq, Eq)]
    enum Lifecycle {
        Connected(String),
        Disconnected(String),
    }

    struct RecordingHooks(mpsc::UnboundedSender<Lifecycle>);

    impl ConnectionHooks for RecordingHooks {
        fn on_connect(&self, client_id: &str) {
            let _ = self.0.send(Lifecycle::Connected(client_id.to_string()));
        }

        fn on_disconnect(&self, client_id: &str) {
            let _ = self.0.send(Lifecycle::Disconnected(client_id.to_string()));
        }
    }

    struct Harness {
        system: CentralSystem,
        transactions: Arc<PendingTransactions>,
        lifecycle: mpsc::UnboundedReceiver<Lifecycle>,
        addr: SocketAddr,
    }

    impl Harness {
        async fn start() -> Self {
            let transactions = Arc::new(PendingTransactions::new());
            let (events, lifecycle) = mpsc::unbounded_channel();
            let system = CentralSystem::new(
                Arc::new(EventHandler::new(Arc::clone(&transactions))),
                Arc::new(RecordingHooks(events)),
            );

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let app = system.router();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                system,
                transactions,
                lifecycle,
                addr,
            }
        }

        async fn connect(&mut self, client_id: &str) -> Device {
            let url = format!("ws://{}/{client_id}", self.addr);
            let (device, _) = tokio_tungstenite::connect_async(url).await.unwrap();
            assert_eq!(
                self.next_event().await,
                Lifecycle::Connected(client_id.to_string())
            );
            device
        }

        async fn next_event(&mut self) -> Lifecycle {
            tokio::time::timeout(Duration::from_secs(5), self.lifecycle.recv())
                .await
                .unwrap()
                .unwrap()
        }

        fn bridge(&self) -> Arc<CommandBridge<CentralSystem>> {
            Arc::new(CommandBridge::new(
                self.system.clone(),
                Arc::clone(&self.transactions),
            ))
        }
    }

    async fn send(device: &mut Device, frame: Value) {
        device
            .send(tungstenite::Message::Text(frame.to_string()))
            .await
            .unwrap();
    }

    async fn recv(device: &mut Device) -> Value {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), device.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let tungstenite::Message::Text(text) = msg {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_boot_notification_round_trip() {
        let mut harness = Harness::start().await;
        let mut device = harness.connect("CP1").await;
        assert!(harness.system.is_connected("CP1"));

        send(
            &mut device,
            json!([2, "boot-1", "BootNotification", {
                "chargePointVendor": "VendorX",
                "chargePointModel": "ModelY"
            }]),
        )
        .await;

        let reply = recv(&mut device).await;
        assert_eq!(reply[0], 3);
        assert_eq!(reply[1], "boot-1");
        assert_eq!(reply[2]["status"], "Accepted");
        assert_eq!(reply[2]["interval"], 600);
    }

    #[tokio::test]
    async fn test_invalid_calls_get_call_errors() {
        let mut harness = Harness::start().await;
        let mut device = harness.connect("CP1").await;

        send(&mut device, json!([2, "a", "GetConfiguration", {}])).await;
        let reply = recv(&mut device).await;
        assert_eq!(reply, json!([4, "a", "NotImplemented", "Unknown action: GetConfiguration", {}]));

        send(&mut device, json!([2, "b", "Reset", {"type": "Hard"}])).await;
        let reply = recv(&mut device).await;
        assert_eq!(reply[0], 4);
        assert_eq!(reply[2], "NotSupported");

        send(&mut device, json!([2, "c", "Authorize", {"idTag": 5}])).await;
        let reply = recv(&mut device).await;
        assert_eq!(reply[1], "c");
        assert_eq!(reply[2], "FormationViolation");

        send(&mut device, json!([2, "d", 17])).await;
        let reply = recv(&mut device).await;
        assert_eq!(reply[1], "d");
        assert_eq!(reply[2], "ProtocolError");
    }

    #[tokio::test]
    async fn test_remote_start_then_start_transaction_uses_caller_id() {
        let mut harness = Harness::start().await;
        let mut device = harness.connect("CP1").await;
        let bridge = harness.bridge();

        let command = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.remote_start_transaction("CP1", "TAG1", 77).await }
        });

        let call = recv(&mut device).await;
        assert_eq!(call[0], 2);
        assert_eq!(call[2], "RemoteStartTransaction");
        assert_eq!(call[3], json!({"idTag": "TAG1"}));
        send(&mut device, json!([3, call[1], {"status": "Accepted"}])).await;

        let confirmation = command.await.unwrap().unwrap();
        assert_eq!(confirmation.status, RemoteStartStopStatus::Accepted);
        assert_eq!(bridge.in_flight(), 0);

        send(
            &mut device,
            json!([2, "start-1", "StartTransaction", {
                "connectorId": 1,
                "idTag": "TAG1",
                "meterStart": 0,
                "timestamp": "2024-01-01T00:00:00Z"
            }]),
        )
        .await;
        let reply = recv(&mut device).await;
        assert_eq!(reply[1], "start-1");
        assert_eq!(reply[2]["transactionId"], 77);
        assert_eq!(reply[2]["idTagInfo"]["status"], "Accepted");
        assert!(harness.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_call_error_reply_is_remote_failure() {
        let mut harness = Harness::start().await;
        let mut device = harness.connect("CP1").await;
        let bridge = harness.bridge();

        let command = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.reset("CP1", ResetType::Soft).await }
        });

        let call = recv(&mut device).await;
        assert_eq!(call[2], "Reset");
        assert_eq!(call[3], json!({"type": "Soft"}));
        send(
            &mut device,
            json!([4, call[1], "NotSupported", "no resets today", {}]),
        )
        .await;

        match command.await.unwrap() {
            Err(CommandError::Remote(error)) => {
                assert_eq!(error.code, ErrorCode::NotSupported);
                assert_eq!(error.description, "no resets today");
            }
            other => panic!("Expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_accepted() {
        let mut harness = Harness::start().await;
        let mut device = harness.connect("CP1").await;
        let bridge = harness.bridge();

        let command = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.reset("CP1", ResetType::Hard).await }
        });

        let call = recv(&mut device).await;
        send(&mut device, json!([3, call[1], {"status": "Accepted"}])).await;
        assert_eq!(command.await.unwrap().unwrap().status, ResetStatus::Accepted);
    }

    #[tokio::test]
    async fn test_dispatch_to_unknown_device() {
        let harness = Harness::start().await;
        let bridge = harness.bridge();

        let result = bridge.remote_stop_transaction("CP9", 3).await;
        assert!(matches!(
            result,
            Err(CommandError::Dispatch(DispatchError::NotConnected(id))) if id == "CP9"
        ));
        assert_eq!(bridge.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_fails_outstanding_command() {
        let mut harness = Harness::start().await;
        let mut device = harness.connect("CP1").await;
        let bridge = harness.bridge();

        let command = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.remote_stop_transaction("CP1", 3).await }
        });

        let call = recv(&mut device).await;
        assert_eq!(call[2], "RemoteStopTransaction");
        assert_eq!(call[3], json!({"transactionId": 3}));
        device.close(None).await.unwrap();

        assert_eq!(
            harness.next_event().await,
            Lifecycle::Disconnected("CP1".into())
        );
        assert!(!harness.system.is_connected("CP1"));

        let result = tokio::time::timeout(Duration::from_secs(5), command)
            .await
            .unwrap()
            .unwrap();
        match result {
            Err(CommandError::Remote(error)) => assert_eq!(error.code, ErrorCode::GenericError),
            other => panic!("Expected closed connection error, got {other:?}"),
        }
        assert_eq!(bridge.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_connection() {
        let mut harness = Harness::start().await;
        let mut first = harness.connect("CP1").await;
        let mut second = harness.connect("CP1").await;

        // the replaced socket is closed by the server
        let msg = tokio::time::timeout(Duration::from_secs(5), first.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(matches!(msg, tungstenite::Message::Close(Some(_))), "got {msg:?}");
        assert!(harness.system.is_connected("CP1"));
        assert!(
            harness.lifecycle.try_recv().is_err(),
            "replacement must not report a disconnect"
        );

        let bridge = harness.bridge();
        let command = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.remote_stop_transaction("CP1", 8).await }
        });

        let call = recv(&mut second).await;
        assert_eq!(call[3], json!({"transactionId": 8}));
        send(&mut second, json!([3, call[1], {"status": "Rejected"}])).await;
        assert_eq!(
            command.await.unwrap().unwrap().status,
            RemoteStartStopStatus::Rejected
        );

        second.close(None).await.unwrap();
        assert_eq!(
            harness.next_event().await,
            Lifecycle::Disconnected("CP1".into())
        );
        assert!(!harness.system.is_connected("CP1"));
    }

    #[tokio::test]
    async fn test_replaced_socket_cannot_take_pending_transaction() {
        let mut harness = Harness::start().await;
        let mut first = harness.connect("CP1").await;
        let mut second = harness.connect("CP1").await;
        harness.transactions.put("CP1", 55);

        let start = json!([2, "s", "StartTransaction", {
            "connectorId": 1,
            "idTag": "TAG1",
            "meterStart": 0,
            "timestamp": "2024-01-01T00:00:00Z"
        }]);

        // whatever the stale socket still manages to send goes unanswered
        let _ = first.send(tungstenite::Message::Text(start.to_string())).await;
        let stale = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(Ok(msg)) = first.next().await {
                if let tungstenite::Message::Text(text) = msg {
                    return Some(text);
                }
            }
            None
        })
        .await
        .unwrap();
        assert_eq!(stale, None);
        assert_eq!(harness.transactions.len(), 1);

        send(&mut second, start).await;
        let reply = recv(&mut second).await;
        assert_eq!(reply[2]["transactionId"], 55);
        assert!(harness.transactions.is_empty());
    }

    #[test]
    fn test_subprotocol_detection() {
        let mut headers = HeaderMap::new();
        assert!(!requests_ocpp_subprotocol(&headers));

        headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            "ocpp2.0.1, ocpp1.6".parse().unwrap(),
        );
        assert!(requests_ocpp_subprotocol(&headers));

        headers.insert(header::SEC_WEBSOCKET_PROTOCOL, "ocpp2.0.1".parse().unwrap());
        assert!(!requests_ocpp_subprotocol(&headers));
    }

    #[tokio::test]
    async fn test_unmatched_reply_is_ignored() {
        let mut harness = Harness::start().await;
        let mut device = harness.connect("CP1").await;

        send(&mut device, json!([3, "nobody-asked", {"status": "Accepted"}])).await;
        send(&mut device, json!([2, "hb", "Heartbeat", {}])).await;

        let reply = recv(&mut device).await;
        assert_eq!(reply[1], "hb");
        assert!(reply[2]["currentTime"].is_string());
    }
}
