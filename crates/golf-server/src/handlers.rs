//! Connection handlers for the golf server.
//!
//! Each WebSocket gets a reader loop, which routes inbound messages, and a
//! writer task, which drains the connection's outbox into the socket.

use crate::config::Config;
use crate::metrics::{self, Direction, Failure, SessionMetrics};
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::BytesMut;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use golf_core::{
    Connection, ConnectionLifecycleHandler, ConnectionRegistry, CoreError, GameService,
    GameSessionCoordinator, InMemoryGameService, InMemoryUserService, MessageRouter,
    ResponseDispatcher, SessionId, UserService,
};
use golf_protocol::{error_codes, Encoded, OutboundResponse, Version, WireFormat, PROTOCOL_VERSION};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// Live connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Outbound delivery.
    pub dispatcher: ResponseDispatcher,
    /// Inbound routing.
    pub router: MessageRouter,
    /// Connect/disconnect bookkeeping.
    pub lifecycle: ConnectionLifecycleHandler,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create state backed by the in-memory game and user services.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_services(
            config,
            Arc::new(InMemoryGameService::new()),
            Arc::new(InMemoryUserService::new()),
        )
    }

    /// Create state backed by the given services.
    #[must_use]
    pub fn with_services(
        config: Config,
        games: Arc<dyn GameService>,
        users: Arc<dyn UserService>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = ResponseDispatcher::new(Arc::clone(&registry));
        let coordinator = GameSessionCoordinator::new(games, dispatcher.clone())
            .with_error_reporting(config.game.report_errors);

        Self {
            router: MessageRouter::new(Arc::new(coordinator)),
            lifecycle: ConnectionLifecycleHandler::new(dispatcher.clone(), users),
            registry,
            dispatcher,
            config,
        }
    }

    /// Log a payload that could not be decoded, and tell the client if configured to.
    fn reject_malformed(&self, session: &SessionId, err: CoreError) {
        warn!(session = %session, error = %err, "Dropping malformed message");
        metrics::record_failure(Failure::Malformed);

        if self.config.game.report_errors {
            self.dispatcher.send_to_session(
                session,
                OutboundResponse::error(error_codes::MALFORMED_MESSAGE, err.to_string()),
            );
        }
    }
}

/// Build the HTTP router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let addr = config.bind_addr()?;

    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let state = Arc::new(AppState::new(config));
    let path = state.config.transport.websocket_path.clone();

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Golf server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}{}", addr, path);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": PROTOCOL_VERSION.to_string(),
        "connections": state.registry.len(),
    }))
}

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Deserialize)]
struct UpgradeParams {
    /// Protocol version the client speaks.
    protocol: Option<String>,
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<UpgradeParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if let Some(requested) = params.protocol {
        let compatible = requested
            .parse::<Version>()
            .is_ok_and(|v| v.is_compatible_with(&PROTOCOL_VERSION));
        if !compatible {
            warn!(requested = %requested, "Rejecting incompatible protocol version");
            return (
                StatusCode::BAD_REQUEST,
                format!("Unsupported protocol version {requested}, server speaks {PROTOCOL_VERSION}"),
            )
                .into_response();
        }
    }

    ws.max_message_size(state.config.transport.max_message_size)
        .on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    let _metrics = SessionMetrics::open();
    let session = SessionId::generate();

    let (sink, mut stream) = socket.split();
    let (connection, outbox) = Connection::channel(session.clone());
    let writer = tokio::spawn(write_loop(
        session.clone(),
        sink,
        outbox,
        state.config.transport.wire_format,
    ));

    state.lifecycle.on_connect(connection.clone()).await;

    // Binary frames may split or batch MessagePack messages.
    let mut read_buffer = BytesMut::with_capacity(4096);

    while let Some(msg) = stream.next().await {
        let start = Instant::now();

        match msg {
            Ok(Message::Text(text)) => {
                metrics::record_message(Direction::Inbound, text.len());
                if let Err(e) = state.router.route_text(&session, &text).await {
                    state.reject_malformed(&session, e);
                }
            }
            Ok(Message::Binary(data)) => {
                metrics::record_message(Direction::Inbound, data.len());
                read_buffer.extend_from_slice(&data);
                // Each error consumes the bad frame, so this terminates.
                while let Err(e) = state.router.route_frames(&session, &mut read_buffer).await {
                    state.reject_malformed(&session, e);
                }
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Pongs are queued by the WebSocket layer itself.
            }
            Ok(Message::Close(_)) => {
                debug!(session = %session, "Received close frame");
                break;
            }
            Err(e) => {
                state.lifecycle.on_transport_error(&session, &e);
                metrics::record_failure(Failure::Transport);
                break;
            }
        }

        metrics::record_handle_time(start);
    }

    state.lifecycle.on_disconnect(&connection).await;
    writer.abort();
}

/// Drain a connection's outbox into its socket.
///
/// A failed write is logged and ends the loop; the connection stays
/// registered until the reader sees the socket close.
async fn write_loop(
    session: SessionId,
    mut sink: SplitSink<WebSocket, Message>,
    mut outbox: UnboundedReceiver<Arc<OutboundResponse>>,
    format: WireFormat,
) {
    while let Some(response) = outbox.recv().await {
        let encoded = match format.encode(response.as_ref()) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(session = %session, kind = response.kind(), error = %e, "Failed to encode response");
                metrics::record_failure(Failure::Encode);
                continue;
            }
        };

        let size = encoded.len();
        let message = match encoded {
            Encoded::Text(text) => Message::Text(text),
            Encoded::Binary(data) => Message::Binary(data.to_vec()),
        };

        if let Err(e) = sink.send(message).await {
            warn!(session = %session, kind = response.kind(), error = %e, "Send failed");
            metrics::record_failure(Failure::Send);
            break;
        }
        metrics::record_message(Direction::Outbound, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    async fn spawn_server(config: Config) -> (SocketAddr, Arc<AppState>) {
        let state = Arc::new(AppState::new(config));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = app(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, state)
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.metrics.enabled = false;
        config
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        client
    }

    async fn next_json(client: &mut Client) -> serde_json::Value {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .unwrap()
            .unwrap();
        match msg {
            WsMessage::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("Expected text message, got {:?}", other),
        }
    }

    async fn assert_silent(client: &mut Client) {
        let next = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
        assert!(next.is_err(), "unexpected message: {:?}", next);
    }

    #[tokio::test]
    async fn test_create_and_start_over_websocket() {
        let (addr, state) = spawn_server(test_config()).await;

        let mut alice = connect(addr).await;
        let mut bob = connect(addr).await;
        assert_eq!(next_json(&mut alice).await["type"], "user");
        assert_eq!(next_json(&mut bob).await["type"], "user");
        assert_eq!(state.registry.len(), 2);

        alice
            .send(WsMessage::Text(r#"{"type":"createGame"}"#.to_string()))
            .await
            .unwrap();
        let created = next_json(&mut alice).await;
        assert_eq!(created["type"], "game");
        assert_eq!(created["game"]["state"], "init");

        let game_id = created["game"]["id"].as_i64().unwrap();
        alice
            .send(WsMessage::Text(format!(
                r#"{{"type":"startGame","gameId":{game_id}}}"#
            )))
            .await
            .unwrap();
        let started = next_json(&mut alice).await;
        assert_eq!(started["game"]["state"], "started");

        assert_silent(&mut bob).await;
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_keep_connection_open() {
        let (addr, _state) = spawn_server(test_config()).await;
        let mut client = connect(addr).await;
        next_json(&mut client).await;

        client
            .send(WsMessage::Text("definitely not json".to_string()))
            .await
            .unwrap();
        client
            .send(WsMessage::Text(r#"{"type":"shuffle"}"#.to_string()))
            .await
            .unwrap();
        assert_silent(&mut client).await;

        client
            .send(WsMessage::Text(r#"{"type":"createGame"}"#.to_string()))
            .await
            .unwrap();
        assert_eq!(next_json(&mut client).await["type"], "game");
    }

    #[tokio::test]
    async fn test_errors_reported_when_enabled() {
        let mut config = test_config();
        config.game.report_errors = true;
        let (addr, _state) = spawn_server(config).await;
        let mut client = connect(addr).await;
        next_json(&mut client).await;

        client
            .send(WsMessage::Text(r#"{"type":"startGame","gameId":404}"#.to_string()))
            .await
            .unwrap();
        let error = next_json(&mut client).await;
        assert_eq!(error["type"], "error");
        assert_eq!(error["code"], error_codes::GAME_ACTION_FAILED);

        client
            .send(WsMessage::Text("{".to_string()))
            .await
            .unwrap();
        assert_eq!(
            next_json(&mut client).await["code"],
            error_codes::MALFORMED_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_msgpack_wire_format() {
        let mut config = test_config();
        config.transport.wire_format = WireFormat::MessagePack;
        let (addr, _state) = spawn_server(config).await;
        let mut client = connect(addr).await;

        let mut frames = BytesMut::new();
        let user = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        frames.extend_from_slice(&user.into_data());
        let decoded: Option<OutboundResponse> = golf_protocol::codec::decode_from(&mut frames).unwrap();
        assert!(matches!(decoded, Some(OutboundResponse::User { .. })));

        let request = golf_protocol::codec::encode(&golf_protocol::InboundMessage::CreateGame).unwrap();
        client
            .send(WsMessage::Binary(request.to_vec()))
            .await
            .unwrap();

        let reply = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let decoded: OutboundResponse = golf_protocol::codec::decode(&reply.into_data()).unwrap();
        assert_eq!(decoded.kind(), "game");
    }

    #[tokio::test]
    async fn test_disconnect_unregisters() {
        let (addr, state) = spawn_server(test_config()).await;
        let mut client = connect(addr).await;
        next_json(&mut client).await;
        assert_eq!(state.registry.len(), 1);

        client.close(None).await.unwrap();
        drop(client);

        for _ in 0..50 {
            if state.registry.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("session was not unregistered after close");
    }

    #[tokio::test]
    async fn test_incompatible_protocol_rejected() {
        let (addr, _state) = spawn_server(test_config()).await;

        assert!(connect_async(format!("ws://{addr}/ws?protocol=2.0")).await.is_err());
        assert!(connect_async(format!("ws://{addr}/ws?protocol=1.4")).await.is_ok());
    }
}
