//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use chat_realtime::connection::authenticator::AuthenticatedConnection;
use chat_realtime::connection::handle::ConnectionHandle;
use chat_realtime::connection::heartbeat::run_heartbeat;
use chat_realtime::message::serializer::serialize_outbound;
use chat_realtime::message::types::ServerEvent;
use chat_realtime::relay::Disposition;

use crate::error::ApiError;
use crate::extractors::auth::credential_sources;
use crate::state::AppState;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, serde::Deserialize)]
pub struct WsQuery {
    /// Session token, for clients that cannot set cookies or headers.
    #[serde(default)]
    pub token: Option<String>,
}

/// GET /ws: authenticate, then upgrade.
///
/// A failed verification answers 401 and never touches presence.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let sources = credential_sources(&headers, query.token.as_deref());

    let identity = match state.ws_authenticator.authenticate(sources).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(reason = e.code(), "WebSocket handshake rejected");
            return Err(e.into());
        }
    };

    let max_size = state.config.realtime.max_message_size;
    Ok(ws
        .max_message_size(max_size.saturating_mul(2))
        .on_upgrade(move |socket| handle_ws_connection(state, identity, socket)))
}

/// Drives one established relay connection until either side closes.
async fn handle_ws_connection(state: AppState, identity: AuthenticatedConnection, socket: WebSocket) {
    let relay = state.realtime.relay.clone();
    let (handle, outbound_rx) = relay.connect(&identity);
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = %identity.user_id,
        "WebSocket connection established"
    );

    let (ws_tx, mut ws_rx) = socket.split();

    // Single writer: drains the queue in order, then closes the socket.
    let writer = tokio::spawn(write_outbound(handle.clone(), outbound_rx, ws_tx));

    let heartbeat = tokio::spawn(run_heartbeat(
        handle.clone(),
        state.realtime.heartbeat_config(),
    ));

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if relay.handle_inbound(&handle, text.as_str()).await == Disposition::Close {
                        handle.close();
                        break;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    handle.send(ServerEvent::Error {
                        code: "UNSUPPORTED_FRAME".to_string(),
                        message: "Binary frames are not supported".to_string(),
                    });
                    handle.close();
                    break;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => handle.touch().await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }

    relay.disconnect(&conn_id);
    handle.close();
    heartbeat.abort();
    if let Err(e) = writer.await {
        error!(conn_id = %conn_id, error = %e, "WebSocket writer task failed");
    }

    info!(
        conn_id = %conn_id,
        user_id = %identity.user_id,
        "WebSocket connection closed"
    );
}

async fn write_outbound<S>(
    handle: Arc<ConnectionHandle>,
    mut outbound_rx: mpsc::Receiver<ServerEvent>,
    mut ws_tx: S,
) where
    S: futures::Sink<Message> + Unpin,
{
    loop {
        let event = tokio::select! {
            biased;
            event = outbound_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = handle.closed() => {
                // Flush what was queued before the close (e.g. an error event).
                while let Ok(event) = outbound_rx.try_recv() {
                    if !send_event(&mut ws_tx, &event).await {
                        break;
                    }
                }
                break;
            }
        };

        if !send_event(&mut ws_tx, &event).await {
            debug!(conn_id = %handle.id, "WebSocket sink closed");
            handle.close();
            break;
        }
    }

    let _ = ws_tx.send(Message::Close(None)).await;
}

/// Returns `false` once the sink is gone. Unserializable events are
/// logged and skipped.
async fn send_event<S>(ws_tx: &mut S, event: &ServerEvent) -> bool
where
    S: futures::Sink<Message> + Unpin,
{
    match serialize_outbound(event) {
        Ok(text) => ws_tx.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            error!(event = event.name(), error = %e, "Failed to serialize relay event");
            true
        }
    }
}
