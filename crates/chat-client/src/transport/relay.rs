//! Relay connection over `tokio-tungstenite`.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tracing::{debug, warn};

use chat_realtime::message::serializer::{deserialize_server, serialize_client};
use chat_realtime::message::{ClientEvent, ServerEvent};

use crate::error::ClientError;

/// Buffered server events between the reader task and the consumer.
const EVENT_BUFFER: usize = 256;

/// An open relay connection. Server events arrive on the receiver returned
/// by [`connect`](Self::connect); it ends when the connection drops.
/// Heartbeat pings are answered here and not forwarded.
#[derive(Debug)]
pub struct RelayConnection {
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RelayConnection {
    /// Connect to `url` (e.g. `ws://host/ws`) with a bearer token.
    pub async fn connect(
        url: &str,
        token: &str,
    ) -> Result<(Self, mpsc::Receiver<ServerEvent>), ClientError> {
        let mut request = url.into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (stream, _) = connect_async(request).await?;
        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        let writer = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let closing = matches!(frame, Message::Close(_));
                if let Err(e) = sink.send(frame).await {
                    debug!(error = %e, "Relay write failed");
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let pong_tx = out_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(error = %e, "Relay read failed");
                        break;
                    }
                };
                let event = match deserialize_server(text.as_str()) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(error = %e, "Undecodable relay frame");
                        continue;
                    }
                };
                if let Some(reply) = heartbeat_reply(&event) {
                    if let Ok(pong) = serialize_client(&reply) {
                        let _ = pong_tx.send(Message::Text(pong.into()));
                    }
                    continue;
                }
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok((
            Self {
                outbound: out_tx,
                reader,
                writer,
            },
            event_rx,
        ))
    }

    /// Queue an event for the relay.
    pub fn send(&self, event: &ClientEvent) -> Result<(), ClientError> {
        let text = serialize_client(event)?;
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| ClientError::RelayClosed)
    }

    /// Whether the connection has stopped reading.
    pub fn is_closed(&self) -> bool {
        self.reader.is_finished()
    }

    /// Send a close frame and wait for both tasks to stop.
    pub async fn close(self) {
        let _ = self.outbound.send(Message::Close(None));
        let _ = self.writer.await;
        self.reader.abort();
        let _ = self.reader.await;
    }
}

/// The frame the transport sends back on its own, without involving the
/// client: a pong for every ping.
fn heartbeat_reply(event: &ServerEvent) -> Option<ClientEvent> {
    match event {
        ServerEvent::Ping { timestamp } => Some(ClientEvent::Pong {
            timestamp: *timestamp,
        }),
        _ => None,
    }
}
