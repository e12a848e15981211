//! WebSocket upgrade handler for relay connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Create the connection's session and outbound queue
//! 3. Feed client frames to the gateway and drain the queue to the socket
//! 4. Leave the thread room on disconnect

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::gateway::{ConnectionSession, SessionGateway};
use super::messages::{ClientEvent, ServerEvent};

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(gateway): State<Arc<SessionGateway>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, gateway))
}

/// Runs for the lifetime of one connection.
///
/// Inbound frames and queued outbound events are handled by this single
/// task, so the connection sees events in exactly the order they were
/// queued.
async fn handle_socket(socket: WebSocket, gateway: Arc<SessionGateway>) {
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbound) = mpsc::unbounded_channel::<ServerEvent>();
    let mut session = ConnectionSession::new(outbox);

    tracing::info!(connection_id = %session.id(), "WebSocket connection established");

    loop {
        tokio::select! {
            Some(event) = outbound.recv() => {
                session.observe(&event);
                tracing::trace!(
                    connection_id = %session.id(),
                    event = event.name(),
                    "Delivering event"
                );
                if let Err(e) = send_event(&mut sender, &event).await {
                    tracing::debug!(
                        connection_id = %session.id(),
                        "Send error, closing connection: {}",
                        e
                    );
                    break;
                }
            }

            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => gateway.dispatch(&mut session, event).await,
                            Err(e) => {
                                tracing::warn!(
                                    connection_id = %session.id(),
                                    error = %e,
                                    "Ignoring malformed client frame"
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!(
                            connection_id = %session.id(),
                            "Received unsupported binary message"
                        );
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Protocol-level keepalive, answered by axum
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %session.id(), "Client closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(
                            connection_id = %session.id(),
                            "Receive error: {}",
                            e
                        );
                        break;
                    }
                }
            }
        }
    }

    gateway.disconnect(&session).await;
}

/// Send one event as a JSON text frame.
async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}
