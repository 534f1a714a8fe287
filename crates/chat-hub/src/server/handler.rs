//! WebSocket handler
//!
//! Bridges one WebSocket to the hub: a reader task feeds inbound frames to the
//! `HubHandler`, a writer task drains the connection's outbound channel to the socket.

use crate::protocol::{CloseCode, HubFrame};
use crate::server::HubState;
use axum::{
    extract::{
        ws::{CloseFrame, Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use chat_core::{ConnectionId, Message};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

/// Room left for JSON framing around the longest chat message
const FRAME_OVERHEAD: usize = 1024;

/// Upper bound on UTF-8 bytes per character
const MAX_UTF8_WIDTH: usize = 4;

/// How long the writer gets to flush a close frame after the reader stops
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket hub handler
pub async fn hub_handler(State(state): State<HubState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let max_frame = max_frame_size(state.config().limits.max_message_length);

    ws.max_message_size(max_frame)
        .on_upgrade(|socket| handle_socket(state, socket))
}

/// Largest inbound WebSocket frame accepted for a given message length limit
fn max_frame_size(max_message_length: usize) -> usize {
    max_message_length
        .saturating_mul(MAX_UTF8_WIDTH)
        .saturating_add(FRAME_OVERHEAD)
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: HubState, socket: WebSocket) {
    let (mut ws_sink, ws_stream) = socket.split();

    // Register connection; the greeting is queued before broadcasts can reach it
    let registered = state.hub().connect_channel_with(|id| {
        state.handler().greeting(id).unwrap_or_else(|e| {
            tracing::warn!(connection_id = %id, error = %e, "Failed to build greeting");
            None
        })
    });

    let (connection_id, rx) = match registered {
        Ok(registered) => registered,
        Err(e) => {
            tracing::warn!(error = %e, "Refusing WebSocket connection");
            let _ = ws_sink.send(close_message(CloseCode::ServerFull)).await;
            return;
        }
    };

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let (close_tx, close_rx) = oneshot::channel::<CloseCode>();

    let mut send_task = tokio::spawn(write_loop(connection_id, ws_sink, rx, close_rx));

    if let Err(e) = state.handler().on_connect(state.hub(), connection_id) {
        tracing::warn!(connection_id = %connection_id, error = %e, "Connect handler failed");
        let _ = close_tx.send(e.to_close_code());
        cleanup_connection(&state, connection_id);
        let _ = timeout(CLOSE_GRACE, send_task).await;
        return;
    }

    let idle_timeout = Duration::from_millis(state.config().limits.idle_timeout_ms);
    let mut recv_task = tokio::spawn(read_loop(
        state.clone(),
        connection_id,
        ws_stream,
        idle_timeout,
    ));

    // Wait for either side to finish
    tokio::select! {
        result = &mut recv_task => {
            let close_code = result.ok().flatten();
            if let Some(code) = close_code {
                tracing::debug!(
                    connection_id = %connection_id,
                    close_code = %code,
                    "Receive task ended with close code"
                );
                let _ = close_tx.send(code);
            }

            // Dropping the hub's sender ends the writer once the queue is flushed
            cleanup_connection(&state, connection_id);
            if timeout(CLOSE_GRACE, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            recv_task.abort();
            cleanup_connection(&state, connection_id);
        }
    }
}

/// Read frames until the client leaves, the handler asks to close, or the idle timeout fires
async fn read_loop(
    state: HubState,
    connection_id: ConnectionId,
    mut ws_stream: SplitStream<WebSocket>,
    idle_timeout: Duration,
) -> Option<CloseCode> {
    loop {
        let frame = match timeout(idle_timeout, ws_stream.next()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(_) => {
                tracing::info!(
                    connection_id = %connection_id,
                    idle_ms = idle_timeout.as_millis(),
                    "Connection timed out"
                );
                return Some(CloseCode::SessionTimeout);
            }
        };

        let payload = match frame {
            Ok(WsMessage::Text(text)) => text.into_bytes(),
            Ok(WsMessage::Binary(bytes)) => bytes,
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => {
                // Pong is handled automatically by axum
                tracing::trace!(connection_id = %connection_id, "Ping/Pong received");
                continue;
            }
            Ok(WsMessage::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "Client closed connection");
                return None;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                return None;
            }
        };

        match state
            .handler()
            .on_message(state.hub(), connection_id, &payload)
        {
            Ok(None) => {}
            Ok(Some(code)) => return Some(code),
            Err(e) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Handler error"
                );
                return Some(e.to_close_code());
            }
        }
    }
}

/// Drain the outbound channel to the socket
///
/// Ends when the hub drops the connection's sender, the socket fails, or a close code
/// arrives; in the last case the close frame is written first.
async fn write_loop(
    connection_id: ConnectionId,
    mut ws_sink: SplitSink<WebSocket, WsMessage>,
    mut rx: mpsc::Receiver<Arc<Message>>,
    mut close_rx: oneshot::Receiver<CloseCode>,
) {
    loop {
        tokio::select! {
            biased;

            code = &mut close_rx => {
                let frame = match code {
                    Ok(code) => close_message(code),
                    Err(_) => WsMessage::Close(None),
                };
                let _ = ws_sink.send(frame).await;
                return;
            }
            msg = rx.recv() => {
                let Some(msg) = msg else { break };

                if ws_sink.send(to_ws_message(&msg)).await.is_err() {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Failed to send message to WebSocket"
                    );
                    return;
                }
            }
        }
    }

    // Close the WebSocket when the channel is closed
    let _ = ws_sink.close().await;
}

/// Encode a hub message as a WebSocket frame
fn to_ws_message(message: &Message) -> WsMessage {
    match message.payload_str() {
        Some(text) => WsMessage::Text(text.to_owned()),
        None => WsMessage::Binary(message.payload().to_vec()),
    }
}

/// Build a close frame for a hub close code
fn close_message(code: CloseCode) -> WsMessage {
    let (code, reason) = HubFrame::close_frame(code);
    WsMessage::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}

/// Remove a connection from the hub and notify the handler
fn cleanup_connection(state: &HubState, connection_id: ConnectionId) {
    if state.hub().disconnect(connection_id) {
        state.handler().on_disconnect(state.hub(), connection_id);
    }
    tracing::info!(connection_id = %connection_id, "Cleaned up connection");
}
