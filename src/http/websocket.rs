//! Subscriber WebSocket sessions.
//!
//! # Data Flow
//! ```text
//! upgrade → ConnectionManager::register → ack {"type":"connection"}
//!
//! reader: text frame → MessageHandler → replies → outbound queue
//!         pong       → mark_alive
//! writer: outbound queue (replies, events, probes, close) → socket
//! ```
//!
//! # Design Decisions
//! - Every frame to the client goes through the connection's queue, so the
//!   dispatcher never touches a socket
//! - The reader stops when the manager force-closes the connection

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::distribution::{ProtocolError, ServerMessage};
use crate::http::server::AppState;
use crate::net::{Outbound, Session};

/// Time the writer gets to flush queued frames after the session ends.
const WRITER_DRAIN: Duration = Duration::from_secs(5);

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let Session { id, mut outbound, closed } = match state.connections.register() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting subscriber");
            let reply = ServerMessage::error(e.to_string()).to_text();
            let _ = sender.send(Message::Text(reply.into())).await;
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    state.connections.send(id, ServerMessage::connection(id).to_text());

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let message = match frame {
                Outbound::Text(text) => Message::Text(text.into()),
                Outbound::Ping => Message::Ping(Default::default()),
                Outbound::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let writer_done = loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    for reply in state.handler.handle_text(id, text.as_str()).await {
                        if !state.connections.send(id, reply.to_text()) {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    let reply = state.handler.protocol_error(id, ProtocolError::BinaryFrame);
                    state.connections.send(id, reply.to_text());
                }
                Some(Ok(Message::Pong(_))) => state.connections.mark_alive(id),
                Some(Ok(Message::Ping(_))) => {}
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break false,
            },
            _ = closed.notified() => break false,
            _ = &mut writer => break true,
        }
    };

    state.connections.deregister(id);
    if !writer_done && tokio::time::timeout(WRITER_DRAIN, &mut writer).await.is_err() {
        writer.abort();
    }
}
