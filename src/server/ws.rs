//! Streaming gateway
//!
//! Splits each socket into a writer task draining the connection's outbound
//! queue and a reader feeding decoded frames to its [`Session`]. A connection
//! evicted by the hub (its queue filled up) is torn down here.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use futures::{future, SinkExt, StreamExt};

use super::AppState;
use crate::sync::{ConnectionHandle, Session, Signal};

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(state, socket))
}

async fn handle_ws(state: AppState, socket: WebSocket) {
    let (mut sender, receiver) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::channel(state.config.outbound_buffer);
    let eviction = handle.eviction();

    let session = match Session::open(state.hub.clone(), handle) {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = %err, "failed to open session");
            return;
        }
    };
    let id = session.id();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let signals = receiver.filter_map(|msg| future::ready(to_signal(msg)));
    let mut recv_task = tokio::spawn(session.run(signals));

    tokio::select! {
        outcome = &mut recv_task => {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(connection = %id, error = %err, "connection terminated"),
                Err(err) => tracing::error!(connection = %id, error = %err, "session task failed"),
            }
            // queue closes once the session's handle is gone; let it flush
            let _ = send_task.await;
        }
        _ = &mut send_task => {
            tracing::debug!(connection = %id, "writer closed, ending session");
            recv_task.abort();
        }
        _ = eviction.wait() => {
            tracing::warn!(connection = %id, "subscriber fell behind, dropping connection");
            recv_task.abort();
            send_task.abort();
        }
    }
}

fn to_signal(msg: Result<Message, axum::Error>) -> Option<Signal> {
    match msg {
        Ok(Message::Text(text)) => Some(decode(text.as_str().as_bytes())),
        Ok(Message::Binary(bin)) => Some(decode(&bin)),
        Ok(Message::Close(_)) => Some(Signal::Disconnect),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Err(err) => Some(Signal::TransportError(err.to_string())),
    }
}

fn decode(bytes: &[u8]) -> Signal {
    match serde_json::from_slice(bytes) {
        Ok(value) => Signal::Message(value),
        Err(err) => Signal::Malformed(err.to_string()),
    }
}
