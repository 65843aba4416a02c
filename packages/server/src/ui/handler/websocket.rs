//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{domain::RoomId, ui::state::AppState};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let room_id = match RoomId::try_from(query.room.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid room id in connect query: '{}'", query.room);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_id)))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// The channel closes when the connection is unregistered from the registry
/// (or the registry is drained at shutdown); a close frame is sent then.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut session = state.session_protocol.open(room_id, tx).await;
    let mut send_task = pusher_loop(rx, sender);

    // フレームは到着順に 1 件ずつ処理する
    loop {
        tokio::select! {
            msg = receiver.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error on connection {}: {}", session.connection(), e);
                        break;
                    }
                    None => break,
                };
                match msg {
                    Message::Text(text) => {
                        state.session_protocol.handle(&mut session, text.as_str()).await;
                    }
                    Message::Close(_) => {
                        tracing::debug!("Connection {} requested close", session.connection());
                        break;
                    }
                    // Ping/pong is handled automatically by the WebSocket protocol
                    _ => {}
                }
            }
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    state.session_protocol.close(&mut session).await;
}
