//! WebSocket を使った ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - Room ごとに、接続 ID と WebSocket 送信チャンネルの対応を管理
//! - Room 内の接続へのファンアウト配信
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 配信中はマップのロックを保持しますが、Room の接続数は定員で上限があり、
//! 送信はチャンネルへの投入のみで待機しません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, ConnectionRegistry, OutboundMessage, PusherChannel, RoomId},
    infrastructure::dto::conversion::encode_outbound,
};

/// WebSocket を使った ConnectionRegistry 実装
#[derive(Default)]
pub struct WebSocketConnectionRegistry {
    /// Key: room id, Value: 接続 ID → 送信チャンネル
    rooms: Mutex<HashMap<RoomId, HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続が存在する Room の数
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn register(&self, room: &RoomId, connection: ConnectionId, sender: PusherChannel) {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room.clone())
            .or_default()
            .insert(connection, sender);
        tracing::debug!("Connection {} registered to room '{}'", connection, room);
    }

    async fn unregister(&self, room: &RoomId, connection: ConnectionId) {
        let mut rooms = self.rooms.lock().await;
        if let Some(connections) = rooms.get_mut(room) {
            if connections.remove(&connection).is_some() {
                tracing::debug!("Connection {} unregistered from room '{}'", connection, room);
            }
            if connections.is_empty() {
                rooms.remove(room);
            }
        }
    }

    async fn broadcast(
        &self,
        room: &RoomId,
        message: &OutboundMessage,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let frame = match encode_outbound(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode message for room '{}': {}", room, e);
                return 0;
            }
        };

        let rooms = self.rooms.lock().await;
        let Some(connections) = rooms.get(room) else {
            tracing::debug!("No connections in room '{}', nothing to broadcast", room);
            return 0;
        };

        let mut delivered = 0;
        for (connection, sender) in connections {
            if Some(*connection) == exclude {
                continue;
            }
            // ブロードキャストでは一部の送信失敗を許容
            match sender.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    "Failed to push message to connection {} in room '{}': {}",
                    connection,
                    room,
                    e
                ),
            }
        }
        tracing::debug!(
            "Broadcast to room '{}': {} of {} connections",
            room,
            delivered,
            connections.len()
        );
        delivered
    }

    async fn has_live_connections(&self, room: &RoomId) -> bool {
        let rooms = self.rooms.lock().await;
        rooms.get(room).is_some_and(|c| !c.is_empty())
    }

    async fn connection_count(&self, room: &RoomId) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map_or(0, HashMap::len)
    }

    async fn drain(&self) -> usize {
        let mut rooms = self.rooms.lock().await;
        let drained = rooms.values().map(HashMap::len).sum();
        rooms.clear();
        drained
    }
}
