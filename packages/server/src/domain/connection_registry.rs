//! ConnectionRegistry trait 定義
//!
//! Room ごとの接続集合と、その集合へのファンアウト配信のインターフェース。
//! WebSocket の生成は UI 層、送信チャンネルの管理は Infrastructure 層が担う。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, OutboundMessage, RoomId};

/// Outbound channel of one connection (encoded JSON frames).
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Connection Registry trait
///
/// 配信はベストエフォート: 一部の接続への送信失敗はログに残し、
/// 他の接続への配信は継続する。失敗した接続はここでは削除しない
/// （その接続自身のクローズ処理で削除される）。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 接続を Room に登録
    async fn register(&self, room: &RoomId, connection: ConnectionId, sender: PusherChannel);

    /// 接続を Room から登録解除（存在しない場合は何もしない）
    async fn unregister(&self, room: &RoomId, connection: ConnectionId);

    /// Room の全接続（`exclude` を除く）に配信し、配信できた接続数を返す
    async fn broadcast(
        &self,
        room: &RoomId,
        message: &OutboundMessage,
        exclude: Option<ConnectionId>,
    ) -> usize;

    /// Room に生存中の接続があるか
    async fn has_live_connections(&self, room: &RoomId) -> bool;

    /// Room の接続数
    async fn connection_count(&self, room: &RoomId) -> usize;

    /// 全接続を破棄（シャットダウン時）
    async fn drain(&self) -> usize;
}
