//! UseCase: 接続ごとのセッションプロトコル
//!
//! WebSocket の 1 接続について、受信フレームの解釈・認証・中継・切断後処理を行います。
//! 接続の読み書き自体は UI 層（`ui/handler/websocket.rs`）が担当します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 認証前のフレームが破棄されること
//! - 認証成功で USER_JOIN が配信され、失敗では接続が維持されること
//! - チャット・Room 更新が送信者以外に中継されること、設定変更が保存されること
//! - 切断時に参加者が Room から外れ、USER_LEAVE が配信されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：認証 → チャット → 切断
//! - 異常系：不正なトークン、不正な JSON、サーバー専用の更新種別
//! - エッジケース：認証前の切断、明示的な退出後の切断

use std::sync::Arc;

use codeduel_shared::time::Clock;

use crate::{
    domain::{
        ConnectionId, ConnectionRegistry, CredentialVerifier, Dispatch, DropReason,
        OutboundMessage, OutboundPayload, PusherChannel, RoomEvent, RoomId, RoomUpdate, Session,
        Timestamp,
    },
    infrastructure::dto::conversion::decode_inbound,
};

use super::membership::MembershipCoordinator;

/// 受信フレーム 1 件の処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Authorized,
    AuthorizationFailed,
    /// 中継した（配信できた接続数）
    Relayed { delivered: usize },
    Dropped(DropReason),
    /// 不正なフレーム
    Invalid,
}

/// セッションプロトコルのユースケース
pub struct SessionProtocol {
    /// ConnectionRegistry（接続管理とファンアウト配信）
    registry: Arc<dyn ConnectionRegistry>,
    /// CredentialVerifier（トークン検証）
    verifier: Arc<dyn CredentialVerifier>,
    membership: Arc<MembershipCoordinator>,
    clock: Arc<dyn Clock>,
}

impl SessionProtocol {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        verifier: Arc<dyn CredentialVerifier>,
        membership: Arc<MembershipCoordinator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            verifier,
            membership,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 接続を受け付け、未認証の状態で Registry に登録する
    pub async fn open(&self, room: RoomId, sender: PusherChannel) -> Session {
        let session = Session::new(ConnectionId::generate(), room);
        self.registry
            .register(session.room(), session.connection(), sender)
            .await;
        tracing::info!(
            "Connection {} opened for room '{}'",
            session.connection(),
            session.room()
        );
        session
    }

    /// 受信したテキストフレームを 1 件処理する
    ///
    /// フレーム中の `room` は参照せず、接続時に指定された Room を使う。
    pub async fn handle(&self, session: &mut Session, text: &str) -> FrameOutcome {
        let message = match decode_inbound(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    "Dropping invalid frame from connection {}: {}",
                    session.connection(),
                    e
                );
                return FrameOutcome::Invalid;
            }
        };

        match session.dispatch(message) {
            Dispatch::Authorize { token } => self.authorize(session, &token).await,
            Dispatch::RelayChat(chat) => {
                let message = OutboundMessage {
                    room: session.room().clone(),
                    timestamp: chat.timestamp,
                    payload: OutboundPayload::Chat(chat),
                };
                let delivered = self
                    .registry
                    .broadcast(session.room(), &message, Some(session.connection()))
                    .await;
                FrameOutcome::Relayed { delivered }
            }
            Dispatch::RelayRoomUpdate { timestamp, update } => {
                // 設定変更は保存してから中継する
                if let RoomUpdate::Setting(change) = &update
                    && let Err(e) = self.membership.apply_setting(session.room(), change).await
                {
                    tracing::warn!(
                        "Failed to persist setting change for room '{}': {}",
                        session.room(),
                        e
                    );
                }
                let message = OutboundMessage {
                    room: session.room().clone(),
                    timestamp,
                    payload: OutboundPayload::RoomUpdate(update),
                };
                let delivered = self
                    .registry
                    .broadcast(session.room(), &message, Some(session.connection()))
                    .await;
                FrameOutcome::Relayed { delivered }
            }
            Dispatch::Drop(reason) => {
                match reason {
                    DropReason::NotAuthorized => tracing::debug!(
                        "Dropping frame from unauthorized connection {}",
                        session.connection()
                    ),
                    DropReason::AlreadyAuthorized => tracing::debug!(
                        "Ignoring repeated authorization on connection {}",
                        session.connection()
                    ),
                    DropReason::Closed => {}
                }
                FrameOutcome::Dropped(reason)
            }
        }
    }

    async fn authorize(&self, session: &mut Session, token: &str) -> FrameOutcome {
        let identity = match self.verifier.verify(token).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(
                    "Authorization failed on connection {}: {}",
                    session.connection(),
                    e
                );
                return FrameOutcome::AuthorizationFailed;
            }
        };

        let event = RoomEvent::UserJoin {
            participant: identity.participant_id.clone(),
            display_name: identity.display_name.clone(),
        };
        tracing::info!(
            "Connection {} authorized as '{}' in room '{}'",
            session.connection(),
            identity.participant_id,
            session.room()
        );
        if !session.authorize(identity) {
            return FrameOutcome::Dropped(DropReason::AlreadyAuthorized);
        }
        let message = OutboundMessage::event(session.room().clone(), self.now(), event);
        self.registry.broadcast(session.room(), &message, None).await;
        FrameOutcome::Authorized
    }

    /// 切断時の後処理
    ///
    /// 認証済みだった場合は、明示的に退出済みでも参加者の削除を試み（冪等）、
    /// USER_LEAVE を配信する。
    pub async fn close(&self, session: &mut Session) {
        self.registry
            .unregister(session.room(), session.connection())
            .await;
        let Some(identity) = session.close() else {
            tracing::info!(
                "Unauthorized connection {} closed",
                session.connection()
            );
            return;
        };

        if let Err(e) = self
            .membership
            .add_or_remove(&identity.participant_id, session.room(), false)
            .await
        {
            tracing::warn!(
                "Failed to remove '{}' from room '{}' on disconnect: {}",
                identity.participant_id,
                session.room(),
                e
            );
        }

        let message = OutboundMessage::event(
            session.room().clone(),
            self.now(),
            RoomEvent::UserLeave {
                participant: identity.participant_id.clone(),
                display_name: identity.display_name,
            },
        );
        self.registry.broadcast(session.room(), &message, None).await;
        tracing::info!(
            "'{}' disconnected from room '{}'",
            identity.participant_id,
            session.room()
        );
    }
}
