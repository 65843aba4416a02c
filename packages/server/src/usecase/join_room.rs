//! UseCase: Room への参加（HTTP 経由）
//!
//! パスワード付き Room ではパスワードを確認してから MembershipCoordinator に委譲します。

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{ParticipantId, RoomId, RoomRepository};

use super::{
    error::MembershipError,
    membership::{MembershipChange, MembershipCoordinator},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error("wrong room password")]
    WrongPassword,

    #[error(transparent)]
    Membership(#[from] MembershipError),
}

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    membership: Arc<MembershipCoordinator>,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, membership: Arc<MembershipCoordinator>) -> Self {
        Self {
            repository,
            membership,
        }
    }

    pub async fn join(
        &self,
        room_id: &RoomId,
        participant: &ParticipantId,
        password: Option<&str>,
    ) -> Result<MembershipChange, JoinRoomError> {
        let room = self
            .repository
            .get(room_id)
            .await
            .map_err(MembershipError::from)?;
        // 参加済みの参加者は再確認しない
        if let Some(expected) = &room.password
            && !room.contains(participant)
            && password != Some(expected.as_str())
        {
            tracing::warn!("Wrong password from '{}' for room '{}'", participant, room_id);
            return Err(JoinRoomError::WrongPassword);
        }
        Ok(self.membership.add_or_remove(participant, room_id, true).await?)
    }

    pub async fn leave(
        &self,
        room_id: &RoomId,
        participant: &ParticipantId,
    ) -> Result<MembershipChange, JoinRoomError> {
        Ok(self.membership.add_or_remove(participant, room_id, false).await?)
    }
}
