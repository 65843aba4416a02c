//! UseCase: Room 詳細取得

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

/// Room と、その Room の現在の接続数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub room: Room,
    pub live_connections: usize,
}

pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    pub async fn execute(&self, room_id: String) -> Result<RoomDetail, GetRoomDetailError> {
        let room_id =
            RoomId::try_from(room_id).map_err(|_| GetRoomDetailError::InvalidRoomId)?;
        let room = self.repository.get(&room_id).await?;
        let live_connections = self.registry.connection_count(&room_id).await;
        Ok(RoomDetail {
            room,
            live_connections,
        })
    }
}
