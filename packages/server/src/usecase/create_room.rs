//! UseCase: Room 作成
//!
//! 作成者がオーナーかつ最初の参加者になります。

use std::sync::Arc;

use codeduel_shared::time::Clock;

use crate::domain::{
    Difficulty, GameSettings, MAX_ROOM_CAPACITY, NewRoom, ParticipantId, Room, RoomRepository,
    Timestamp,
};

use super::error::CreateRoomError;

/// Room 作成の入力
#[derive(Debug, Clone)]
pub struct CreateRoomInput {
    pub title: String,
    pub capacity: usize,
    pub difficulty: Difficulty,
    pub password: Option<String>,
}

pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(
        &self,
        owner: ParticipantId,
        input: CreateRoomInput,
    ) -> Result<Room, CreateRoomError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(CreateRoomError::EmptyTitle);
        }
        let new_room = NewRoom {
            title,
            owner: owner.clone(),
            capacity: input.capacity.clamp(1, MAX_ROOM_CAPACITY),
            participants: vec![owner],
            password: input.password.filter(|p| !p.is_empty()),
            settings: GameSettings::new(input.difficulty),
            created_at: Timestamp::new(self.clock.now_millis()),
        };
        let id = self.repository.add(new_room).await?;
        let room = self.repository.get(&id).await?;
        tracing::info!("Room '{}' created by '{}'", room.id, room.owner);
        Ok(room)
    }
}
