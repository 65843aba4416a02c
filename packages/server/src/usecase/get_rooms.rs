//! UseCase: Room 一覧取得

use std::sync::Arc;

use crate::domain::{RepositoryError, Room, RoomRepository};

pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 作成日時の新しい順に返す
    pub async fn execute(&self) -> Result<Vec<Room>, RepositoryError> {
        let mut rooms = self.repository.list_all().await?;
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Difficulty, GameSettings, NewRoom, ParticipantId, Timestamp},
        infrastructure::repository::InMemoryRoomRepository,
    };

    #[tokio::test]
    async fn test_rooms_are_sorted_newest_first() {
        // テスト項目: Room 一覧は作成日時の降順
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        for (title, created_at) in [("old", 1), ("new", 3), ("mid", 2)] {
            let owner = ParticipantId::new("owner".to_string()).unwrap();
            repository
                .add(NewRoom {
                    title: title.to_string(),
                    owner: owner.clone(),
                    capacity: 2,
                    participants: vec![owner],
                    password: None,
                    settings: GameSettings::new(Difficulty::EASY),
                    created_at: Timestamp::new(created_at),
                })
                .await
                .unwrap();
        }
        let usecase = GetRoomsUseCase::new(repository);

        // when (操作):
        let rooms = usecase.execute().await.unwrap();

        // then (期待する結果):
        let titles: Vec<&str> = rooms.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }
}
