//! UseCase: 孤立した Room の定期削除
//!
//! 起動時に 1 回、その後は一定間隔で全 Room を走査し、参加者が空、
//! または生存中の接続がない Room を削除します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CleanupSweep::run_once() の削除対象の判定
//! - 1 件の削除失敗で走査が止まらないこと
//! - 停止シグナルでタスクが終了すること

use std::{sync::Arc, time::Duration};

use tokio::{sync::oneshot, task::JoinHandle};

use crate::domain::{ConnectionRegistry, RepositoryError, RoomRepository};

/// 本番の走査間隔（1 時間）
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub struct CleanupSweep {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl CleanupSweep {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// 1 回走査し、削除した Room の数を返す
    pub async fn run_once(&self) -> Result<usize, RepositoryError> {
        let rooms = self.repository.list_all().await?;
        let mut deleted = 0;
        for room in rooms {
            let orphaned = room.participants.is_empty()
                || !self.registry.has_live_connections(&room.id).await;
            if !orphaned {
                continue;
            }
            match self.repository.delete(&room.id).await {
                Ok(()) => {
                    tracing::info!("Cleanup deleted orphaned room '{}'", room.id);
                    deleted += 1;
                }
                Err(e) => tracing::warn!("Cleanup failed to delete room '{}': {}", room.id, e),
            }
        }
        Ok(deleted)
    }

    /// 走査タスクを起動する。最初の走査は即座に行う。
    pub fn spawn(self: Arc<Self>, interval: Duration, mut stop: oneshot::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        match self.run_once().await {
                            Ok(deleted) => tracing::debug!("Cleanup sweep deleted {} rooms", deleted),
                            Err(e) => tracing::error!("Cleanup sweep failed: {}", e),
                        }
                    }
                }
            }
            tracing::debug!("Cleanup sweep stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionId, Difficulty, GameSettings, NewRoom, ParticipantId, Room, RoomField,
            RoomId, RoomTransaction, RoomWrite, Timestamp,
        },
        infrastructure::{
            connection_registry::WebSocketConnectionRegistry, repository::InMemoryRoomRepository,
        },
    };
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    fn new_room(participants: Vec<&str>) -> NewRoom {
        let participants: Vec<ParticipantId> = participants
            .into_iter()
            .map(|p| ParticipantId::new(p.to_string()).unwrap())
            .collect();
        NewRoom {
            title: "duel".to_string(),
            owner: ParticipantId::new("owner".to_string()).unwrap(),
            capacity: 3,
            participants,
            password: None,
            settings: GameSettings::new(Difficulty::EASY),
            created_at: Timestamp::new(0),
        }
    }

    #[tokio::test]
    async fn test_sweep_deletes_orphaned_rooms() {
        // テスト項目: 参加者が空、または接続がない Room だけが削除される
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let empty = repository.add(new_room(vec![])).await.unwrap();
        let disconnected = repository.add(new_room(vec!["a"])).await.unwrap();
        let live = repository.add(new_room(vec!["b"])).await.unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register(&live, ConnectionId::generate(), tx).await;
        let sweep = CleanupSweep::new(repository.clone(), registry);

        // when (操作):
        let deleted = sweep.run_once().await.unwrap();

        // then (期待する結果):
        assert_eq!(deleted, 2);
        assert!(repository.get(&empty).await.is_err());
        assert!(repository.get(&disconnected).await.is_err());
        assert!(repository.get(&live).await.is_ok());
    }

    /// 特定の Room の削除だけ失敗する Repository
    struct FailingDeleteRepository {
        inner: InMemoryRoomRepository,
        failing: RoomId,
    }

    #[async_trait]
    impl RoomRepository for FailingDeleteRepository {
        async fn get(&self, id: &RoomId) -> Result<Room, RepositoryError> {
            self.inner.get(id).await
        }

        async fn add(&self, room: NewRoom) -> Result<RoomId, RepositoryError> {
            self.inner.add(room).await
        }

        async fn update(&self, id: &RoomId, fields: Vec<RoomField>) -> Result<(), RepositoryError> {
            self.inner.update(id, fields).await
        }

        async fn delete(&self, id: &RoomId) -> Result<(), RepositoryError> {
            if id == &self.failing {
                return Err(RepositoryError::Storage("disk on fire".to_string()));
            }
            self.inner.delete(id).await
        }

        async fn list_all(&self) -> Result<Vec<Room>, RepositoryError> {
            self.inner.list_all().await
        }

        async fn run_transaction(
            &self,
            id: &RoomId,
            transaction: &RoomTransaction,
        ) -> Result<RoomWrite, RepositoryError> {
            self.inner.run_transaction(id, transaction).await
        }
    }

    #[tokio::test]
    async fn test_sweep_continues_after_delete_failure() {
        // テスト項目: 1 件の削除失敗は記録され、残りの Room の走査は続く
        // given (前提条件):
        let inner = InMemoryRoomRepository::new();
        let first = inner.add(new_room(vec!["a"])).await.unwrap();
        let second = inner.add(new_room(vec!["b"])).await.unwrap();
        let repository = Arc::new(FailingDeleteRepository {
            inner,
            failing: first.clone(),
        });
        let sweep = CleanupSweep::new(
            repository.clone(),
            Arc::new(WebSocketConnectionRegistry::new()),
        );

        // when (操作):
        let deleted = sweep.run_once().await.unwrap();

        // then (期待する結果):
        assert_eq!(deleted, 1);
        assert!(repository.get(&first).await.is_ok());
        assert!(repository.get(&second).await.is_err());
    }

    #[tokio::test]
    async fn test_spawned_sweep_runs_immediately_and_stops() {
        // テスト項目: 起動直後に走査し、停止シグナルで終了する
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        repository.add(new_room(vec![])).await.unwrap();
        let sweep = Arc::new(CleanupSweep::new(
            repository.clone(),
            Arc::new(WebSocketConnectionRegistry::new()),
        ));
        let (stop_tx, stop_rx) = oneshot::channel();

        // when (操作):
        let handle = sweep.spawn(DEFAULT_CLEANUP_INTERVAL, stop_rx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop_tx.send(()).unwrap();

        // then (期待する結果):
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repository.count().await, 0);
    }
}
