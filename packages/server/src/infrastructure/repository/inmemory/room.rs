//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリのドキュメントストアとして使用します。
//!
//! ## 楽観的並行制御
//!
//! 各ドキュメントはバージョン番号を持ちます。`run_transaction` は
//! スナップショットを読み取り、ロックを解放した状態でトランザクション本体を評価し、
//! コミット時にバージョンが変わっていればリトライします。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    NewRoom, RepositoryError, Room, RoomField, RoomId, RoomIdFactory, RoomRepository,
    RoomTransaction, RoomWrite,
};

/// Attempts before a contended transaction gives up with `Conflict`.
pub const DEFAULT_MAX_TRANSACTION_ATTEMPTS: usize = 16;

struct VersionedRoom {
    room: Room,
    version: u64,
}

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, VersionedRoom>>,
    max_attempts: usize,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_TRANSACTION_ATTEMPTS)
    }

    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// 現在のドキュメント数
    pub async fn count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Current version of a room document, for tests and diagnostics.
    pub async fn version_of(&self, id: &RoomId) -> Option<u64> {
        self.rooms.lock().await.get(id).map(|r| r.version)
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get(&self, id: &RoomId) -> Result<Room, RepositoryError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(id)
            .map(|r| r.room.clone())
            .ok_or_else(|| RepositoryError::RoomNotFound(id.to_string()))
    }

    async fn add(&self, room: NewRoom) -> Result<RoomId, RepositoryError> {
        let id = RoomIdFactory::generate().map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let mut rooms = self.rooms.lock().await;
        rooms.insert(
            id.clone(),
            VersionedRoom {
                room: room.into_room(id.clone()),
                version: 0,
            },
        );
        tracing::debug!("Room '{}' stored", id);
        Ok(id)
    }

    async fn update(&self, id: &RoomId, fields: Vec<RoomField>) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let entry = rooms
            .get_mut(id)
            .ok_or_else(|| RepositoryError::RoomNotFound(id.to_string()))?;
        for field in &fields {
            field.apply(&mut entry.room);
        }
        entry.version += 1;
        Ok(())
    }

    async fn delete(&self, id: &RoomId) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        rooms
            .remove(id)
            .map(|_| tracing::debug!("Room '{}' deleted", id))
            .ok_or_else(|| RepositoryError::RoomNotFound(id.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Room>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let mut all: Vec<Room> = rooms.values().map(|r| r.room.clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn run_transaction(
        &self,
        id: &RoomId,
        transaction: &RoomTransaction,
    ) -> Result<RoomWrite, RepositoryError> {
        for attempt in 1..=self.max_attempts {
            // 1. スナップショットを読み取る
            let (snapshot, read_version) = {
                let rooms = self.rooms.lock().await;
                let entry = rooms
                    .get(id)
                    .ok_or_else(|| RepositoryError::RoomNotFound(id.to_string()))?;
                (entry.room.clone(), entry.version)
            };

            // 2. ロック外でトランザクション本体を評価
            let write = transaction(&snapshot).map_err(RepositoryError::Aborted)?;

            // 3. バージョンが一致する場合のみコミット
            let mut rooms = self.rooms.lock().await;
            let Some(entry) = rooms.get_mut(id) else {
                return Err(RepositoryError::RoomNotFound(id.to_string()));
            };
            if entry.version != read_version {
                tracing::debug!(
                    "Transaction on room '{}' conflicted (attempt {}), retrying",
                    id,
                    attempt
                );
                drop(rooms);
                tokio::task::yield_now().await;
                continue;
            }

            match &write {
                RoomWrite::Keep => {}
                RoomWrite::Replace(room) => {
                    entry.room = room.clone();
                    entry.version += 1;
                }
                RoomWrite::Delete => {
                    rooms.remove(id);
                }
            }
            return Ok(write);
        }

        Err(RepositoryError::Conflict {
            room: id.to_string(),
            attempts: self.max_attempts,
        })
    }
}
