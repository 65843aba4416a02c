//! UseCase: Room の参加・退出と設定変更の永続化
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MembershipCoordinator::add_or_remove() の各分岐
//! - 同一 Room への並行な参加・退出
//! - 設定変更（難易度・制限時間・問題・ランダム出題）の永続化
//!
//! ### なぜこのテストが必要か
//! - 参加者集合に重複がなく、定員を超えないことを保証
//! - 最後の参加者の退出で Room が削除されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加、退出、既に参加済み・未参加の冪等な呼び出し
//! - 異常系：定員超過、存在しない Room への参加
//! - 並行系：プロセス内ロックを共有しない複数の Coordinator からの同時参加
//! - 資源：Room ごとのロック表が使用後に空へ戻ること

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::domain::{
    ParticipantId, RepositoryError, Room, RoomField, RoomId, RoomRepository, RoomWrite,
    SettingChange, TransactionAbort,
};

use super::error::MembershipError;

/// `add_or_remove` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Joined,
    AlreadyMember,
    Left,
    NotMember,
    /// 最後の参加者が退出し、Room が削除された
    RoomDeleted,
}

/// 参加・退出の read-modify-write 本体
///
/// 副作用を持たない（ストアは競合時に再実行する）。
pub fn membership_transaction(
    room: &Room,
    participant: &ParticipantId,
    add: bool,
) -> Result<RoomWrite, TransactionAbort> {
    let present = room.contains(participant);
    if add {
        if present {
            return Ok(RoomWrite::Keep);
        }
        if room.is_full() {
            return Err(TransactionAbort::CapacityExceeded {
                capacity: room.capacity,
            });
        }
        let mut next = room.clone();
        next.participants.push(participant.clone());
        Ok(RoomWrite::Replace(next))
    } else {
        if !present {
            return Ok(RoomWrite::Keep);
        }
        if room.participants.len() == 1 {
            return Ok(RoomWrite::Delete);
        }
        let mut next = room.clone();
        next.participants.retain(|p| p != participant);
        Ok(RoomWrite::Replace(next))
    }
}

/// Room の参加者集合を管理するコーディネーター
pub struct MembershipCoordinator {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Room ごとのプロセス内ロック（ストアでのリトライを減らすためのもの）
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl MembershipCoordinator {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self {
            repository,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn room_lock(&self, room: &RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        Arc::clone(locks.entry(room.clone()).or_default())
    }

    /// 待機中の呼び出しが無ければロックを表から外す
    ///
    /// 複製は表のロック下でしか作られないので、参照数 2（表と自分）なら他に使用者はいない。
    async fn release_room_lock(&self, room: &RoomId, lock: Arc<Mutex<()>>) {
        let mut locks = self.room_locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(room);
        }
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.room_locks.lock().await.len()
    }

    /// 参加者を Room に追加（`add = true`）または Room から削除する
    ///
    /// 退出は冪等: 存在しない Room・参加していない参加者の退出は成功扱い。
    pub async fn add_or_remove(
        &self,
        participant: &ParticipantId,
        room: &RoomId,
        add: bool,
    ) -> Result<MembershipChange, MembershipError> {
        let lock = self.room_lock(room).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_membership(participant, room, add).await
        };
        self.release_room_lock(room, lock).await;
        result
    }

    async fn apply_membership(
        &self,
        participant: &ParticipantId,
        room: &RoomId,
        add: bool,
    ) -> Result<MembershipChange, MembershipError> {
        let transaction = {
            let participant = participant.clone();
            move |current: &Room| membership_transaction(current, &participant, add)
        };
        let write = match self.repository.run_transaction(room, &transaction).await {
            Ok(write) => write,
            Err(RepositoryError::RoomNotFound(_)) if !add => {
                tracing::debug!(
                    "Room '{}' is already gone, nothing to remove for '{}'",
                    room,
                    participant
                );
                return Ok(MembershipChange::NotMember);
            }
            Err(e) => {
                tracing::warn!(
                    "Membership change for '{}' in room '{}' failed: {}",
                    participant,
                    room,
                    e
                );
                return Err(e.into());
            }
        };

        let change = match (write, add) {
            (RoomWrite::Keep, true) => MembershipChange::AlreadyMember,
            (RoomWrite::Keep, false) => MembershipChange::NotMember,
            (RoomWrite::Replace(_), true) => MembershipChange::Joined,
            (RoomWrite::Replace(_), false) => MembershipChange::Left,
            (RoomWrite::Delete, _) => MembershipChange::RoomDeleted,
        };
        if change == MembershipChange::RoomDeleted {
            tracing::info!("Last participant left, room '{}' deleted", room);
        } else {
            tracing::debug!("Participant '{}' in room '{}': {:?}", participant, room, change);
        }
        Ok(change)
    }

    /// ロビーの設定変更を Room に保存する
    pub async fn apply_setting(
        &self,
        room: &RoomId,
        change: &SettingChange,
    ) -> Result<(), MembershipError> {
        let field = match change {
            SettingChange::Difficulty(difficulty) => RoomField::Difficulty(*difficulty),
            SettingChange::TimeLimit(minutes) => RoomField::TimeLimit(*minutes),
            SettingChange::Problem(problem) => RoomField::Problem(problem.clone()),
            SettingChange::RandomProblem(random) => RoomField::RandomProblem(*random),
        };
        self.repository.update(room, vec![field]).await?;
        tracing::debug!("Room '{}' setting updated: {:?}", room, change);
        Ok(())
    }
}
