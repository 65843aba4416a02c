//! UseCase: ゲーム起動
//!
//! Room のオーナーの要求で、Room を対戦中に更新してから GameClock でゲームを開始します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LaunchGameUseCase::execute() メソッド
//! - オーナー確認、問題の解決（指定・保存済み設定・ランダム）、Room の状態更新
//!
//! ### どのような状況を想定しているか
//! - 正常系：オーナーによる起動
//! - 異常系：オーナー以外、存在しない問題、問題未選択、二重起動
//! - 並行系：同じ Room への同時起動で、永続化された問題と進行中のゲームが食い違わないこと

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use crate::domain::{
    ParticipantId, Problem, ProblemCatalog, ProblemId, Room, RoomField, RoomId, RoomRepository,
    RoomStatus,
};

use super::{error::LaunchGameError, game_clock::GameClock};

/// ゲーム起動のユースケース
pub struct LaunchGameUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// ProblemCatalog（問題メタデータ）
    catalog: Arc<dyn ProblemCatalog>,
    game_clock: Arc<GameClock>,
    /// 起動処理中の Room（確認から開始までを Room ごとに直列化する）
    launching: Arc<Mutex<HashSet<RoomId>>>,
}

/// 起動処理中の印。破棄時に解除される
struct LaunchReservation {
    launching: Arc<Mutex<HashSet<RoomId>>>,
    room: RoomId,
}

impl LaunchReservation {
    fn acquire(launching: &Arc<Mutex<HashSet<RoomId>>>, room: &RoomId) -> Option<Self> {
        let inserted = launching
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room.clone());
        inserted.then(|| Self {
            launching: Arc::clone(launching),
            room: room.clone(),
        })
    }
}

impl Drop for LaunchReservation {
    fn drop(&mut self) {
        self.launching
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.room);
    }
}

impl LaunchGameUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        catalog: Arc<dyn ProblemCatalog>,
        game_clock: Arc<GameClock>,
    ) -> Self {
        Self {
            repository,
            catalog,
            game_clock,
            launching: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// ゲームを起動し、起動時点の Room を返す
    ///
    /// # Arguments
    ///
    /// * `room_id` - 対象の Room
    /// * `requester` - 要求者（Room のオーナーである必要がある）
    /// * `problem_id` - 出題する問題。省略時は Room の設定から決める
    pub async fn execute(
        &self,
        room_id: &RoomId,
        requester: &ParticipantId,
        problem_id: Option<ProblemId>,
    ) -> Result<Room, LaunchGameError> {
        let room = self.repository.get(room_id).await?;
        if !room.is_owner(requester) {
            tracing::warn!("'{}' is not the owner of room '{}'", requester, room_id);
            return Err(LaunchGameError::NotOwner);
        }

        let Some(_reservation) = LaunchReservation::acquire(&self.launching, room_id) else {
            tracing::warn!("Launch already in progress for room '{}'", room_id);
            return Err(LaunchGameError::AlreadyRunning(room_id.to_string()));
        };
        let problem = self.resolve_problem(&room, problem_id)?;
        if self.game_clock.is_running(room_id).await {
            return Err(LaunchGameError::AlreadyRunning(room_id.to_string()));
        }

        self.repository
            .update(
                room_id,
                vec![
                    RoomField::Status(RoomStatus::InGame),
                    RoomField::InGame(true),
                    RoomField::Problem(problem.id.clone()),
                ],
            )
            .await?;
        let snapshot = self.repository.get(room_id).await?;

        self.game_clock.start_game(&snapshot, &problem).await?;
        Ok(snapshot)
    }

    fn resolve_problem(
        &self,
        room: &Room,
        requested: Option<ProblemId>,
    ) -> Result<Problem, LaunchGameError> {
        let id = match requested.or_else(|| room.settings.problem.clone()) {
            Some(id) => id,
            None if room.settings.random_problem => {
                return self.pick_random(room);
            }
            None => return Err(LaunchGameError::NoProblemSelected),
        };
        self.catalog
            .get_by_id(&id)
            .ok_or_else(|| LaunchGameError::ProblemNotFound(id.to_string()))
    }

    /// Room の難易度の問題から 1 問を選ぶ
    fn pick_random(&self, room: &Room) -> Result<Problem, LaunchGameError> {
        let mut candidates: Vec<Problem> = self
            .catalog
            .list()
            .into_iter()
            .filter(|p| p.difficulty == room.settings.difficulty)
            .collect();
        if candidates.is_empty() {
            return Err(LaunchGameError::NoProblemSelected);
        }
        let index = (uuid::Uuid::new_v4().as_u128() % candidates.len() as u128) as usize;
        Ok(candidates.swap_remove(index))
    }
}
