//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    Difficulty, NewRoom, ProblemId, RepositoryError, Room, RoomId, RoomStatus, TransactionAbort,
};

/// Single-field update applied by [`RoomRepository::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomField {
    Difficulty(Difficulty),
    TimeLimit(u32),
    Problem(ProblemId),
    RandomProblem(bool),
    Status(RoomStatus),
    InGame(bool),
}

impl RoomField {
    pub fn apply(&self, room: &mut Room) {
        match self {
            RoomField::Difficulty(difficulty) => room.settings.difficulty = *difficulty,
            RoomField::TimeLimit(minutes) => room.settings.time_limit_minutes = *minutes,
            RoomField::Problem(problem) => room.settings.problem = Some(problem.clone()),
            RoomField::RandomProblem(random) => room.settings.random_problem = *random,
            RoomField::Status(status) => room.status = *status,
            RoomField::InGame(in_game) => room.in_game = *in_game,
        }
    }
}

/// What a transaction body decided to do with the room it read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomWrite {
    /// Commit nothing.
    Keep,
    /// Replace the whole document.
    Replace(Room),
    /// Delete the document.
    Delete,
}

/// Transaction body: reads the current room, decides the write.
///
/// The store may invoke it more than once when a concurrent writer wins the
/// race, so it must be free of side effects.
pub type RoomTransaction = dyn Fn(&Room) -> Result<RoomWrite, TransactionAbort> + Send + Sync;

/// Room Repository trait
///
/// 永続化された Room ドキュメントへのインターフェース。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// ## 一貫性
///
/// `run_transaction` は同一 Room に対する並行呼び出しを直列化する
/// （楽観的リトライ等）。更新が失われないことを保証するのはこのメソッドのみ。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room を取得
    async fn get(&self, id: &RoomId) -> Result<Room, RepositoryError>;

    /// Room を作成し、採番された ID を返す
    async fn add(&self, room: NewRoom) -> Result<RoomId, RepositoryError>;

    /// 指定フィールドを更新
    async fn update(&self, id: &RoomId, fields: Vec<RoomField>) -> Result<(), RepositoryError>;

    /// Room を削除
    async fn delete(&self, id: &RoomId) -> Result<(), RepositoryError>;

    /// 全ての Room を取得
    async fn list_all(&self) -> Result<Vec<Room>, RepositoryError>;

    /// 単一 Room に対する read-modify-write をアトミックに実行
    ///
    /// コミットされた書き込み内容を返す。
    async fn run_transaction(
        &self,
        id: &RoomId,
        transaction: &RoomTransaction,
    ) -> Result<RoomWrite, RepositoryError>;
}
