//! UseCase: ゲームの時計と進行状態
//!
//! Room ごとの `GameState` を保持し、一定周期の tick と進捗報告で進行させます。
//!
//! ## ロック順序
//!
//! ConnectionRegistry のロックと `games` のロックを同時に保持しない。
//! 接続の生存確認は `games` のロック取得前に行い、配信は `games` の
//! ロック解放後に行う。
//!
//! ## 終了処理
//!
//! 終了を決めた経路（時間切れ・勝利・放棄・外部からの終了）は `games` の
//! ロック内で `over` を立てる。最初に立てた経路だけが GAME_OVER を配信し、
//! その後にエントリを削除して tick タスクへ停止シグナルを送る。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - start_game / on_tick / update_progress / end_game
//! - 勝利と時間切れが競合しても GAME_OVER が 1 回だけ配信されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：進捗報告による勝利、時間切れ
//! - 異常系：二重開始、必要ケース数 0、スナップショット外の参加者
//! - エッジケース：接続が 0 件の Room の tick（勝者なしで終了）

use std::{collections::HashMap, sync::Arc, time::Duration};

use codeduel_shared::time::Clock;
use tokio::{
    sync::{Mutex, oneshot},
    time::{Instant, interval_at},
};

use crate::domain::{
    ConnectionRegistry, GameState, OutboundMessage, ParticipantId, Problem, ProgressOutcome,
    Room, RoomEvent, RoomId, TickOutcome, Timestamp,
};

use super::error::StartGameError;

/// 本番の tick 周期（1 分）
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

/// tick 1 回の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    Continued { elapsed_minutes: u32 },
    Ended { winner: Option<ParticipantId> },
    /// 進行中のゲームがない（既に終了済み）
    NoGame,
}

impl TickReport {
    fn is_final(&self) -> bool {
        !matches!(self, TickReport::Continued { .. })
    }
}

/// 進捗報告の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressReport {
    Recorded {
        leader: Option<ParticipantId>,
        leader_score: u32,
    },
    Won {
        winner: ParticipantId,
    },
    /// ゲームなし・終了済み・スナップショット外の参加者
    Ignored,
}

struct ActiveGame {
    state: GameState,
    stop: Option<oneshot::Sender<()>>,
}

/// Room ごとのゲーム進行を管理する
pub struct GameClock {
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    tick_period: Duration,
    games: Mutex<HashMap<RoomId, ActiveGame>>,
}

impl GameClock {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
        tick_period: Duration,
    ) -> Self {
        Self {
            registry,
            clock,
            tick_period,
            games: Mutex::new(HashMap::new()),
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    async fn broadcast(&self, room: &RoomId, event: RoomEvent) -> usize {
        let message = OutboundMessage::event(room.clone(), self.now(), event);
        self.registry.broadcast(room, &message, None).await
    }

    pub async fn is_running(&self, room: &RoomId) -> bool {
        self.games.lock().await.contains_key(room)
    }

    pub async fn active_games(&self) -> usize {
        self.games.lock().await.len()
    }

    /// ゲームを開始する
    ///
    /// `room` は起動時点のスナップショットで、その参加者が進捗の対象になる。
    /// 既にゲームが存在する Room への開始要求は拒否する（既存のゲームは変更しない）。
    pub async fn start_game(
        self: &Arc<Self>,
        room: &Room,
        problem: &Problem,
    ) -> Result<(), StartGameError> {
        if problem.required_case_count == 0 {
            tracing::warn!(
                "Problem '{}' has no required cases, refusing to start room '{}'",
                problem.id,
                room.id
            );
            return Err(StartGameError::NoRequiredCases(problem.id.to_string()));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut games = self.games.lock().await;
            if games.contains_key(&room.id) {
                tracing::warn!("Game already running in room '{}', start rejected", room.id);
                return Err(StartGameError::AlreadyRunning(room.id.to_string()));
            }
            let state = GameState::new(
                room.participants.iter().cloned(),
                problem.required_case_count,
                room.settings.time_limit_minutes,
            );
            games.insert(
                room.id.clone(),
                ActiveGame {
                    state,
                    stop: Some(stop_tx),
                },
            );
        }

        tracing::info!(
            "Game started in room '{}': problem '{}', {} cases, {} minutes, {} participants",
            room.id,
            problem.id,
            problem.required_case_count,
            room.settings.time_limit_minutes,
            room.participants.len()
        );
        self.spawn_ticker(room.id.clone(), stop_rx);
        self.broadcast(
            &room.id,
            RoomEvent::LaunchGame {
                problem: problem.id.clone(),
                time_limit_minutes: room.settings.time_limit_minutes,
                total_cases: problem.required_case_count,
            },
        )
        .await;
        Ok(())
    }

    fn spawn_ticker(self: &Arc<Self>, room: RoomId, mut stop: oneshot::Receiver<()>) {
        let clock = Arc::clone(self);
        tokio::spawn(async move {
            let period = clock.tick_period;
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    // 停止シグナル、または送信側の破棄
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        if clock.on_tick(&room).await.is_final() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Ticker for room '{}' stopped", room);
        });
    }

    /// 1 分経過の処理
    pub async fn on_tick(&self, room: &RoomId) -> TickReport {
        let live = self.registry.has_live_connections(room).await;

        let winner = {
            let mut games = self.games.lock().await;
            let Some(game) = games.get_mut(room) else {
                return TickReport::NoGame;
            };
            if !live {
                if !game.state.finish() {
                    return TickReport::NoGame;
                }
                tracing::info!("Room '{}' has no live connections, game abandoned", room);
                None
            } else {
                match game.state.tick() {
                    TickOutcome::Continue { elapsed_minutes } => {
                        tracing::debug!("Room '{}' elapsed {} minutes", room, elapsed_minutes);
                        return TickReport::Continued { elapsed_minutes };
                    }
                    TickOutcome::AlreadyOver => return TickReport::NoGame,
                    TickOutcome::TimeExpired { winner } => {
                        game.state.finish();
                        tracing::info!("Time is up in room '{}'", room);
                        winner
                    }
                }
            }
        };

        self.conclude(room, winner.clone()).await;
        TickReport::Ended { winner }
    }

    /// 参加者の進捗（通過したテストケース数）を記録する
    pub async fn update_progress(
        &self,
        room: &RoomId,
        participant: &ParticipantId,
        score: u32,
    ) -> ProgressReport {
        let (outcome, leader_score) = {
            let mut games = self.games.lock().await;
            let Some(game) = games.get_mut(room) else {
                tracing::warn!(
                    "Progress from '{}' for room '{}' without a running game, ignored",
                    participant,
                    room
                );
                return ProgressReport::Ignored;
            };
            let outcome = game.state.record_progress(participant, score);
            if matches!(outcome, ProgressOutcome::Won { .. }) {
                game.state.finish();
            }
            (outcome, game.state.leader_score())
        };

        match outcome {
            ProgressOutcome::Recorded {
                leader,
                leader_score,
            } => {
                self.broadcast(
                    room,
                    RoomEvent::CodeSubmitResult {
                        participant: participant.clone(),
                        score,
                        leader: leader.clone(),
                        leader_score,
                    },
                )
                .await;
                ProgressReport::Recorded {
                    leader,
                    leader_score,
                }
            }
            ProgressOutcome::Won { winner } => {
                self.broadcast(
                    room,
                    RoomEvent::CodeSubmitResult {
                        participant: participant.clone(),
                        score,
                        leader: Some(winner.clone()),
                        leader_score,
                    },
                )
                .await;
                tracing::info!("'{}' solved every case in room '{}'", winner, room);
                self.conclude(room, Some(winner.clone())).await;
                ProgressReport::Won { winner }
            }
            ProgressOutcome::UnknownParticipant => {
                tracing::warn!(
                    "'{}' was not in room '{}' when the game launched, progress ignored",
                    participant,
                    room
                );
                ProgressReport::Ignored
            }
            ProgressOutcome::AlreadyOver => {
                tracing::debug!("Game in room '{}' is already over", room);
                ProgressReport::Ignored
            }
        }
    }

    /// ゲームを終了する。既に終了していれば何もせず `false` を返す。
    pub async fn end_game(&self, room: &RoomId, winner: Option<ParticipantId>) -> bool {
        let first = {
            let mut games = self.games.lock().await;
            games.get_mut(room).is_some_and(|game| game.state.finish())
        };
        if !first {
            tracing::debug!("Game in room '{}' already ended", room);
            return false;
        }
        self.conclude(room, winner).await;
        true
    }

    /// GAME_OVER を配信してからエントリを削除し、tick タスクを止める
    async fn conclude(&self, room: &RoomId, winner: Option<ParticipantId>) {
        match &winner {
            Some(winner) => tracing::info!("Game over in room '{}', winner '{}'", room, winner),
            None => tracing::info!("Game over in room '{}', no winner", room),
        }
        self.broadcast(room, RoomEvent::GameOver { winner }).await;

        let removed = self.games.lock().await.remove(room);
        if let Some(ActiveGame {
            stop: Some(stop), ..
        }) = removed
        {
            // tick タスクが自分自身を止める場合は受信側が既に無い
            let _ = stop.send(());
        }
    }

    /// 全ゲームの tick タスクを止めて破棄する（シャットダウン時）
    pub async fn stop_all(&self) -> usize {
        let mut games = self.games.lock().await;
        let stopped = games.len();
        for (room, game) in games.drain() {
            if let Some(stop) = game.stop {
                let _ = stop.send(());
            }
            tracing::debug!("Stopped game in room '{}'", room);
        }
        stopped
    }
}
