//! In-memory competition state for one room.
//!
//! `GameState` holds no locks and spawns nothing; the game clock use case
//! wraps it in its room map and drives it from ticks and progress reports.

use std::collections::HashMap;

use super::value_object::ParticipantId;

/// Result of recording a participant's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// The score was recorded; the game continues.
    Recorded {
        leader: Option<ParticipantId>,
        leader_score: u32,
    },
    /// The leader reached the required progress; the game is won.
    Won { winner: ParticipantId },
    /// The participant was not part of the launch snapshot.
    UnknownParticipant,
    /// The game already ended.
    AlreadyOver,
}

/// Result of advancing the game clock by one minute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Continue { elapsed_minutes: u32 },
    TimeExpired { winner: Option<ParticipantId> },
    AlreadyOver,
}

/// Per-room competition tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    progress: HashMap<ParticipantId, u32>,
    total_cases: u32,
    time_limit_minutes: u32,
    elapsed_minutes: u32,
    leader: Option<ParticipantId>,
    leader_score: u32,
    over: bool,
}

impl GameState {
    /// Start tracking a game for the given participant snapshot.
    ///
    /// Later joins and leaves do not alter the progress keys.
    pub fn new<I>(participants: I, total_cases: u32, time_limit_minutes: u32) -> Self
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        Self {
            progress: participants.into_iter().map(|p| (p, 0)).collect(),
            total_cases,
            time_limit_minutes,
            elapsed_minutes: 0,
            leader: None,
            leader_score: 0,
            over: false,
        }
    }

    /// Record `score` for `participant` and recompute the leader.
    ///
    /// A new score displaces the leader only when strictly greater than the
    /// leader's score; ties keep the incumbent.
    pub fn record_progress(&mut self, participant: &ParticipantId, score: u32) -> ProgressOutcome {
        if self.over {
            return ProgressOutcome::AlreadyOver;
        }
        let Some(entry) = self.progress.get_mut(participant) else {
            return ProgressOutcome::UnknownParticipant;
        };
        *entry = score;

        if score > self.leader_score {
            self.leader = Some(participant.clone());
            self.leader_score = score;
        }

        match &self.leader {
            Some(leader) if self.leader_score >= self.total_cases => ProgressOutcome::Won {
                winner: leader.clone(),
            },
            _ => ProgressOutcome::Recorded {
                leader: self.leader.clone(),
                leader_score: self.leader_score,
            },
        }
    }

    /// Advance elapsed time by one minute.
    pub fn tick(&mut self) -> TickOutcome {
        if self.over {
            return TickOutcome::AlreadyOver;
        }
        self.elapsed_minutes += 1;
        if self.elapsed_minutes >= self.time_limit_minutes {
            TickOutcome::TimeExpired {
                winner: self.leader.clone(),
            }
        } else {
            TickOutcome::Continue {
                elapsed_minutes: self.elapsed_minutes,
            }
        }
    }

    /// Mark the game as over. Returns `false` if it already was.
    pub fn finish(&mut self) -> bool {
        !std::mem::replace(&mut self.over, true)
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn leader(&self) -> Option<&ParticipantId> {
        self.leader.as_ref()
    }

    pub fn leader_score(&self) -> u32 {
        self.leader_score
    }

    pub fn total_cases(&self) -> u32 {
        self.total_cases
    }

    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_minutes
    }

    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    pub fn score_of(&self, participant: &ParticipantId) -> Option<u32> {
        self.progress.get(participant).copied()
    }

    pub fn participant_count(&self) -> usize {
        self.progress.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str) -> ParticipantId {
        ParticipantId::new(name.to_string()).unwrap()
    }

    fn create_test_game(total_cases: u32, time_limit: u32) -> GameState {
        GameState::new(vec![participant("p1"), participant("p2")], total_cases, time_limit)
    }

    #[test]
    fn test_new_game_starts_everyone_at_zero() {
        // テスト項目: 開始時は全参加者の進捗が 0 でリーダー不在
        // given (前提条件):

        // when (操作):
        let game = create_test_game(3, 10);

        // then (期待する結果):
        assert_eq!(game.participant_count(), 2);
        assert_eq!(game.score_of(&participant("p1")), Some(0));
        assert_eq!(game.score_of(&participant("p2")), Some(0));
        assert_eq!(game.leader(), None);
        assert_eq!(game.total_cases(), 3);
        assert_eq!(game.time_limit_minutes(), 10);
        assert_eq!(game.elapsed_minutes(), 0);
        assert!(!game.is_over());
    }

    #[test]
    fn test_partial_progress_takes_the_lead_without_winning() {
        // テスト項目: 途中の進捗でリーダーになるが勝利にはならない
        // given (前提条件):
        let mut game = create_test_game(3, 10);

        // when (操作):
        let outcome = game.record_progress(&participant("p1"), 2);

        // then (期待する結果):
        assert_eq!(
            outcome,
            ProgressOutcome::Recorded {
                leader: Some(participant("p1")),
                leader_score: 2
            }
        );
    }

    #[test]
    fn test_full_progress_wins() {
        // テスト項目: 必要数に到達した参加者が勝者となる
        // given (前提条件):
        let mut game = create_test_game(3, 10);
        game.record_progress(&participant("p1"), 2);

        // when (操作):
        let outcome = game.record_progress(&participant("p2"), 3);

        // then (期待する結果):
        assert_eq!(
            outcome,
            ProgressOutcome::Won {
                winner: participant("p2")
            }
        );
    }

    #[test]
    fn test_tie_keeps_incumbent_leader() {
        // テスト項目: 同点の場合は既存のリーダーが維持される
        // given (前提条件):
        let mut game = create_test_game(5, 10);
        game.record_progress(&participant("p1"), 2);

        // when (操作):
        game.record_progress(&participant("p2"), 2);

        // then (期待する結果):
        assert_eq!(game.leader(), Some(&participant("p1")));
        assert_eq!(game.leader_score(), 2);
    }

    #[test]
    fn test_lower_resubmission_does_not_lower_leader_score() {
        // テスト項目: リーダーが低いスコアを再提出してもリーダースコアは下がらない
        // given (前提条件):
        let mut game = create_test_game(5, 10);
        game.record_progress(&participant("p1"), 4);

        // when (操作):
        game.record_progress(&participant("p1"), 1);

        // then (期待する結果):
        assert_eq!(game.score_of(&participant("p1")), Some(1));
        assert_eq!(game.leader(), Some(&participant("p1")));
        assert_eq!(game.leader_score(), 4);
    }

    #[test]
    fn test_unknown_participant_is_ignored() {
        // テスト項目: 開始時に居なかった参加者の進捗は記録されない
        // given (前提条件):
        let mut game = create_test_game(3, 10);

        // when (操作):
        let outcome = game.record_progress(&participant("late"), 3);

        // then (期待する結果):
        assert_eq!(outcome, ProgressOutcome::UnknownParticipant);
        assert_eq!(game.score_of(&participant("late")), None);
        assert_eq!(game.leader(), None);
    }

    #[test]
    fn test_tick_expires_at_time_limit_with_leader() {
        // テスト項目: 制限時間到達時に現在のリーダーが勝者となる
        // given (前提条件):
        let mut game = create_test_game(5, 2);
        game.record_progress(&participant("p2"), 1);

        // when (操作):
        let first = game.tick();
        let second = game.tick();

        // then (期待する結果):
        assert_eq!(first, TickOutcome::Continue { elapsed_minutes: 1 });
        assert_eq!(
            second,
            TickOutcome::TimeExpired {
                winner: Some(participant("p2"))
            }
        );
        assert_eq!(game.elapsed_minutes(), game.time_limit_minutes());
    }

    #[test]
    fn test_tick_expires_without_leader() {
        // テスト項目: 誰も進捗がないまま時間切れになると勝者なし
        // given (前提条件):
        let mut game = create_test_game(5, 1);

        // when (操作):
        let outcome = game.tick();

        // then (期待する結果):
        assert_eq!(outcome, TickOutcome::TimeExpired { winner: None });
    }

    #[test]
    fn test_finish_is_idempotent() {
        // テスト項目: 終了処理は一度だけ成功し、以降の操作は無効になる
        // given (前提条件):
        let mut game = create_test_game(3, 10);

        // when (操作):
        let first = game.finish();
        let second = game.finish();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(game.tick(), TickOutcome::AlreadyOver);
        assert_eq!(
            game.record_progress(&participant("p1"), 3),
            ProgressOutcome::AlreadyOver
        );
    }
}
