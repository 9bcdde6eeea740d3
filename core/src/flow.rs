use core::time::Duration;
use rand::prelude::*;

use crate::{
    BacktrackingGenerator, Coord2, Direction, GameConfig, GameError, GameOverRuling, GamePhase,
    Level, LevelReward, LevelSession, MazeGenerator, MoveEvent, ProgressState, Result,
    SessionEvent, TimerHandle, TimerRequest,
};

/// Everything a timer firing or a move request can surface to the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowEvent {
    /// A timer from an abandoned phase or level; nothing happened.
    Stale,
    MemorizeStarted {
        tick: TimerRequest,
    },
    CountdownTicked {
        remaining: Duration,
        tick: TimerRequest,
    },
    MazeHidden,
    HintEnded,
    Moved(Coord2),
    /// One-shot collision pulse for feedback.
    Collision {
        attempts: u32,
    },
    GoalReached {
        settle: TimerRequest,
    },
    /// Scoring has been applied; the session is waiting for acknowledgment.
    LevelCompleted {
        reward: LevelReward,
        total_score: u64,
    },
    /// The attempt limit was reached and the game-over policy applied.
    GameOver {
        attempts: u32,
        ruling: GameOverRuling,
    },
}

/// Ties the pieces together: picks levels, generates their mazes, runs the
/// per-level session, and feeds completion and failure signals into the
/// progression state.
///
/// The flow is single-threaded and event-driven: every wait comes back as a
/// [`TimerRequest`] for the host's event loop, and every host callback lands
/// in [`GameFlow::fire`] or [`GameFlow::try_move`]. One injected seed makes a
/// whole run reproducible, per-level mazes included.
#[derive(Clone, Debug)]
pub struct GameFlow {
    config: GameConfig,
    progress: ProgressState,
    seeds: SmallRng,
    level: Level,
    session: Option<LevelSession>,
}

impl GameFlow {
    pub fn new(config: GameConfig, progress: ProgressState, seed: u64) -> Self {
        Self {
            config,
            progress,
            seeds: SmallRng::seed_from_u64(seed),
            level: 1,
            session: None,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn session(&self) -> Option<&LevelSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> Option<GamePhase> {
        self.session.as_ref().map(LevelSession::phase)
    }

    /// Generates a fresh maze and enters the preparing phase for `level`.
    /// Replaces any running session, which retires its timers.
    pub fn start_level(&mut self, level: Level) -> Result<TimerRequest> {
        if !self.progress.is_unlocked(level) {
            return Err(GameError::LevelLocked);
        }

        let size = self.config.maze_size(level);
        let maze = BacktrackingGenerator::new(self.seeds.random()).generate(size);
        let (session, settle) = LevelSession::begin(level, maze, self.config.clone());

        log::debug!("starting level {level} with a {size}x{size} maze");
        self.level = level;
        self.session = Some(session);
        Ok(settle)
    }

    /// Abandons the current level, if any. Outstanding timers become stale.
    pub fn exit_level(&mut self) {
        if self.session.take().is_some() {
            log::debug!("level {} abandoned", self.level);
        }
    }

    /// Acknowledges a completed level and moves on to the next one.
    pub fn advance_to_next(&mut self) -> Result<TimerRequest> {
        let session = self.session.as_ref().ok_or(GameError::NoActiveSession)?;
        if session.phase() != GamePhase::Waiting {
            return Err(GameError::PhaseMismatch);
        }
        let next = self.level + 1;
        self.session = None;
        self.start_level(next)
    }

    /// Routes an elapsed timer into the session; completion settling also
    /// applies the scoring rules.
    pub fn fire(&mut self, handle: TimerHandle) -> FlowEvent {
        let Some(session) = self.session.as_mut() else {
            return FlowEvent::Stale;
        };

        match session.fire(handle) {
            SessionEvent::Stale => FlowEvent::Stale,
            SessionEvent::MemorizeStarted { tick } => FlowEvent::MemorizeStarted { tick },
            SessionEvent::CountdownTicked { remaining, tick } => {
                FlowEvent::CountdownTicked { remaining, tick }
            }
            SessionEvent::MazeHidden => FlowEvent::MazeHidden,
            SessionEvent::HintEnded => FlowEvent::HintEnded,
            SessionEvent::CompletionSettled { attempts } => {
                let reward = self
                    .progress
                    .record_completion(self.level, attempts, &self.config);
                FlowEvent::LevelCompleted {
                    reward,
                    total_score: self.progress.score,
                }
            }
        }
    }

    /// Forwards a directional move request; hitting the attempt limit also
    /// applies the game-over policy.
    pub fn try_move(&mut self, dir: Direction) -> Result<FlowEvent> {
        let level = self.level;
        let session = self.session.as_mut().ok_or(GameError::NoActiveSession)?;

        Ok(match session.try_move(dir)? {
            MoveEvent::Moved(pos) => FlowEvent::Moved(pos),
            MoveEvent::GoalReached { settle } => FlowEvent::GoalReached { settle },
            MoveEvent::Blocked { attempts } => FlowEvent::Collision { attempts },
            MoveEvent::AttemptLimitReached { attempts } => {
                let ruling = self.progress.record_game_over(level);
                if ruling.is_reset() {
                    self.level = 1;
                }
                FlowEvent::GameOver { attempts, ruling }
            }
        })
    }

    /// Reveals the maze once per level instance.
    pub fn use_hint(&mut self) -> Result<TimerRequest> {
        self.session
            .as_mut()
            .ok_or(GameError::NoActiveSession)?
            .use_hint()
    }
}
