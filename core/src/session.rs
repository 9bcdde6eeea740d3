use core::time::Duration;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::{Coord2, Direction, GameConfig, GameError, Level, Maze, MoveOutcome, Result};

/// Per-level lifecycle phase.
///
/// Valid transitions:
/// - Preparing -> Memorizing (settle timer)
/// - Memorizing -> Playing (countdown reaches zero)
/// - Playing -> Completed (goal reached)
/// - Playing -> GameOver (attempt limit reached)
/// - Completed -> Waiting (settle timer)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// A fresh maze was generated; the level is settling in.
    Preparing,
    /// Maze fully visible while the countdown runs.
    Memorizing,
    /// Maze hidden; directional moves are accepted.
    Playing,
    /// Goal reached; settling before the completion is reported.
    Completed,
    /// Attempt limit reached; terminal for this level.
    GameOver,
    /// Completion reported; holding until the player acknowledges.
    Waiting,
}

impl GamePhase {
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::Preparing)
    }

    /// Indicates the session accepts no further timers or moves.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Waiting)
    }

    pub const fn accepts_moves(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Whether the maze layout is shown in this phase, hint aside.
    pub const fn shows_maze(self) -> bool {
        matches!(self, Self::Preparing | Self::Memorizing)
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Preparing
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Preparing settle delay.
    Settle,
    /// One step of the memorize countdown.
    MemorizeTick,
    /// End of the one-shot hint reveal.
    HintOver,
    /// Completed settle delay.
    CompleteSettle,
}

/// Identifies a scheduled wait. A handle is only valid for the level instance
/// and epoch it was issued under; the epoch advances on every phase
/// transition and each session carries a process-unique instance id, so a
/// timer that outlives its phase or its level fires as a guaranteed no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerHandle {
    instance: u64,
    epoch: u64,
    kind: TimerKind,
}

/// A wait the host must schedule on its event loop, calling back into
/// [`LevelSession::fire`] with the handle once `delay` has elapsed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerRequest {
    pub handle: TimerHandle,
    pub delay: Duration,
}

/// Outcome of firing a scheduled timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The handle no longer matches the session; nothing happened.
    Stale,
    /// Preparing settled; the memorize countdown is running.
    MemorizeStarted { tick: TimerRequest },
    /// Countdown decremented and keeps running.
    CountdownTicked {
        remaining: Duration,
        tick: TimerRequest,
    },
    /// Countdown reached zero; the maze is hidden and moves are accepted.
    MazeHidden,
    /// The one-shot hint reveal ended.
    HintEnded,
    /// Completion settled; the session now waits for acknowledgment and the
    /// final attempt count is ready for scoring.
    CompletionSettled { attempts: u32 },
}

/// Outcome of a directional move request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveEvent {
    Moved(Coord2),
    /// The move landed on the goal; schedule `settle` to report completion.
    GoalReached { settle: TimerRequest },
    /// Wall collision; the attempt counter was incremented.
    Blocked { attempts: u32 },
    /// The collision pushed the counter to the configured limit.
    AttemptLimitReached { attempts: u32 },
}

impl MoveEvent {
    /// Whether this outcome is a wall collision.
    pub const fn is_collision(self) -> bool {
        matches!(self, Self::Blocked { .. } | Self::AttemptLimitReached { .. })
    }
}

/// State machine for one level instance, from maze reveal to completion or
/// game over. All waits are externalized as [`TimerRequest`]s so hosts with
/// any event loop can drive it; dropping the session cancels them all.
#[derive(Clone, Debug)]
pub struct LevelSession {
    level: Level,
    maze: Maze,
    config: GameConfig,
    player: Coord2,
    phase: GamePhase,
    instance: u64,
    epoch: u64,
    attempts: u32,
    memorize_remaining: Duration,
    memorize_total: Duration,
    hint_spent: bool,
    hint_active: bool,
    started_at: Instant,
    ended_at: Option<Instant>,
}

impl LevelSession {
    /// Starts a level in the preparing phase. The returned request is the
    /// settle timer that moves the session into memorizing.
    pub fn begin(level: Level, maze: Maze, config: GameConfig) -> (Self, TimerRequest) {
        static INSTANCE_SEQ: AtomicU64 = AtomicU64::new(0);

        let memorize_total = config.memorize_time(level);
        let player = maze.start();
        let session = Self {
            level,
            maze,
            config,
            player,
            phase: GamePhase::default(),
            instance: INSTANCE_SEQ.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
            attempts: 0,
            memorize_remaining: memorize_total,
            memorize_total,
            hint_spent: false,
            hint_active: false,
            started_at: Instant::now(),
            ended_at: None,
        };
        let settle = session.schedule(TimerKind::Settle, session.config.settle_delay);
        (session, settle)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn player(&self) -> Coord2 {
        self.player
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn memorize_remaining(&self) -> Duration {
        self.memorize_remaining
    }

    pub fn memorize_total(&self) -> Duration {
        self.memorize_total
    }

    /// Whether the hint can still be used this level.
    pub fn hint_available(&self) -> bool {
        !self.hint_spent
    }

    /// Whether the maze layout may currently be shown to the player.
    pub fn maze_visible(&self) -> bool {
        self.phase.shows_maze() || (self.phase.accepts_moves() && self.hint_active)
    }

    pub fn visible_maze(&self) -> Option<&Maze> {
        self.maze_visible().then_some(&self.maze)
    }

    /// Wall-clock time since the level started, frozen once it ends.
    pub fn elapsed(&self) -> Duration {
        self.ended_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.started_at)
    }

    fn schedule(&self, kind: TimerKind, delay: Duration) -> TimerRequest {
        TimerRequest {
            handle: TimerHandle {
                instance: self.instance,
                epoch: self.epoch,
                kind,
            },
            delay,
        }
    }

    fn transition(&mut self, phase: GamePhase) {
        log::debug!(
            "level {}: phase {:?} -> {:?}",
            self.level,
            self.phase,
            phase
        );
        self.phase = phase;
        self.epoch += 1;
        self.hint_active = false;
        if matches!(phase, GamePhase::Completed | GamePhase::GameOver) && self.ended_at.is_none() {
            self.ended_at = Some(Instant::now());
        }
    }

    /// Reports an elapsed timer. Handles issued before the last phase change
    /// are ignored; a countdown from an abandoned phase must never leak into
    /// the current one.
    pub fn fire(&mut self, handle: TimerHandle) -> SessionEvent {
        use SessionEvent::*;

        if handle.instance != self.instance || handle.epoch != self.epoch {
            log::trace!("ignoring stale timer {handle:?} at epoch {}", self.epoch);
            return Stale;
        }

        match (handle.kind, self.phase) {
            (TimerKind::Settle, GamePhase::Preparing) => {
                self.transition(GamePhase::Memorizing);
                MemorizeStarted {
                    tick: self.schedule(TimerKind::MemorizeTick, self.config.tick_interval),
                }
            }
            (TimerKind::MemorizeTick, GamePhase::Memorizing) => {
                self.memorize_remaining = self
                    .memorize_remaining
                    .saturating_sub(self.config.tick_interval);
                if self.memorize_remaining.is_zero() {
                    self.transition(GamePhase::Playing);
                    MazeHidden
                } else {
                    CountdownTicked {
                        remaining: self.memorize_remaining,
                        tick: self.schedule(TimerKind::MemorizeTick, self.config.tick_interval),
                    }
                }
            }
            (TimerKind::HintOver, GamePhase::Playing) => {
                self.hint_active = false;
                HintEnded
            }
            (TimerKind::CompleteSettle, GamePhase::Completed) => {
                self.transition(GamePhase::Waiting);
                CompletionSettled {
                    attempts: self.attempts,
                }
            }
            (kind, phase) => {
                log::warn!("timer {kind:?} fired during {phase:?}, ignoring");
                Stale
            }
        }
    }

    /// Resolves a directional move while playing. A rejected move is a wall
    /// collision: the attempt counter grows and, at the configured limit, the
    /// session ends in game over.
    pub fn try_move(&mut self, dir: Direction) -> Result<MoveEvent> {
        if !self.phase.accepts_moves() {
            return Err(GameError::NotPlaying);
        }

        match self.maze.resolve_move(self.player, dir)? {
            MoveOutcome::Moved(next) => {
                self.player = next;
                if next == self.maze.goal() {
                    self.transition(GamePhase::Completed);
                    Ok(MoveEvent::GoalReached {
                        settle: self.schedule(TimerKind::CompleteSettle, self.config.complete_delay),
                    })
                } else {
                    Ok(MoveEvent::Moved(next))
                }
            }
            MoveOutcome::Blocked => {
                self.attempts += 1;
                if self.attempts >= self.config.attempt_limit {
                    self.transition(GamePhase::GameOver);
                    Ok(MoveEvent::AttemptLimitReached {
                        attempts: self.attempts,
                    })
                } else {
                    Ok(MoveEvent::Blocked {
                        attempts: self.attempts,
                    })
                }
            }
        }
    }

    /// Reveals the maze once per level instance for a short fixed duration.
    /// Independent of phase transitions and attempt accounting.
    pub fn use_hint(&mut self) -> Result<TimerRequest> {
        if !self.phase.accepts_moves() {
            return Err(GameError::NotPlaying);
        }
        if self.hint_spent {
            return Err(GameError::HintSpent);
        }
        self.hint_spent = true;
        self.hint_active = true;
        Ok(self.schedule(TimerKind::HintOver, self.config.hint_duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Maze {
        let mut maze = Maze::sealed(2);
        maze.open_passage((0, 0), Direction::Right);
        maze.open_passage((1, 0), Direction::Down);
        maze
    }

    fn config() -> GameConfig {
        GameConfig {
            initial_memorize: Duration::from_millis(300),
            tick_interval: Duration::from_millis(100),
            ..GameConfig::default()
        }
    }

    /// Drives the session from preparing into playing by firing its timers.
    fn start_playing(session: &mut LevelSession, settle: TimerRequest) {
        let SessionEvent::MemorizeStarted { mut tick } = session.fire(settle.handle) else {
            panic!("settle timer should start memorizing");
        };
        loop {
            match session.fire(tick.handle) {
                SessionEvent::CountdownTicked { tick: next, .. } => tick = next,
                SessionEvent::MazeHidden => break,
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    fn playing_session() -> LevelSession {
        let (mut session, settle) = LevelSession::begin(1, corridor(), config());
        start_playing(&mut session, settle);
        session
    }

    #[test]
    fn settle_then_countdown_then_playing() {
        let (mut session, settle) = LevelSession::begin(1, corridor(), config());
        assert_eq!(session.phase(), GamePhase::Preparing);
        assert!(session.maze_visible());

        let SessionEvent::MemorizeStarted { tick } = session.fire(settle.handle) else {
            panic!("expected memorize start");
        };
        assert_eq!(session.phase(), GamePhase::Memorizing);
        assert!(session.maze_visible());

        let SessionEvent::CountdownTicked { remaining, tick } = session.fire(tick.handle) else {
            panic!("expected countdown tick");
        };
        assert_eq!(remaining, Duration::from_millis(200));

        let SessionEvent::CountdownTicked { tick, .. } = session.fire(tick.handle) else {
            panic!("expected countdown tick");
        };
        assert_eq!(session.fire(tick.handle), SessionEvent::MazeHidden);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(!session.maze_visible());
    }

    #[test]
    fn stale_timer_is_a_no_op() {
        let (mut session, settle) = LevelSession::begin(1, corridor(), config());
        assert!(matches!(
            session.fire(settle.handle),
            SessionEvent::MemorizeStarted { .. }
        ));
        // The same handle again: its phase is gone, so it must do nothing.
        assert_eq!(session.fire(settle.handle), SessionEvent::Stale);
        assert_eq!(session.phase(), GamePhase::Memorizing);
    }

    #[test]
    fn countdown_from_abandoned_phase_cannot_leak() {
        let mut session = playing_session();
        // A tick handle forged from a pre-playing epoch must not re-enter the countdown.
        let old_tick = TimerHandle {
            instance: session.instance,
            epoch: 0,
            kind: TimerKind::MemorizeTick,
        };
        assert_eq!(session.fire(old_tick), SessionEvent::Stale);
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn timers_from_another_level_instance_are_stale() {
        let (mut first, settle_first) = LevelSession::begin(1, corridor(), config());
        let (_second, settle_second) = LevelSession::begin(1, corridor(), config());

        assert_eq!(first.fire(settle_second.handle), SessionEvent::Stale);
        assert!(matches!(
            first.fire(settle_first.handle),
            SessionEvent::MemorizeStarted { .. }
        ));
    }

    #[test]
    fn moves_rejected_outside_playing() {
        let (mut session, _settle) = LevelSession::begin(1, corridor(), config());
        assert_eq!(
            session.try_move(Direction::Right),
            Err(GameError::NotPlaying)
        );
    }

    #[test]
    fn collision_increments_attempts_without_moving() {
        let mut session = playing_session();
        let event = session.try_move(Direction::Up).unwrap();
        assert_eq!(event, MoveEvent::Blocked { attempts: 1 });
        assert!(event.is_collision());
        assert_eq!(session.player(), (0, 0));
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn attempt_limit_ends_the_session() {
        let mut session = playing_session();
        let limit = session.config.attempt_limit;
        for n in 1..limit {
            assert_eq!(
                session.try_move(Direction::Up).unwrap(),
                MoveEvent::Blocked { attempts: n }
            );
        }
        assert_eq!(
            session.try_move(Direction::Up).unwrap(),
            MoveEvent::AttemptLimitReached { attempts: limit }
        );
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(
            session.try_move(Direction::Right),
            Err(GameError::NotPlaying)
        );
    }

    #[test]
    fn reaching_the_goal_completes_and_settles() {
        let mut session = playing_session();
        assert_eq!(
            session.try_move(Direction::Right).unwrap(),
            MoveEvent::Moved((1, 0))
        );
        let MoveEvent::GoalReached { settle } = session.try_move(Direction::Down).unwrap() else {
            panic!("expected goal");
        };
        assert_eq!(session.phase(), GamePhase::Completed);

        assert_eq!(
            session.fire(settle.handle),
            SessionEvent::CompletionSettled { attempts: 0 }
        );
        assert_eq!(session.phase(), GamePhase::Waiting);
        assert!(session.phase().is_terminal());
    }

    #[test]
    fn hint_reveals_once_per_level() {
        let mut session = playing_session();
        assert!(session.hint_available());
        assert!(!session.maze_visible());

        let over = session.use_hint().unwrap();
        assert!(session.maze_visible());
        assert!(session.visible_maze().is_some());
        assert!(!session.hint_available());

        assert_eq!(session.fire(over.handle), SessionEvent::HintEnded);
        assert!(!session.maze_visible());

        assert_eq!(session.use_hint(), Err(GameError::HintSpent));
    }

    #[test]
    fn hint_rejected_while_memorizing() {
        let (mut session, _settle) = LevelSession::begin(1, corridor(), config());
        assert_eq!(session.use_hint(), Err(GameError::NotPlaying));
    }

    #[test]
    fn hint_does_not_touch_attempts_or_phase() {
        let mut session = playing_session();
        let _ = session.use_hint().unwrap();
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.phase(), GamePhase::Playing);
    }
}
