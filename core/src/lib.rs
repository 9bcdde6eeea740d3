//! Game logic for meiro, a memorize-then-navigate maze game.
//!
//! A maze is shown briefly, hidden, and the player has to walk it from the
//! top-left corner to the bottom-right one from memory. This crate holds all
//! the logic and none of the presentation: maze generation
//! ([`BacktrackingGenerator`]), movement resolution ([`Maze::resolve_move`]),
//! the per-level phase machine ([`LevelSession`]), and progression and
//! scoring ([`ProgressState`]), tied together by [`GameFlow`].
//!
//! The crate never blocks and never reads a clock for control flow: every
//! wait is handed to the host as a [`TimerRequest`], and the host reports
//! elapsed timers back through [`GameFlow::fire`]. Handles are scoped to the
//! level instance and phase that issued them, so a timer surviving either is
//! ignored when it fires.

use core::time::Duration;

pub use error::*;
pub use flow::*;
pub use generator::*;
pub use maze::*;
pub use progress::*;
pub use session::*;
pub use types::*;

mod error;
mod flow;
mod generator;
mod maze;
mod progress;
mod session;
mod types;

/// Tunable game rules. Every product decision lives here rather than in the
/// engine code: attempt limit, scoring constants, timing, and the per-level
/// difficulty curves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// Maze edge length at level 1.
    pub base_size: Coord,
    /// Cap on the extra edge length gained through levels.
    pub max_size_growth: Coord,
    /// Memorize countdown at level 1.
    pub initial_memorize: Duration,
    /// How much the countdown shrinks per level.
    pub memorize_step: Duration,
    /// Countdown floor for high levels.
    pub min_memorize: Duration,
    /// Wall collisions allowed before the level ends in game over.
    pub attempt_limit: u32,
    /// Pause in the preparing phase before memorizing starts.
    pub settle_delay: Duration,
    /// Pause after reaching the goal before completion is reported.
    pub complete_delay: Duration,
    /// Length of the one-shot hint reveal.
    pub hint_duration: Duration,
    /// Granularity of the memorize countdown.
    pub tick_interval: Duration,
    /// Per-level points before the attempt penalty.
    pub base_points: u32,
    /// Points lost per wall collision.
    pub attempt_penalty: u32,
    /// Per-level points floor.
    pub min_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_size: 5,
            max_size_growth: 5,
            initial_memorize: Duration::from_secs(5),
            memorize_step: Duration::from_millis(500),
            min_memorize: Duration::from_millis(1500),
            attempt_limit: 10,
            settle_delay: Duration::from_secs(1),
            complete_delay: Duration::from_millis(500),
            hint_duration: Duration::from_secs(1),
            tick_interval: Duration::from_millis(100),
            base_points: 100,
            attempt_penalty: 10,
            min_points: 10,
        }
    }
}

impl GameConfig {
    /// Maze edge length for `level`: grows every other level until capped.
    pub fn maze_size(&self, level: Level) -> Coord {
        let growth = (level / 2).min(self.max_size_growth as Level) as Coord;
        self.base_size.saturating_add(growth)
    }

    /// Memorize countdown for `level`: shrinks per level down to the floor.
    pub fn memorize_time(&self, level: Level) -> Duration {
        let shrink = self.memorize_step * level.saturating_sub(1);
        self.initial_memorize.saturating_sub(shrink).max(self.min_memorize)
    }

    /// Points for finishing `level` with `attempts` wall collisions.
    pub fn points(&self, level: Level, attempts: u32) -> u64 {
        let per_level = self
            .base_points
            .saturating_sub(attempts.saturating_mul(self.attempt_penalty))
            .max(self.min_points);
        u64::from(per_level) * u64::from(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maze_size_grows_every_other_level_until_capped() {
        let config = GameConfig::default();
        assert_eq!(config.maze_size(1), 5);
        assert_eq!(config.maze_size(2), 6);
        assert_eq!(config.maze_size(3), 6);
        assert_eq!(config.maze_size(9), 9);
        assert_eq!(config.maze_size(10), 10);
        assert_eq!(config.maze_size(50), 10);
    }

    #[test]
    fn memorize_time_shrinks_to_the_floor() {
        let config = GameConfig::default();
        assert_eq!(config.memorize_time(1), Duration::from_secs(5));
        assert_eq!(config.memorize_time(2), Duration::from_millis(4500));
        assert_eq!(config.memorize_time(8), Duration::from_millis(1500));
        assert_eq!(config.memorize_time(100), Duration::from_millis(1500));
    }

    #[test]
    fn points_scale_with_level_and_shrink_with_attempts() {
        let config = GameConfig::default();
        assert_eq!(config.points(1, 0), 100);
        assert_eq!(config.points(1, 3), 70);
        assert_eq!(config.points(4, 2), 320);
        // deep into the penalty the floor holds
        assert_eq!(config.points(2, 9), 20);
        assert_eq!(config.points(2, 50), 20);
    }
}
