use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{GameConfig, Level};

/// Player progress that survives across sessions. Mutated only on level
/// completion, on the game-over policy, or by an explicit reset; the host is
/// expected to write it back after each mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Highest level the player may start. Non-decreasing except for the
    /// full-reset branch of the game-over policy.
    pub highest_unlocked: Level,
    /// Every level ever finished, first completions and replays alike.
    pub completed: BTreeSet<Level>,
    /// Cumulative score; only first completions contribute.
    pub score: u64,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            highest_unlocked: 1,
            completed: BTreeSet::new(),
            score: 0,
        }
    }
}

/// Scoring report for a finished level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReward {
    pub level: Level,
    /// Points awarded; zero on replays.
    pub points: u64,
    pub first_clear: bool,
}

/// Which branch the game-over policy took, pre-computed for the presentation
/// layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverRuling {
    /// The failed level had never been finished: all progress is wiped and
    /// play restarts from level 1. Harsh on purpose; this is the product
    /// rule, not an accident.
    ProgressReset,
    /// The failed level was completed before: progress is untouched and the
    /// player returns to level selection.
    ProgressKept,
}

impl GameOverRuling {
    pub const fn is_reset(self) -> bool {
        matches!(self, Self::ProgressReset)
    }
}

impl ProgressState {
    pub fn is_unlocked(&self, level: Level) -> bool {
        level >= 1 && level <= self.highest_unlocked
    }

    pub fn is_completed(&self, level: Level) -> bool {
        self.completed.contains(&level)
    }

    /// Applies a level completion. Only the first-ever completion of a level
    /// awards points; unlocking advances to `level + 1` and never moves
    /// backwards.
    pub fn record_completion(
        &mut self,
        level: Level,
        attempts: u32,
        config: &GameConfig,
    ) -> LevelReward {
        let first_clear = self.completed.insert(level);
        let points = if first_clear {
            config.points(level, attempts)
        } else {
            0
        };
        self.score += points;
        if level >= self.highest_unlocked {
            self.highest_unlocked = level + 1;
        }
        log::debug!(
            "level {level} completed with {attempts} attempts: +{points} points (total {})",
            self.score
        );
        LevelReward {
            level,
            points,
            first_clear,
        }
    }

    /// Applies the game-over policy for a failed level.
    pub fn record_game_over(&mut self, level: Level) -> GameOverRuling {
        if self.is_completed(level) {
            log::debug!("game over on cleared level {level}, progress kept");
            GameOverRuling::ProgressKept
        } else {
            log::debug!("game over on uncleared level {level}, wiping progress");
            *self = Self::default();
            GameOverRuling::ProgressReset
        }
    }
}
