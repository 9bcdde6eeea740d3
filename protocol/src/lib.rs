//! Presentation and persistence boundary for the meiro core.
//!
//! The core itself performs no I/O. This crate defines the two surfaces a
//! host wires up instead: a key/value [`KeyValueStore`] that progress is
//! loaded from once at startup and written back to after each mutation, and
//! a serializable [`Snapshot`] of everything the presentation layer is
//! allowed to observe at a given instant.
//!
//! Each progress entry is an independent JSON value under its own key. An
//! absent or malformed entry loads as that entry's default; persistence
//! problems never surface to the player.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use meiro_core::{Coord2, GameFlow, GamePhase, Level, Maze, ProgressState};

pub const KEY_HIGHEST_UNLOCKED: &str = "meiro:highestLevelUnlocked";
pub const KEY_SCORE: &str = "meiro:score";
pub const KEY_COMPLETED_LEVELS: &str = "meiro:completedLevels";

/// Minimal key/value persistence supplied by the host (browser local
/// storage, a file, ...). Implementations swallow their own I/O failures: a
/// read that fails is an absent key, and a write that fails loses nothing
/// but this session's progress.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store, the fallback when the host has no durable storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
    }
}

fn load_entry<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str, default: T) -> T {
    match store.get(key) {
        None => default,
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Discarding malformed entry {key}: {err}");
                default
            }
        },
    }
}

fn save_entry<T: Serialize>(store: &mut impl KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(err) => log::warn!("Could not encode entry {key}: {err}"),
    }
}

/// Reads progress from the store, substituting defaults for anything absent
/// or malformed. Intended to run once at startup.
pub fn load_progress(store: &impl KeyValueStore) -> ProgressState {
    let defaults = ProgressState::default();
    let highest: Level = load_entry(store, KEY_HIGHEST_UNLOCKED, defaults.highest_unlocked);
    let score: u64 = load_entry(store, KEY_SCORE, defaults.score);
    let completed: Vec<Level> = load_entry(store, KEY_COMPLETED_LEVELS, Vec::new());

    ProgressState {
        // a stored zero would lock the player out of every level
        highest_unlocked: highest.max(1),
        completed: completed.into_iter().collect(),
        score,
    }
}

/// Writes all three progress entries back to the store.
pub fn save_progress(store: &mut impl KeyValueStore, progress: &ProgressState) {
    save_entry(store, KEY_HIGHEST_UNLOCKED, &progress.highest_unlocked);
    save_entry(store, KEY_SCORE, &progress.score);
    let completed: Vec<Level> = progress.completed.iter().copied().collect();
    save_entry(store, KEY_COMPLETED_LEVELS, &completed);
}

/// Everything the presentation layer may observe, captured at one instant.
/// The maze layout is only present while the current phase actually shows it,
/// so a renderer working from snapshots cannot leak a hidden maze.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub level: Level,
    /// `None` when no level session is active.
    pub phase: Option<GamePhase>,
    pub maze: Option<Maze>,
    pub player: Option<Coord2>,
    pub goal: Option<Coord2>,
    pub attempts: u32,
    pub memorize_remaining_ms: Option<u64>,
    pub hint_available: bool,
    pub score: u64,
    pub highest_unlocked: Level,
}

impl Snapshot {
    pub fn capture(flow: &GameFlow) -> Self {
        let session = flow.session();
        Self {
            level: flow.level(),
            phase: session.map(|s| s.phase()),
            maze: session.and_then(|s| s.visible_maze().cloned()),
            player: session.map(|s| s.player()),
            goal: session.map(|s| s.maze().goal()),
            attempts: session.map(|s| s.attempts()).unwrap_or(0),
            memorize_remaining_ms: session
                .filter(|s| s.phase() == GamePhase::Memorizing)
                .map(|s| s.memorize_remaining().as_millis() as u64),
            hint_available: session.is_some_and(|s| s.hint_available()),
            score: flow.progress().score,
            highest_unlocked: flow.progress().highest_unlocked,
        }
    }
}
