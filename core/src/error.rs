use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Moves are only accepted during the playing phase")]
    NotPlaying,
    #[error("Hint already spent for this level")]
    HintSpent,
    #[error("Level is not unlocked yet")]
    LevelLocked,
    #[error("No level session is active")]
    NoActiveSession,
    #[error("Current phase does not accept this request")]
    PhaseMismatch,
}

pub type Result<T> = core::result::Result<T, GameError>;
