use thiserror::Error;

use crate::category::Category;

/// Why a game action was rejected. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no game is in progress")]
    GameNotInProgress,
    #[error("the game is over; start a new session")]
    GameFinished,
    #[error("no rolls left this turn")]
    NoRollsLeft,
    #[error("the dice have not been rolled this turn")]
    NotRolled,
    #[error("category {0} is already locked")]
    CategoryLocked(Category),
    #[error("category {0} cannot be selected")]
    NotSelectable(Category),
    #[error("unknown category key {0:?}")]
    UnknownCategory(String),
    #[error("only the host can do this")]
    NotHost,
    #[error("it is not player {player}'s turn")]
    OutOfTurn { player: usize },
    #[error("die index {index} out of range (dice count {len})")]
    DieOutOfRange { index: usize, len: usize },
    #[error("player count must be between 1 and {max} (got {count})")]
    InvalidPlayerCount { count: usize, max: usize },
}

/// Failures while decoding or encoding a sync frame. Never fatal to a session.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid frame magic")]
    BadMagic,
    #[error("CRC32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
