//! Error types for the fallible parsing and loading paths.
//!
//! Rule violations (illegal moves, empty squares, off-board coordinates) are
//! answered with `bool`/`Option` and never reach this enum.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChessError {
    /// Placement string could not be parsed into a board
    #[error("Invalid position fingerprint: {reason}")]
    InvalidFingerprint { reason: String },

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid move notation: {0}")]
    InvalidMoveNotation(String),

    /// A persisted move was not legal when replayed
    #[error("Illegal move while replaying history: {0}")]
    IllegalMove(String),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChessError {
    pub(crate) fn fingerprint(reason: impl Into<String>) -> Self {
        ChessError::InvalidFingerprint {
            reason: reason.into(),
        }
    }
}

pub type ChessResult<T> = Result<T, ChessError>;
