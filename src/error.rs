//! Error types surfaced by the engine's public API.
//!
//! Plain enums with manual `Display`/`Error` impls, no `thiserror`/`anyhow`,
//! one variant per distinct failure rather than a single stringly-typed
//! catch-all.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// FEN string failed to parse.
    InvalidFen(String),
    /// UCI move string was not well-formed (wrong length, bad square, bad
    /// promotion letter).
    InvalidMoveNotation(String),
    /// Move notation parsed but does not name a legal move in the current
    /// position.
    IllegalMove(String),
    /// `setoption` named an option the engine does not have.
    UnknownOption(String),
    /// `setoption` supplied a value outside the option's declared range or
    /// choice set.
    InvalidOptionValue { name: String, value: String },
    /// A search control method (`stop`, `ponder_hit`, ...) was called while
    /// no search was running.
    NoSearchInProgress,
    /// `start_search` was called while a search was already running.
    SearchAlreadyInProgress,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidFen(fen) => write!(f, "invalid FEN: '{fen}'"),
            EngineError::InvalidMoveNotation(s) => write!(f, "invalid move notation '{s}'"),
            EngineError::IllegalMove(s) => write!(f, "illegal move '{s}'"),
            EngineError::UnknownOption(name) => write!(f, "unknown option '{name}'"),
            EngineError::InvalidOptionValue { name, value } => {
                write!(f, "invalid value '{value}' for option '{name}'")
            }
            EngineError::NoSearchInProgress => write!(f, "no search is in progress"),
            EngineError::SearchAlreadyInProgress => write!(f, "a search is already in progress"),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
