//! Computational core of a UCI chess engine: move generation, position
//! make/unmake, search, static evaluation, and the transposition table.
//! The UCI protocol loop itself lives in the `uci` binary target; this
//! crate is the engine library it drives.

pub mod attacks;
pub mod bitboard;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod magic;
pub mod movegen;
pub mod ordering;
pub mod pawn_cache;
pub mod position;
pub mod psqt;
pub mod search;
pub mod see;
pub mod sync;
pub mod timer;
pub mod tt;
pub mod types;
pub mod zobrist;
