//! Zobrist hashing tables.
//!
//! Keys are generated once from a fixed seed so runs are reproducible. A
//! separate pawn-only key (piece/square contributions for pawns plus side
//! to move) is kept for the pawn-structure cache.

use crate::types::{Color, PieceType, Square};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ZOBRIST_SEED: u64 = 0x5EED_C0DE_1234_5678;

struct ZobristKeys {
    /// `piece_square[color][piece_plane][square]`
    piece_square: [[[u64; 64]; 6]; 2],
    black_to_move: u64,
    /// `castling[rights]`, one key per one of the 16 castling-rights combinations.
    castling: [u64; 16],
    /// `en_passant[file]`
    en_passant: [u64; 8],
}

impl ZobristKeys {
    fn generate() -> ZobristKeys {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let mut piece_square = [[[0u64; 64]; 6]; 2];
        for color in piece_square.iter_mut() {
            for plane in color.iter_mut() {
                for key in plane.iter_mut() {
                    *key = rng.gen();
                }
            }
        }
        let black_to_move = rng.gen();
        let mut castling = [0u64; 16];
        for key in castling.iter_mut() {
            *key = rng.gen();
        }
        let mut en_passant = [0u64; 8];
        for key in en_passant.iter_mut() {
            *key = rng.gen();
        }
        ZobristKeys { piece_square, black_to_move, castling, en_passant }
    }
}

static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::generate);

#[inline]
#[must_use]
pub fn piece_square_key(color: Color, kind: PieceType, sq: Square) -> u64 {
    ZOBRIST.piece_square[color.index()][kind.plane()][sq.as_usize()]
}

#[inline]
#[must_use]
pub fn side_to_move_key() -> u64 {
    ZOBRIST.black_to_move
}

#[inline]
#[must_use]
pub fn castling_key(rights: u8) -> u64 {
    ZOBRIST.castling[rights as usize & 0xF]
}

#[inline]
#[must_use]
pub fn en_passant_key(file: u8) -> u64 {
    ZOBRIST.en_passant[file as usize & 0x7]
}

/// True when `kind` contributes to the pawn-only key (pawns only; side to
/// move is folded in separately by the caller via [`side_to_move_key`]).
#[inline]
#[must_use]
pub fn is_pawn_key_component(kind: PieceType) -> bool {
    kind == PieceType::Pawn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic_across_calls() {
        let a = piece_square_key(Color::White, PieceType::Knight, Square::new(5));
        let b = piece_square_key(Color::White, PieceType::Knight, Square::new(5));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_inputs_yield_distinct_keys() {
        let a = piece_square_key(Color::White, PieceType::Knight, Square::new(5));
        let b = piece_square_key(Color::Black, PieceType::Knight, Square::new(5));
        let c = piece_square_key(Color::White, PieceType::Bishop, Square::new(5));
        let d = piece_square_key(Color::White, PieceType::Knight, Square::new(6));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
