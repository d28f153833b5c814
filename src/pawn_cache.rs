//! Pawn structure evaluation and its lockless hash table.
//!
//! Pawn shape changes rarely relative to how often evaluation runs, so the
//! mid/end-game pawn score is cached by the pawn-only Zobrist key
//! ([`Position::pawn_key`]): atomics with an XOR-verified key, no locking.
//! The structural scoring itself covers doubled/isolated/blocked/phalanx/
//! supported pawns and passed-pawn bonuses with stop-square control.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::attacks;
use crate::bitboard::{self, Bitboard};
use crate::position::Position;
use crate::types::{Color, PieceType, Square};
use once_cell::sync::Lazy;

const DOUBLED_PAWN_MG: i32 = -10;
const DOUBLED_PAWN_EG: i32 = 0;
const ISOLATED_PAWN_MG: i32 = -7;
const ISOLATED_PAWN_EG: i32 = -9;
const ISOLATED_OPEN_MG: i32 = -9;
const ISOLATED_OPEN_EG: i32 = 0;
const BLOCKED_PAWN_MG: i32 = -4;
const BLOCKED_PAWN_EG: i32 = -8;
const PHALANX_BONUS_MG: [i32; 8] = [0, 0, 3, 5, 12, 25, 50, 0];
const PHALANX_BONUS_EG: [i32; 8] = [0, 0, 2, 4, 8, 15, 30, 0];
const DEFENDED_BONUS_MG: [i32; 8] = [0, 0, 5, 8, 12, 20, 35, 0];
const DEFENDED_BONUS_EG: [i32; 8] = [0, 0, 3, 5, 8, 12, 20, 0];
const PASSED_PAWN_BONUS_MG: [i32; 8] = [0, 5, 10, 20, 35, 60, 100, 0];
const PASSED_PAWN_BONUS_EG: [i32; 8] = [0, 10, 20, 40, 70, 120, 200, 0];
const ROOK_BEHIND_PASSER_MG: i32 = 15;
const ROOK_BEHIND_PASSER_EG: i32 = 25;

fn relative_rank(rank: u8, color: Color) -> usize {
    match color {
        Color::White => rank as usize,
        Color::Black => 7 - rank as usize,
    }
}

fn fill_forward(sq_bb: Bitboard, color: Color) -> Bitboard {
    let mut bb = sq_bb;
    match color {
        Color::White => {
            bb |= bb << 8;
            bb |= bb << 16;
            bb |= bb << 32;
        }
        Color::Black => {
            bb |= bb >> 8;
            bb |= bb >> 16;
            bb |= bb >> 32;
        }
    }
    bb & !sq_bb
}

/// `PAWN_SUPPORT_MASK[color][square]`: squares holding a friendly pawn that
/// supports (phalanx or diagonally defends) a pawn on `square`.
static PAWN_SUPPORT_MASK: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut masks = [[0u64; 64]; 2];
    for sq_idx in 0u8..64 {
        let sq = Square::new(sq_idx);
        let file = sq.file_of().0 as i32;
        let rank = sq.rank_of().0 as i32;
        for (color_idx, step) in [(0usize, -1i32), (1usize, 1i32)] {
            let mut mask = 0u64;
            let behind_rank = rank + step;
            if file > 0 {
                mask |= Square::from_file_rank(
                    crate::types::File((file - 1) as u8),
                    crate::types::Rank(rank as u8),
                )
                .bitboard();
                if (0..8).contains(&behind_rank) {
                    mask |= Square::from_file_rank(
                        crate::types::File((file - 1) as u8),
                        crate::types::Rank(behind_rank as u8),
                    )
                    .bitboard();
                }
            }
            if file < 7 {
                mask |= Square::from_file_rank(
                    crate::types::File((file + 1) as u8),
                    crate::types::Rank(rank as u8),
                )
                .bitboard();
                if (0..8).contains(&behind_rank) {
                    mask |= Square::from_file_rank(
                        crate::types::File((file + 1) as u8),
                        crate::types::Rank(behind_rank as u8),
                    )
                    .bitboard();
                }
            }
            masks[color_idx][sq_idx as usize] = mask;
        }
    }
    masks
});

/// Doubled/isolated/blocked/phalanx/supported pawn scoring, white-relative.
#[must_use]
fn eval_pawn_shape(pos: &Position) -> (i32, i32) {
    let mut mg = 0;
    let mut eg = 0;

    let occupied = pos.occupied_all();

    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        let own_pawns = pos.pieces_bb(color, PieceType::Pawn);
        let enemy_pawns = pos.pieces_bb(color.flip(), PieceType::Pawn);

        let mut iter = own_pawns;
        while iter != 0 {
            let sq = bitboard::pop_lsb(&mut iter);
            let file = sq.file_of().0 as usize;
            let rel_rank = relative_rank(sq.rank_of().0, color);
            let ahead = fill_forward(sq.bitboard(), color);

            if ahead & own_pawns != 0 {
                mg += sign * DOUBLED_PAWN_MG;
                eg += sign * DOUBLED_PAWN_EG;
            }

            let support_mask = PAWN_SUPPORT_MASK[color.index()][sq.as_usize()];
            let is_supported = support_mask & own_pawns != 0;

            if is_supported {
                let adjacent = bitboard::NEIGHBOUR_FILES_MASK[file];
                let same_rank = bitboard::rank_mask(sq.rank_of());
                let phalanx = adjacent & same_rank & own_pawns != 0;
                if phalanx {
                    mg += sign * PHALANX_BONUS_MG[rel_rank];
                    eg += sign * PHALANX_BONUS_EG[rel_rank];
                } else {
                    mg += sign * DEFENDED_BONUS_MG[rel_rank];
                    eg += sign * DEFENDED_BONUS_EG[rel_rank];
                }
            } else {
                let adjacent_files = bitboard::NEIGHBOUR_FILES_MASK[file];
                let has_adjacent_pawn = adjacent_files & own_pawns != 0;
                let is_open = ahead & enemy_pawns == 0;

                if !has_adjacent_pawn {
                    mg += sign * ISOLATED_PAWN_MG;
                    eg += sign * ISOLATED_PAWN_EG;
                    if is_open {
                        mg += sign * ISOLATED_OPEN_MG;
                        eg += sign * ISOLATED_OPEN_EG;
                    }
                }
            }

            let push_dir = if color == Color::White { crate::types::Direction::NORTH } else { crate::types::Direction::SOUTH };
            if let Some(push_sq) = sq.to(push_dir) {
                if push_sq.bitboard() & occupied != 0 {
                    mg += sign * BLOCKED_PAWN_MG;
                    eg += sign * BLOCKED_PAWN_EG;
                }
            }
        }
    }

    (mg, eg)
}

/// True if the pawn on `sq` has no enemy pawn ahead of it on its own file or
/// either adjacent file.
#[must_use]
pub fn is_passed_pawn(pos: &Position, sq: Square, color: Color) -> bool {
    let enemy_pawns = pos.pieces_bb(color.flip(), PieceType::Pawn);
    bitboard::PASSED_PAWN_MASK[color.index()][sq.as_usize()] & enemy_pawns == 0
}

/// Passed-pawn bonus, scaled by whether the square just ahead ("the stop
/// square") is controlled by the pawn's own side, the defender, or
/// occupied, plus a bonus for a friendly rook (penalty for an enemy rook)
/// supporting the pawn from behind on its file.
#[must_use]
fn eval_passed_pawns(pos: &Position) -> (i32, i32) {
    let mut mg = 0;
    let mut eg = 0;
    let white_attacks = attacks::color_attacks(pos, Color::White);
    let black_attacks = attacks::color_attacks(pos, Color::Black);
    let occupied = pos.occupied_all();

    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        let own_pawns = pos.pieces_bb(color, PieceType::Pawn);
        let (our_attacks, their_attacks) = match color {
            Color::White => (white_attacks, black_attacks),
            Color::Black => (black_attacks, white_attacks),
        };
        let our_rooks = pos.pieces_bb(color, PieceType::Rook);
        let their_rooks = pos.pieces_bb(color.flip(), PieceType::Rook);

        let mut iter = own_pawns;
        while iter != 0 {
            let sq = bitboard::pop_lsb(&mut iter);
            if !is_passed_pawn(pos, sq, color) {
                continue;
            }
            let rank = sq.rank_of().0;
            let rel_rank = relative_rank(rank, color);

            let stop_sq = match color {
                Color::White if rank < 7 => Some(Square::from_file_rank(sq.file_of(), crate::types::Rank(rank + 1))),
                Color::Black if rank > 0 => Some(Square::from_file_rank(sq.file_of(), crate::types::Rank(rank - 1))),
                _ => None,
            };

            let mut multiplier = 100i32;
            if let Some(stop) = stop_sq {
                let stop_bb = stop.bitboard();
                if stop_bb & our_attacks != 0 {
                    multiplier += 33;
                }
                if stop_bb & their_attacks != 0 {
                    multiplier -= 33;
                }
                if stop_bb & occupied != 0 {
                    multiplier -= 15;
                }
            }

            mg += sign * (PASSED_PAWN_BONUS_MG[rel_rank] * multiplier / 100);
            eg += sign * (PASSED_PAWN_BONUS_EG[rel_rank] * multiplier / 100);

            let behind = fill_forward(sq.bitboard(), color.flip()) & bitboard::file_mask(sq.file_of());
            if our_rooks & behind != 0 {
                mg += sign * ROOK_BEHIND_PASSER_MG;
                eg += sign * ROOK_BEHIND_PASSER_EG;
            }
            if their_rooks & behind != 0 {
                mg -= sign * (ROOK_BEHIND_PASSER_MG / 2);
                eg -= sign * (ROOK_BEHIND_PASSER_EG / 2);
            }
        }
    }

    (mg, eg)
}

/// Full pawn-structure score (shape + passed pawns), white-relative,
/// uncached. Use [`PawnCache::probe_or_compute`] in the hot evaluation path.
#[must_use]
pub fn eval_pawn_structure(pos: &Position) -> (i32, i32) {
    let (shape_mg, shape_eg) = eval_pawn_shape(pos);
    let (passed_mg, passed_eg) = eval_passed_pawns(pos);
    (shape_mg + passed_mg, shape_eg + passed_eg)
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    mg: i32,
    eg: i32,
}

fn pack(mg: i32, eg: i32) -> u64 {
    (mg as u32 as u64) | ((eg as u32 as u64) << 32)
}

fn unpack(data: u64) -> Entry {
    Entry {
        mg: data as u32 as i32,
        eg: (data >> 32) as u32 as i32,
    }
}

struct Slot {
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    fn new() -> Slot {
        Slot { key_xor: AtomicU64::new(0), data: AtomicU64::new(0) }
    }

    fn store(&self, key: u64, packed: u64) {
        self.data.store(packed, Ordering::Relaxed);
        self.key_xor.store(key ^ packed, Ordering::Relaxed);
    }

    fn probe(&self, key: u64) -> Option<Entry> {
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        if data != 0 && key_xor ^ data == key {
            Some(unpack(data))
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        self.data.load(Ordering::Relaxed) == 0
    }
}

/// Lockless pawn-structure cache, shared across search threads and indexed
/// by [`Position::pawn_key`].
pub struct PawnCache {
    slots: Vec<Slot>,
    mask: usize,
}

unsafe impl Send for PawnCache {}
unsafe impl Sync for PawnCache {}

impl PawnCache {
    #[must_use]
    pub fn new(size_kb: usize) -> PawnCache {
        let slot_bytes = std::mem::size_of::<Slot>();
        let mut count = (size_kb * 1024 / slot_bytes).next_power_of_two();
        if count == 0 {
            count = 1024;
        }
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, Slot::new);
        PawnCache { slots, mask: count - 1 }
    }

    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    /// Returns the cached score for `pos`'s pawn structure, computing and
    /// storing it on a cache miss.
    #[must_use]
    pub fn probe_or_compute(&self, pos: &Position) -> (i32, i32) {
        let key = pos.pawn_key();
        let slot = &self.slots[self.index(key)];
        if let Some(entry) = slot.probe(key) {
            return (entry.mg, entry.eg);
        }
        let (mg, eg) = eval_pawn_structure(pos);
        slot.store(key, pack(mg, eg));
        (mg, eg)
    }

    pub fn clear(&self) {
        for slot in &self.slots {
            slot.key_xor.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for PawnCache {
    fn default() -> PawnCache {
        PawnCache::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubled_pawns_are_penalized() {
        let doubled = Position::from_fen("4k3/8/8/8/4P3/8/4P3/4K3 w - - 0 1").unwrap();
        let single = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let (mg_doubled, _) = eval_pawn_structure(&doubled);
        let (mg_single, _) = eval_pawn_structure(&single);
        assert!(mg_doubled < mg_single);
    }

    #[test]
    fn isolated_pawn_is_detected_without_adjacent_support() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/P1P1P3/4K3 w - - 0 1").unwrap();
        let (mg, _) = eval_pawn_structure(&pos);
        // a2 and c2/e2 are mutually isolated (no neighbouring files occupied).
        assert!(mg < 0);
    }

    #[test]
    fn blocked_pawn_is_penalized_relative_to_a_free_pawn() {
        // A bishop (not a pawn) sits on the push square so the only
        // structural difference from the free case is occupancy of that
        // square, not an extra enemy pawn contributing its own terms.
        let blocked = Position::from_fen("4k3/8/8/8/8/4b3/4P3/4K3 w - - 0 1").unwrap();
        let free = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let (mg_blocked, _) = eval_pawn_structure(&blocked);
        let (mg_free, _) = eval_pawn_structure(&free);
        assert!(mg_blocked < mg_free);
    }

    #[test]
    fn passed_pawn_on_open_file_is_detected() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let e2 = Square::from_algebraic("e2").unwrap();
        assert!(is_passed_pawn(&pos, e2, Color::White));
    }

    #[test]
    fn pawn_cache_returns_consistent_value_on_repeated_probe() {
        let pos = Position::startpos();
        let cache = PawnCache::new(64);
        let first = cache.probe_or_compute(&pos);
        let second = cache.probe_or_compute(&pos);
        assert_eq!(first, second);
    }
}
