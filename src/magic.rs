//! Fancy magic bitboards for sliding-piece attacks.
//!
//! For each square and each slider (bishop, rook), we precompute a mask of
//! "relevant occupancy" bits, find a magic multiplier that maps every subset
//! of that mask to a collision-free index, and store the resulting attack
//! set in a flat per-square table. Queen attacks are the union of bishop and
//! rook attacks.
//!
//! The magic search follows Stockfish's algorithm: a sparse xorshift64star
//! PRNG seeded per-rank, with an epoch array standing in for the attack
//! table so candidate magics can be probed without clearing anything between
//! attempts. Grounded on `examples/other_examples/..._pleco-src-core-magic_helper.rs.rs`,
//! which documents the same seed table and epoch trick (there called `age`).

use crate::bitboard::{bishop_attacks_by_rays, rook_attacks_by_rays, popcount};
use crate::types::Square;
use once_cell::sync::Lazy;

pub type Bitboard = u64;

/// Per-rank PRNG seeds for the rook and bishop magic search, reproduced from
/// Stockfish's `Bitboards::init`. Larger seeds bias the search toward
/// sparser candidate numbers on ranks where the relevant-occupancy mask is
/// bigger (the middle ranks), which converges faster.
const ROOK_SEEDS: [u64; 8] = [
    8977, 44_560, 54_343, 38_998, 5731, 95_205, 104_912, 17_020,
];
const BISHOP_SEEDS: [u64; 8] = [
    728, 10_316, 55_013, 32_803, 12_281, 15_100, 16_645, 255,
];

/// Sparse xorshift64star PRNG, matching Stockfish's `PRNG`.
struct Prng {
    state: u64,
}

impl Prng {
    fn new(seed: u64) -> Prng {
        Prng { state: seed }
    }

    fn rand64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(2_685_821_657_736_338_717)
    }

    /// A random 64-bit value with, on average, only 8 bits set. Candidate
    /// magics drawn from this distribution tend to "spread" occupancy bits
    /// well when multiplied, which is exactly what a good magic wants.
    fn sparse_rand(&mut self) -> u64 {
        self.rand64() & self.rand64() & self.rand64()
    }
}

fn relevant_occupancy_mask(sq: Square, rook: bool) -> Bitboard {
    use crate::bitboard::{FILE_A, FILE_H, RANK_1, RANK_8};
    let edges = ((RANK_1 | RANK_8) & !(RANK_1 << (sq.rank_of().0 * 8)))
        | ((FILE_A | FILE_H) & !(FILE_A << sq.file_of().0));
    let full_ray = if rook {
        rook_attacks_by_rays(sq, 0)
    } else {
        bishop_attacks_by_rays(sq, 0)
    };
    full_ray & !edges
}

/// Enumerates every subset of `mask` via the Carry-Rippler trick.
fn subsets_of(mask: Bitboard) -> Vec<Bitboard> {
    let mut subsets = Vec::with_capacity(1 << popcount(mask));
    let mut subset: Bitboard = 0;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

struct SquareTable {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl SquareTable {
    #[inline]
    fn index(&self, occupied: Bitboard) -> usize {
        let blockers = occupied & self.mask;
        self.offset + ((blockers.wrapping_mul(self.magic)) >> self.shift) as usize
    }
}

struct MagicTable {
    squares: [SquareTable; 64],
    attacks: Vec<Bitboard>,
}

/// Searches for a magic multiplier for `sq` and fills in `attacks` at
/// `offset..offset+table_size`. Returns the chosen magic and the table size
/// used (`1 << relevant_bits`).
fn find_magic_for_square(
    sq: Square,
    rook: bool,
    seed: u64,
    attacks: &mut Vec<Bitboard>,
) -> (Bitboard, u64, u32, usize) {
    let mask = relevant_occupancy_mask(sq, rook);
    let bits = popcount(mask);
    let shift = 64 - bits;
    let occupancies = subsets_of(mask);
    let references: Vec<Bitboard> = occupancies
        .iter()
        .map(|&occ| {
            if rook {
                rook_attacks_by_rays(sq, occ)
            } else {
                bishop_attacks_by_rays(sq, occ)
            }
        })
        .collect();

    let table_size = 1usize << bits;
    let offset = attacks.len();
    attacks.resize(offset + table_size, 0);

    // Epoch array: `epoch[i]` records which search attempt last wrote
    // `attacks[offset + i]`, so we can tell a fresh index from a stale one
    // without zeroing the table between attempts.
    let mut epoch = vec![0u32; table_size];
    let mut attempt: u32 = 0;
    let mut rng = Prng::new(seed);
    let mut magic;

    'search: loop {
        // A candidate magic is only worth trying if it maps the mask's
        // high byte to enough distinct bit patterns.
        loop {
            magic = rng.sparse_rand();
            if popcount((mask.wrapping_mul(magic)) >> 56) >= 6 {
                break;
            }
        }

        attempt += 1;
        for (i, &occ) in occupancies.iter().enumerate() {
            let idx = ((occ.wrapping_mul(magic)) >> shift) as usize;
            if epoch[idx] < attempt {
                epoch[idx] = attempt;
                attacks[offset + idx] = references[i];
            } else if attacks[offset + idx] != references[i] {
                // Collision mapping to a different attack set: this magic fails.
                continue 'search;
            }
        }
        break;
    }

    (mask, magic, shift, offset)
}

fn build_table(rook: bool) -> MagicTable {
    let seeds = if rook { &ROOK_SEEDS } else { &BISHOP_SEEDS };
    let mut attacks = Vec::new();
    let mut squares: Vec<SquareTable> = Vec::with_capacity(64);
    for i in 0..64u8 {
        let sq = Square::new(i);
        let seed = seeds[sq.rank_of().0 as usize];
        let (mask, magic, shift, offset) = find_magic_for_square(sq, rook, seed, &mut attacks);
        squares.push(SquareTable { mask, magic, shift, offset });
    }
    MagicTable {
        squares: squares.try_into().unwrap_or_else(|_| unreachable!()),
        attacks,
    }
}

static ROOK_TABLE: Lazy<MagicTable> = Lazy::new(|| build_table(true));
static BISHOP_TABLE: Lazy<MagicTable> = Lazy::new(|| build_table(false));

#[must_use]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let table = &ROOK_TABLE.squares[sq.as_usize()];
    ROOK_TABLE.attacks[table.index(occupied)]
}

#[must_use]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let table = &BISHOP_TABLE.squares[sq.as_usize()];
    BISHOP_TABLE.attacks[table.index(occupied)]
}

#[must_use]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::popcount;

    #[test]
    fn rook_attacks_match_ray_walk_on_empty_board() {
        for i in 0..64u8 {
            let sq = Square::new(i);
            assert_eq!(rook_attacks(sq, 0), rook_attacks_by_rays(sq, 0), "sq {i}");
        }
    }

    #[test]
    fn bishop_attacks_match_ray_walk_with_blockers() {
        let d4 = Square::from_algebraic("d4").unwrap();
        let e5 = Square::from_algebraic("e5").unwrap();
        let occ = e5.bitboard();
        assert_eq!(bishop_attacks(d4, occ), bishop_attacks_by_rays(d4, occ));
    }

    #[test]
    fn rook_on_h1_empty_board_has_14_targets() {
        let h1 = Square::from_algebraic("h1").unwrap();
        assert_eq!(popcount(rook_attacks(h1, 0)), 14);
    }

    #[test]
    fn queen_attacks_union_bishop_and_rook() {
        let d4 = Square::from_algebraic("d4").unwrap();
        assert_eq!(queen_attacks(d4, 0), rook_attacks(d4, 0) | bishop_attacks(d4, 0));
    }
}
