//! Move ordering support: MVV-LVA capture scoring, killer moves, the history
//! heuristic, and a counter-move table.
//!
//! `OrderingContext` keeps per-ply killer slots and a flat history array
//! indexed by piece/from/to, scored via MVV-LVA for captures. The
//! search-facing staged generator in [`crate::movegen`] walks moves stage by
//! stage rather than sorting one flat list, so this module's job is just the
//! killer/history/counter-move bookkeeping that ordering relies on.

use crate::types::{Move, PieceType, Square, MAX_PLY};

/// `victim_value * 10 - attacker_value`, biasing toward capturing the most
/// valuable victim with the least valuable attacker.
#[must_use]
pub fn mvv_lva_score(victim: PieceType, attacker: PieceType) -> i32 {
    victim.material_value() * 10 - attacker.material_value()
}

const HISTORY_MAX: i32 = 1 << 20;

/// Per-search move ordering state: killer moves and history/counter-move
/// tables. Reset at the start of each search via [`OrderingContext::new`];
/// history persists across iterative-deepening iterations within a search
/// but not across searches.
pub struct OrderingContext {
    killers: Vec<[Option<Move>; 2]>,
    history: Vec<i32>,
    counter_moves: Vec<Option<Move>>,
}

impl OrderingContext {
    #[must_use]
    pub fn new(max_ply: usize) -> OrderingContext {
        OrderingContext {
            killers: vec![[None, None]; max_ply.max(MAX_PLY)],
            history: vec![0; 2 * 6 * 64 * 64],
            counter_moves: vec![None; 64 * 64],
        }
    }

    #[must_use]
    pub fn killers_at(&self, ply: usize) -> [Option<Move>; 2] {
        self.killers.get(ply).copied().unwrap_or([None, None])
    }

    /// Records a quiet move that caused a beta cutoff as a killer at `ply`,
    /// keeping the two most recent distinct killers.
    pub fn record_killer(&mut self, ply: usize, mv: Move) {
        if ply >= self.killers.len() {
            return;
        }
        let slot = &mut self.killers[ply];
        if slot[0] == Some(mv) {
            return;
        }
        slot[1] = slot[0];
        slot[0] = Some(mv);
    }

    fn history_index(kind: PieceType, color_idx: usize, from: Square, to: Square) -> usize {
        ((color_idx * 6 + kind.plane()) * 64 + from.as_usize()) * 64 + to.as_usize()
    }

    #[must_use]
    pub fn history_score(&self, piece: crate::types::Piece, from: Square, to: Square) -> i32 {
        self.history[Self::history_index(piece.kind, piece.color.index(), from, to)]
    }

    /// Rewards a quiet move that caused a cutoff and penalizes the quiets
    /// tried before it at the same depth, using the standard history-gravity
    /// update so scores stay bounded rather than growing without limit.
    pub fn update_history(
        &mut self,
        piece: crate::types::Piece,
        mv: Move,
        depth: i32,
        failed_quiets: &[(crate::types::Piece, Move)],
    ) {
        let bonus = (depth * depth).min(400);
        self.bump(piece, mv, bonus);
        for &(p, m) in failed_quiets {
            self.bump(p, m, -bonus);
        }
    }

    fn bump(&mut self, piece: crate::types::Piece, mv: Move, delta: i32) {
        let idx = Self::history_index(piece.kind, piece.color.index(), mv.from(), mv.to());
        let entry = &mut self.history[idx];
        *entry += delta - *entry * delta.abs() / HISTORY_MAX;
    }

    pub fn record_counter_move(&mut self, prev: Move, reply: Move) {
        if prev.is_none() {
            return;
        }
        let idx = prev.from().as_usize() * 64 + prev.to().as_usize();
        self.counter_moves[idx] = Some(reply);
    }

    #[must_use]
    pub fn counter_move_for(&self, prev: Move) -> Option<Move> {
        if prev.is_none() {
            return None;
        }
        self.counter_moves[prev.from().as_usize() * 64 + prev.to().as_usize()]
    }

    pub fn clear(&mut self) {
        for k in &mut self.killers {
            *k = [None, None];
        }
        self.history.iter_mut().for_each(|h| *h = 0);
        self.counter_moves.iter_mut().for_each(|c| *c = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, MoveType, Piece};

    #[test]
    fn mvv_lva_prefers_capturing_queen_with_pawn_over_rook_with_rook() {
        let pawn_takes_queen = mvv_lva_score(PieceType::Queen, PieceType::Pawn);
        let rook_takes_rook = mvv_lva_score(PieceType::Rook, PieceType::Rook);
        assert!(pawn_takes_queen > rook_takes_rook);
    }

    #[test]
    fn killer_slots_track_two_most_recent_distinct_moves() {
        let mut ctx = OrderingContext::new(64);
        let a = Move::new(Square::new(12), Square::new(28), MoveType::Normal);
        let b = Move::new(Square::new(13), Square::new(29), MoveType::Normal);
        ctx.record_killer(3, a);
        ctx.record_killer(3, b);
        let killers = ctx.killers_at(3);
        assert_eq!(killers[0], Some(b));
        assert_eq!(killers[1], Some(a));
    }

    #[test]
    fn history_bonus_increases_score_and_malus_decreases_it() {
        let mut ctx = OrderingContext::new(64);
        let piece = Piece::new(Color::White, PieceType::Knight);
        let good = Move::new(Square::new(1), Square::new(18), MoveType::Normal);
        let bad = Move::new(Square::new(1), Square::new(16), MoveType::Normal);
        ctx.update_history(piece, good, 4, &[(piece, bad)]);
        assert!(ctx.history_score(piece, good.from(), good.to()) > 0);
        assert!(ctx.history_score(piece, bad.from(), bad.to()) < 0);
    }
}
