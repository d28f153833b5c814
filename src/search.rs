//! Iterative-deepening alpha-beta search with quiescence, aspiration
//! windows, null-move pruning, late-move reductions, and a lightweight
//! futility-pruning margin at shallow depth.
//!
//! Drives search over [`Position`]'s make/unmake, pulling moves from
//! [`crate::movegen::StagedMoveGen`] and recording results in
//! [`crate::tt::TranspositionTable`] with ply-adjusted mate scoring.
//! [`Searcher::search`] takes both a depth cap and an optional deadline, so
//! a fixed-depth search and a time-bounded one share the same driver.

use std::time::{Duration, Instant};

use crate::eval;
use crate::movegen::{self, StagedMoveGen};
use crate::ordering::OrderingContext;
use crate::pawn_cache::PawnCache;
use crate::position::Position;
use crate::sync::StopFlag;
use crate::tt::{Bound, TranspositionTable};
use crate::types::{self, Move, Value, MAX_PLY, VALUE_CHECKMATE};

const MATE_VALUE: Value = VALUE_CHECKMATE;
const NULL_MOVE_MIN_DEPTH: i32 = 3;
const NULL_MOVE_REDUCTION: i32 = 2;
const LMR_MIN_DEPTH: i32 = 3;
const LMR_MIN_MOVE_INDEX: usize = 4;
const IID_MIN_DEPTH: i32 = 4;
const ASPIRATION_MIN_DEPTH: i32 = 5;
const ASPIRATION_INITIAL_WINDOW: i32 = 25;
const ASPIRATION_MAX_WINDOW: i32 = 800;

/// Search boundaries. `depth` and `deadline`/`nodes` can be combined; the
/// search stops as soon as any configured limit is hit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    pub max_depth: Option<i32>,
    pub movetime: Option<Duration>,
    pub max_nodes: Option<u64>,
}

/// Per-iteration progress, handed to the caller's callback so a UCI front
/// end can emit `info` lines without this module knowing about UCI.
#[derive(Clone, Debug)]
pub struct SearchProgress {
    pub depth: i32,
    pub score: Value,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
}

/// Outcome of a completed search.
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: Value,
    pub depth: i32,
    pub nodes: u64,
}

/// Drives iterative deepening over a position, owning the per-search
/// ordering state and node/time bookkeeping. A fresh `Searcher` should be
/// built for each `go`; the transposition table and pawn cache persist
/// across searches and are passed in by reference.
pub struct Searcher<'a> {
    tt: &'a mut TranspositionTable,
    pawn_cache: &'a PawnCache,
    ordering: OrderingContext,
    stop: StopFlag,
    nodes: u64,
    start: Instant,
    deadline: Option<Instant>,
    max_nodes: Option<u64>,
    last_root_score: Value,
}

impl<'a> Searcher<'a> {
    #[must_use]
    pub fn new(tt: &'a mut TranspositionTable, pawn_cache: &'a PawnCache, stop: StopFlag) -> Searcher<'a> {
        Searcher {
            tt,
            pawn_cache,
            ordering: OrderingContext::new(MAX_PLY),
            stop,
            nodes: 0,
            start: Instant::now(),
            deadline: None,
            max_nodes: None,
            last_root_score: 0,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    fn should_stop(&self) -> bool {
        if self.stop.is_stopped() {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        if let Some(cap) = self.max_nodes {
            if self.nodes >= cap {
                return true;
            }
        }
        false
    }

    /// Iterative deepening driver. Calls `on_progress` after every
    /// completed depth. Stops when `limits.max_depth` is reached, the
    /// deadline/node cap from `limits` is hit, or the stop flag is set
    /// externally (e.g. a UCI `stop` command).
    pub fn search(
        &mut self,
        pos: &mut Position,
        limits: SearchLimits,
        mut on_progress: impl FnMut(&SearchProgress),
    ) -> SearchResult {
        self.start = Instant::now();
        self.nodes = 0;
        self.deadline = limits.movetime.map(|d| self.start + d);
        self.max_nodes = limits.max_nodes;
        self.ordering.clear();
        self.tt.new_search();

        let root_moves = movegen::generate_legal(pos);
        let mut best_move = root_moves.first().copied();
        let mut best_score: Value = 0;
        let mut completed_depth = 0;

        if root_moves.is_empty() {
            return SearchResult { best_move: None, score: 0, depth: 0, nodes: 0 };
        }
        if root_moves.len() == 1 {
            return SearchResult {
                best_move: root_moves.first().copied(),
                score: 0,
                depth: 0,
                nodes: 0,
            };
        }

        let max_depth = limits.max_depth.unwrap_or(MAX_PLY as i32).min(MAX_PLY as i32 - 1);
        let mut prev_score: Option<Value> = None;

        for depth in 1..=max_depth {
            if self.should_stop() {
                break;
            }

            let (score, mv) = if let Some(ps) = prev_score.filter(|_| depth >= ASPIRATION_MIN_DEPTH) {
                self.aspiration_search(pos, depth, ps)
            } else {
                let mv = self.root_best_move(pos, depth, -MATE_VALUE, MATE_VALUE);
                (self.last_root_score, mv)
            };

            if self.should_stop() && depth > 1 {
                break;
            }

            if let Some(mv) = mv {
                best_move = Some(mv);
                best_score = score;
                completed_depth = depth;
                prev_score = Some(score);
                on_progress(&SearchProgress {
                    depth,
                    score,
                    nodes: self.nodes,
                    elapsed: self.start.elapsed(),
                    pv: self.build_pv(pos),
                });
            }

            if types::is_mate_score(score) {
                break;
            }
        }

        SearchResult {
            best_move,
            score: best_score,
            depth: completed_depth,
            nodes: self.nodes,
        }
    }

    /// Re-searches at `depth` with a narrow window around `prev_score`,
    /// widening geometrically until the result lands inside the window or
    /// the window covers essentially the whole score range.
    fn aspiration_search(&mut self, pos: &mut Position, depth: i32, prev_score: Value) -> (Value, Option<Move>) {
        let mut window = ASPIRATION_INITIAL_WINDOW;
        loop {
            let alpha = prev_score.saturating_sub(window);
            let beta = prev_score.saturating_add(window);
            let mv = self.root_best_move(pos, depth, alpha, beta);
            let score = self.last_root_score;
            if self.should_stop() {
                return (score, mv);
            }
            if score > alpha && score < beta {
                return (score, mv);
            }
            if window >= ASPIRATION_MAX_WINDOW {
                let mv = self.root_best_move(pos, depth, -MATE_VALUE, MATE_VALUE);
                return (self.last_root_score, mv);
            }
            window = window.saturating_mul(2);
        }
    }

    fn build_pv(&mut self, pos: &mut Position) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut seen_keys = Vec::new();
        for _ in 0..MAX_PLY {
            let key = pos.zobrist_key();
            if seen_keys.contains(&key) {
                break;
            }
            seen_keys.push(key);
            let Some(probe) = self.tt.probe(key, 0) else { break };
            if probe.best_move.is_none() {
                break;
            }
            let legal = movegen::generate_legal(pos);
            if !legal.contains(&probe.best_move) {
                break;
            }
            pv.push(probe.best_move);
            pos.do_move(probe.best_move);
        }
        for _ in 0..pv.len() {
            pos.undo_move();
        }
        pv
    }

    /// Searches every root move at `depth` within `(alpha, beta)`, storing
    /// the outcome in `self.last_root_score` (there is no separate "root
    /// search" return type; the score is read back by the caller). Alpha/
    /// beta thread through the same way as the inner search, but the root
    /// also needs to track which move produced the best score.
    fn root_best_move(&mut self, pos: &mut Position, depth: i32, alpha: Value, beta: Value) -> Option<Move> {
        let root_hash = pos.zobrist_key();
        let hash_move = self.tt.probe(root_hash, 0).map(|p| p.best_move);
        let mut staged = StagedMoveGen::new(pos, hash_move);
        let mut alpha = alpha;
        let mut best_move = None;
        let mut best_score = -MATE_VALUE;
        let mut move_index = 0;
        let mut failed_quiets: Vec<(crate::types::Piece, Move)> = Vec::new();

        let in_check = pos.has_check();
        while let Some(mv) = staged.next(pos, 0, &self.ordering, Move::NONE, in_check) {
            let piece = pos.piece_at(mv.from());
            pos.do_move(mv);
            if !pos.was_legal_move() {
                pos.undo_move();
                continue;
            }

            let score = if move_index == 0 {
                -self.negamax(pos, depth - 1, 1, -beta, -alpha, true, mv)
            } else {
                let reduced = -self.negamax(pos, depth - 1, 1, -alpha - 1, -alpha, false, mv);
                if reduced > alpha && reduced < beta {
                    -self.negamax(pos, depth - 1, 1, -beta, -alpha, true, mv)
                } else {
                    reduced
                }
            };
            pos.undo_move();
            move_index += 1;

            if self.should_stop() && move_index > 1 {
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if !movegen::is_tactical(pos, mv) {
                    self.ordering.record_killer(0, mv);
                    self.ordering.update_history(piece, mv, depth, &failed_quiets);
                }
                break;
            }
            if !movegen::is_tactical(pos, mv) {
                failed_quiets.push((piece, mv));
            }
        }

        if let Some(mv) = best_move {
            let bound = if best_score >= beta {
                Bound::Lower
            } else {
                Bound::Exact
            };
            self.tt.store(root_hash, depth as i16, best_score, best_score, bound, mv, 0);
        }
        self.last_root_score = best_score;
        best_move
    }

    /// Negamax alpha-beta search with TT probing, null-move pruning, late
    /// move reductions, and a quiescence leaf.
    fn negamax(
        &mut self,
        pos: &mut Position,
        mut depth: i32,
        ply: usize,
        mut alpha: Value,
        mut beta: Value,
        is_pv: bool,
        prev_move: Move,
    ) -> Value {
        if self.should_stop() {
            return 0;
        }

        let ply_score_window = MATE_VALUE - ply as i32;
        alpha = alpha.max(-ply_score_window);
        beta = beta.min(ply_score_window);
        if alpha >= beta {
            return alpha;
        }

        if ply > 0 && pos.halfmove_clock() >= 100 {
            return 0;
        }

        let key = pos.zobrist_key();
        let original_alpha = alpha;
        let mut hash_move = None;
        if let Some(probe) = self.tt.probe(key, ply) {
            hash_move = Some(probe.best_move);
            if probe.depth as i32 >= depth && !is_pv {
                match probe.bound {
                    Bound::Exact => return probe.score,
                    Bound::Lower => alpha = alpha.max(probe.score),
                    Bound::Upper => beta = beta.min(probe.score),
                }
                if alpha >= beta {
                    return probe.score;
                }
            }
        }

        if depth <= 0 {
            return self.quiescence(pos, alpha, beta, ply);
        }

        self.nodes += 1;

        let in_check = pos.has_check();

        if hash_move.is_none() && depth >= IID_MIN_DEPTH {
            self.negamax(pos, depth - 2, ply, alpha, beta, is_pv, prev_move);
            if let Some(probe) = self.tt.probe(key, ply) {
                hash_move = Some(probe.best_move);
            }
        }

        if !is_pv && !in_check && depth >= NULL_MOVE_MIN_DEPTH && pos.game_phase() > 0 {
            let prior_ep = pos.do_null_move();
            let score = -self.negamax(pos, depth - 1 - NULL_MOVE_REDUCTION, ply + 1, -beta, -beta + 1, false, Move::NONE);
            pos.undo_null_move(prior_ep);
            if score >= beta && !types::is_mate_score(score) {
                return score;
            }
        }

        if in_check {
            depth += 1;
        }

        let mut staged = StagedMoveGen::new(pos, hash_move);
        let mut best_score = -MATE_VALUE;
        let mut best_move = None;
        let mut move_index = 0;
        let mut failed_quiets: Vec<(crate::types::Piece, Move)> = Vec::new();
        let stand_pat = if depth <= 2 && !in_check {
            Some(eval::evaluate(pos, self.pawn_cache))
        } else {
            None
        };

        while let Some(mv) = staged.next(pos, ply, &self.ordering, prev_move, in_check) {
            let is_quiet = !movegen::is_tactical(pos, mv);

            if let Some(stand) = stand_pat {
                if is_quiet && move_index > 0 {
                    let margin = if depth == 1 { 150 } else { 300 };
                    if stand + margin <= alpha {
                        pos.do_move(mv);
                        let legal = pos.was_legal_move();
                        pos.undo_move();
                        if legal {
                            continue;
                        }
                    }
                }
            }

            let piece = pos.piece_at(mv.from());
            pos.do_move(mv);
            if !pos.was_legal_move() {
                pos.undo_move();
                continue;
            }

            let gives_check = pos.has_check();
            let score = if move_index == 0 {
                -self.negamax(pos, depth - 1, ply + 1, -beta, -alpha, is_pv, mv)
            } else {
                let mut reduction = 0;
                if is_quiet
                    && depth >= LMR_MIN_DEPTH
                    && move_index >= LMR_MIN_MOVE_INDEX
                    && !gives_check
                    && !in_check
                {
                    reduction = 1 + (move_index as i32 / 8);
                    reduction = reduction.min(depth - 2).max(0);
                }
                let reduced_depth = depth - 1 - reduction;
                let mut s = -self.negamax(pos, reduced_depth, ply + 1, -alpha - 1, -alpha, false, mv);
                if s > alpha && (reduction > 0 || is_pv) {
                    s = -self.negamax(pos, depth - 1, ply + 1, -beta, -alpha, is_pv, mv);
                }
                s
            };
            pos.undo_move();
            move_index += 1;

            if self.should_stop() {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if is_quiet {
                    self.ordering.record_killer(ply, mv);
                    self.ordering.update_history(piece, mv, depth, &failed_quiets);
                    self.ordering.record_counter_move(prev_move, mv);
                }
                break;
            }
            if is_quiet {
                failed_quiets.push((piece, mv));
            }
        }

        if best_move.is_none() {
            return if in_check {
                -MATE_VALUE + ply as i32
            } else {
                0
            };
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        let static_eval = eval::evaluate(pos, self.pawn_cache);
        self.tt.store(key, depth as i16, best_score, static_eval, bound, best_move.unwrap(), ply);

        best_score
    }

    /// Quiescence search: only captures/promotions/en-passant are
    /// considered beyond the stand-pat evaluation, with SEE pruning away
    /// captures that lose material.
    fn quiescence(&mut self, pos: &mut Position, mut alpha: Value, beta: Value, ply: usize) -> Value {
        self.nodes += 1;
        if self.should_stop() {
            return 0;
        }

        let stand_pat = eval::evaluate(pos, self.pawn_cache);
        if stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        if ply >= MAX_PLY {
            return stand_pat;
        }

        let mut captures = movegen::generate_legal_tactical(pos);
        captures.retain(|mv| crate::see::see(pos, *mv) >= 0);
        captures.sort_by_key(|mv| -crate::see::see(pos, *mv));

        let mut best_score = stand_pat;
        for mv in captures {
            pos.do_move(mv);
            let score = -self.quiescence(pos, -beta, -alpha, ply + 1);
            pos.undo_move();

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
            if self.should_stop() {
                break;
            }
        }

        best_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_mate_in_one() {
        let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut tt = TranspositionTable::new(1);
        let cache = PawnCache::default();
        let mut searcher = Searcher::new(&mut tt, &cache, StopFlag::new());
        let result = searcher.search(&mut pos, SearchLimits { max_depth: Some(3), ..Default::default() }, |_| {});
        assert!(result.best_move.is_some());
        assert!(types::is_mate_score(result.score));
    }

    #[test]
    fn prefers_capturing_a_hanging_queen() {
        let mut pos = Position::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
        let mut tt = TranspositionTable::new(1);
        let cache = PawnCache::default();
        let mut searcher = Searcher::new(&mut tt, &cache, StopFlag::new());
        let result = searcher.search(&mut pos, SearchLimits { max_depth: Some(4), ..Default::default() }, |_| {});
        let mv = result.best_move.unwrap();
        assert_eq!(mv.to().to_algebraic(), "d5");
    }

    #[test]
    fn respects_a_node_limit() {
        let mut pos = Position::startpos();
        let mut tt = TranspositionTable::new(1);
        let cache = PawnCache::default();
        let mut searcher = Searcher::new(&mut tt, &cache, StopFlag::new());
        let result = searcher.search(
            &mut pos,
            SearchLimits { max_depth: Some(40), max_nodes: Some(500), ..Default::default() },
            |_| {},
        );
        assert!(searcher.nodes() < 5_000);
        assert!(result.best_move.is_some());
    }
}
