//! End-to-end search tests: forced mates and simple tactics, run through
//! the full [`Searcher`] rather than unit-level pieces.

use chess_engine::pawn_cache::PawnCache;
use chess_engine::position::Position;
use chess_engine::search::{SearchLimits, Searcher};
use chess_engine::sync::StopFlag;
use chess_engine::tt::TranspositionTable;
use chess_engine::types::{self, Square};

fn search_to_depth(fen: &str, depth: i32) -> chess_engine::search::SearchResult {
    let mut pos = Position::from_fen(fen).unwrap();
    let mut tt = TranspositionTable::new(16);
    let pawn_cache = PawnCache::new(1024);
    let mut searcher = Searcher::new(&mut tt, &pawn_cache, StopFlag::new());
    searcher.search(&mut pos, SearchLimits { max_depth: Some(depth), ..SearchLimits::default() }, |_| {})
}

#[test]
fn finds_fools_mate() {
    // After 1. f3 e5 2. g4, black mates with 2...Qh4#.
    let result = search_to_depth(
        "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
        3,
    );
    assert!(types::is_mate_score(result.score), "expected a mate score, got {}", result.score);
    let best = result.best_move.expect("a mating move should be found");
    assert_eq!(best.to(), Square::new(31), "expected ...Qh4#");
}

#[test]
fn finds_mate_in_one_with_a_rook() {
    let result = search_to_depth("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 3);
    assert!(types::is_mate_score(result.score));
    assert!(result.best_move.is_some());
}

#[test]
fn avoids_a_move_that_hangs_the_queen() {
    let result = search_to_depth("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1", 5);
    let best = result.best_move.expect("a move should be found");
    assert_eq!(best.to(), Square::new(35), "expected Rxd5 capturing the hanging queen");
}

#[test]
fn search_respects_a_depth_cap() {
    let mut pos = Position::startpos();
    let mut tt = TranspositionTable::new(16);
    let pawn_cache = PawnCache::new(1024);
    let mut searcher = Searcher::new(&mut tt, &pawn_cache, StopFlag::new());
    let result = searcher.search(&mut pos, SearchLimits { max_depth: Some(2), ..SearchLimits::default() }, |_| {});
    assert!(result.depth <= 2);
    assert!(result.best_move.is_some());
}
