//! Static evaluation sanity checks: side-to-move relativity, mirrored
//! positions, and draws by insufficient material.

use chess_engine::eval::evaluate;
use chess_engine::pawn_cache::PawnCache;
use chess_engine::position::Position;

#[test]
fn startpos_evaluates_near_zero() {
    let pos = Position::startpos();
    let cache = PawnCache::new(256);
    let score = evaluate(&pos, &cache);
    assert!(score.abs() < 60, "startpos eval {score} should be near zero");
}

#[test]
fn evaluation_is_relative_to_side_to_move() {
    let cache = PawnCache::new(256);
    let white_up_a_rook = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
    let black_up_a_rook = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();

    let white_score = evaluate(&white_up_a_rook, &cache);
    let black_score = evaluate(&black_up_a_rook, &cache);

    assert!(white_score > 0, "white to move with an extra rook should favor white");
    assert!(black_score < 0, "black to move with white up a rook should still favor white");
}

#[test]
fn king_and_lone_knight_vs_king_is_drawn() {
    let pos = Position::from_fen("8/8/8/4k3/8/3N4/8/4K3 w - - 0 1").unwrap();
    let cache = PawnCache::new(256);
    assert_eq!(evaluate(&pos, &cache), 0);
}

#[test]
fn extra_queen_is_a_large_advantage() {
    let cache = PawnCache::new(256);
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
    let score = evaluate(&pos, &cache);
    assert!(score > 700, "a lone extra queen should be worth well over 700cp, got {score}");
}
