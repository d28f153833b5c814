//! Static exchange evaluation: simulates the full capture sequence on a
//! square and returns the net material result for the side initiating it.
//!
//! The occupancy and piece bitboards are cloned, then the least valuable
//! attacker is repeatedly removed and its captured value pushed onto a
//! `gains` array, and the exchange is resolved backwards as a minimax. Each
//! removal re-derives attackers through the magic slider tables in
//! [`crate::magic`] so a removed slider correctly reveals the piece behind
//! it.

use crate::bitboard;
use crate::magic;
use crate::position::Position;
use crate::types::{Color, Move, MoveType, PieceType, Square};

/// Static exchange evaluation for the capture `mv`. Non-captures return 0.
/// A positive result favors the side making the capture.
#[must_use]
pub fn see(pos: &Position, mv: Move) -> i32 {
    let target = pos.piece_at(mv.to());
    let captured = match mv.move_type() {
        MoveType::EnPassant => PieceType::Pawn,
        _ if !target.is_none() => target.kind,
        _ => return 0,
    };

    let attacker = pos.piece_at(mv.from());
    let attacker_side = attacker.color;
    let mut occupied = pos.occupied_all();
    let mut by_color_type: [[u64; 6]; 2] = std::array::from_fn(|c| {
        std::array::from_fn(|p| pos.pieces_bb(
            if c == 0 { Color::White } else { Color::Black },
            PieceType::from_plane(p),
        ))
    });

    let capture_sq_bb = mv.to().bitboard();
    let en_passant_victim_sq = if mv.move_type() == MoveType::EnPassant {
        Some(crate::types::Square::from_file_rank(mv.to().file_of(), mv.from().rank_of()))
    } else {
        None
    };

    // Apply the initiating capture to the simulation state.
    by_color_type[attacker_side.index()][attacker.kind.plane()] &= !mv.from().bitboard();
    occupied &= !mv.from().bitboard();
    if let Some(ep_sq) = en_passant_victim_sq {
        by_color_type[attacker_side.flip().index()][PieceType::Pawn.plane()] &= !ep_sq.bitboard();
        occupied &= !ep_sq.bitboard();
    } else {
        by_color_type[attacker_side.flip().index()][captured.plane()] &= !capture_sq_bb;
    }
    by_color_type[attacker_side.index()][attacker.kind.plane()] |= capture_sq_bb;
    occupied |= capture_sq_bb;

    let mut gains = vec![captured.material_value()];
    let mut side_to_recapture = attacker_side.flip();
    let mut occupant_kind = attacker.kind;

    loop {
        let all_attackers =
            simulated_attackers_to(&by_color_type, mv.to(), side_to_recapture, occupied);

        let Some((picked_kind, picked_bb)) =
            least_valuable_attacker_sim(&by_color_type, side_to_recapture, all_attackers)
        else {
            break;
        };

        gains.push(occupant_kind.material_value() - gains[gains.len() - 1]);

        by_color_type[side_to_recapture.index()][picked_kind.plane()] &= !picked_bb;
        occupied &= !picked_bb;
        by_color_type[side_to_recapture.index()][picked_kind.plane()] |= capture_sq_bb;
        occupied |= capture_sq_bb;

        occupant_kind = picked_kind;
        side_to_recapture = side_to_recapture.flip();
    }

    // Backward induction: at each ply the side to move only continues the
    // capture sequence if doing so improves their result.
    for i in (0..gains.len() - 1).rev() {
        gains[i] = -(-gains[i]).max(gains[i + 1]);
    }
    gains[0]
}

/// Attackers of `side` on `sq` under the simulated bitboards and occupancy,
/// mirroring [`crate::attacks::attackers_to_with_occupancy`] but reading
/// from the local simulation state instead of the real position.
fn simulated_attackers_to(
    by_color_type: &[[u64; 6]; 2],
    sq: Square,
    side: Color,
    occupied: u64,
) -> u64 {
    let pieces = &by_color_type[side.index()];
    let mut attackers = bitboard::PAWN_ATTACKS[side.flip().index()][sq.as_usize()] & pieces[PieceType::Pawn.plane()];
    attackers |= bitboard::KNIGHT_ATTACKS[sq.as_usize()] & pieces[PieceType::Knight.plane()];
    attackers |= bitboard::KING_ATTACKS[sq.as_usize()] & pieces[PieceType::King.plane()];
    let diag = pieces[PieceType::Bishop.plane()] | pieces[PieceType::Queen.plane()];
    attackers |= magic::bishop_attacks(sq, occupied) & diag;
    let ortho = pieces[PieceType::Rook.plane()] | pieces[PieceType::Queen.plane()];
    attackers |= magic::rook_attacks(sq, occupied) & ortho;
    attackers
}

fn least_valuable_attacker_sim(
    by_color_type: &[[u64; 6]; 2],
    side: Color,
    attackers: u64,
) -> Option<(PieceType, u64)> {
    for kind in PieceType::ALL {
        let bb = attackers & by_color_type[side.index()][kind.plane()];
        if bb != 0 {
            return Some((kind, 1u64 << bitboard::lsb(bb).as_usize()));
        }
    }
    None
}

/// True if `mv` is a capture whose SEE value is non-negative: a reasonable
/// capture to try before quiet moves in move ordering.
#[must_use]
pub fn see_ge_zero(pos: &Position, mv: Move) -> bool {
    see(pos, mv) >= 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::types::Square;

    #[test]
    fn pawn_takes_pawn_is_even() {
        let pos = Position::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mv = Move::new(
            Square::from_algebraic("e4").unwrap(),
            Square::from_algebraic("d5").unwrap(),
            MoveType::Normal,
        );
        assert_eq!(see(&pos, mv), PieceType::Pawn.material_value());
    }

    #[test]
    fn losing_capture_is_negative() {
        // White rook captures a pawn on d5 that is defended by a pawn on e6: loses the exchange.
        let pos = Position::from_fen("4k3/8/4p3/3p4/8/8/3R4/4K3 w - - 0 1").unwrap();
        let mv = Move::new(
            Square::from_algebraic("d2").unwrap(),
            Square::from_algebraic("d5").unwrap(),
            MoveType::Normal,
        );
        let value = see(&pos, mv);
        assert!(value < 0, "expected losing exchange, got {value}");
    }

    #[test]
    fn non_capture_scores_zero() {
        let pos = Position::startpos();
        let mv = Move::new(
            Square::from_algebraic("e2").unwrap(),
            Square::from_algebraic("e4").unwrap(),
            MoveType::Normal,
        );
        assert_eq!(see(&pos, mv), 0);
    }
}
