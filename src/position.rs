//! Position representation: mailbox + per-piece bitboards, incrementally
//! maintained Zobrist keys, material, PSQT, and game phase, with reversible
//! make/unmake and FEN parsing/formatting.
//!
//! Zobrist key, material, PSQT value, and game phase are all maintained
//! incrementally as moves are made and unmade rather than recomputed from
//! scratch on every query.

use crate::bitboard::{self, Bitboard};
use crate::error::EngineError;
use crate::psqt::psqt_value;
use crate::types::{Color, Move, MoveType, Piece, PieceType, Square};
use crate::zobrist;

pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

/// Per-square mask applied (by AND) to `castling_rights` whenever a move's
/// `from` or `to` square touches it: moving the king or a rook off its
/// home square, or capturing a rook on its home square, revokes the
/// corresponding right.
fn castling_rights_lost(sq: Square) -> u8 {
    match sq.as_usize() {
        4 => !(CASTLE_WK | CASTLE_WQ),
        0 => !CASTLE_WQ,
        7 => !CASTLE_WK,
        60 => !(CASTLE_BK | CASTLE_BQ),
        56 => !CASTLE_BQ,
        63 => !CASTLE_BK,
        _ => 0xFF,
    }
}

#[derive(Clone, Debug)]
struct UndoFrame {
    mv: Move,
    captured: PieceType,
    prior_ep_square: Option<Square>,
    prior_castling_rights: u8,
    prior_halfmove_clock: u16,
    prior_zobrist_key: u64,
    prior_pawn_zobrist_key: u64,
}

#[derive(Clone, Debug)]
pub struct Position {
    pieces: [[Bitboard; 6]; 2],
    by_color: [Bitboard; 2],
    mailbox: [Piece; 64],
    side_to_move: Color,
    castling_rights: u8,
    ep_square: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u32,
    zobrist_key: u64,
    pawn_zobrist_key: u64,
    material: [i32; 2],
    psqt_mid: [i32; 2],
    psqt_end: [i32; 2],
    game_phase: i32,
    history: Vec<UndoFrame>,
}

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    #[must_use]
    pub fn startpos() -> Position {
        Position::from_fen(STARTPOS_FEN).expect("startpos FEN is well-formed")
    }

    // --- Accessors -------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn pieces_bb(&self, color: Color, kind: PieceType) -> Bitboard {
        self.pieces[color.index()][kind.plane()]
    }

    #[inline]
    #[must_use]
    pub fn occupied_bb(&self, color: Color) -> Bitboard {
        self.by_color[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied_all(&self) -> Bitboard {
        self.by_color[0] | self.by_color[1]
    }

    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.mailbox[sq.as_usize()]
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn next_player(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> u8 {
        self.castling_rights
    }

    #[inline]
    #[must_use]
    pub fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    #[must_use]
    pub fn zobrist_key(&self) -> u64 {
        self.zobrist_key
    }

    #[inline]
    #[must_use]
    pub fn pawn_key(&self) -> u64 {
        self.pawn_zobrist_key
    }

    #[inline]
    #[must_use]
    pub fn material(&self, color: Color) -> i32 {
        self.material[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn psqt_mid_value(&self, color: Color) -> i32 {
        self.psqt_mid[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn psqt_end_value(&self, color: Color) -> i32 {
        self.psqt_end[color.index()]
    }

    /// Game phase in `[0, 24]`: sum of piece-type phase weights on the board.
    #[inline]
    #[must_use]
    pub fn game_phase(&self) -> i32 {
        self.game_phase
    }

    /// `game_phase / 24`, clamped to `[0, 1]`; 1.0 is the opening.
    #[must_use]
    pub fn game_phase_factor(&self) -> f32 {
        (self.game_phase as f32 / 24.0).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        let bb = self.pieces_bb(color, PieceType::King);
        debug_assert!(bb != 0, "position has no {color:?} king");
        bitboard::lsb(bb)
    }

    #[must_use]
    pub fn has_check(&self) -> bool {
        crate::attacks::attackers_to(self, self.king_square(self.side_to_move), self.side_to_move.flip()) != 0
    }

    /// True if applying the most recent move left the mover's own king in
    /// check, meaning it was not actually legal. Call immediately after
    /// `do_move`, before flipping perspective back.
    #[must_use]
    pub fn was_legal_move(&self) -> bool {
        let mover = self.side_to_move.flip();
        crate::attacks::attackers_to(self, self.king_square(mover), self.side_to_move) == 0
    }

    #[must_use]
    pub fn has_insufficient_material(&self) -> bool {
        let total_minor_major = |c: Color| -> (u32, u32, bool, bool) {
            let knights = bitboard::popcount(self.pieces_bb(c, PieceType::Knight));
            let bishops_bb = self.pieces_bb(c, PieceType::Bishop);
            let bishops = bitboard::popcount(bishops_bb);
            let has_light = bishops_bb & *bitboard::LIGHT_SQUARES != 0;
            let has_dark = bishops_bb & !*bitboard::LIGHT_SQUARES != 0;
            (knights, bishops, has_light, has_dark)
        };
        for c in [Color::White, Color::Black] {
            if self.pieces_bb(c, PieceType::Pawn) != 0
                || self.pieces_bb(c, PieceType::Rook) != 0
                || self.pieces_bb(c, PieceType::Queen) != 0
            {
                return false;
            }
        }
        let (wn, wb, w_light, w_dark) = total_minor_major(Color::White);
        let (bn, bb_, b_light, b_dark) = total_minor_major(Color::Black);
        let white_minors = wn + wb;
        let black_minors = bn + bb_;
        if white_minors == 0 && black_minors == 0 {
            return true; // K vs K
        }
        if white_minors + black_minors == 1 {
            return true; // KN/KB vs K
        }
        // KB vs KB, both bishops on the same color complex.
        if wn == 0 && bn == 0 && wb == 1 && bb_ == 1 {
            return (w_light && b_light) || (w_dark && b_dark);
        }
        false
    }

    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    // --- FEN ---------------------------------------------------------------

    pub fn from_fen(fen: &str) -> Result<Position, EngineError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(EngineError::InvalidFen(fen.to_string()));
        }

        let mut mailbox = [Piece::NONE; 64];
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(EngineError::InvalidFen(fen.to_string()));
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                    if file > 8 {
                        return Err(EngineError::InvalidFen(fen.to_string()));
                    }
                    continue;
                }
                if file >= 8 {
                    return Err(EngineError::InvalidFen(fen.to_string()));
                }
                let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                let kind = match c.to_ascii_lowercase() {
                    'p' => PieceType::Pawn,
                    'n' => PieceType::Knight,
                    'b' => PieceType::Bishop,
                    'r' => PieceType::Rook,
                    'q' => PieceType::Queen,
                    'k' => PieceType::King,
                    _ => return Err(EngineError::InvalidFen(fen.to_string())),
                };
                let sq = Square::new((rank * 8 + file) as u8);
                mailbox[sq.as_usize()] = Piece::new(color, kind);
                file += 1;
            }
            if file != 8 {
                return Err(EngineError::InvalidFen(fen.to_string()));
            }
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(EngineError::InvalidFen(fen.to_string())),
        };

        let mut castling_rights = 0u8;
        if fields[2] != "-" {
            for c in fields[2].chars() {
                castling_rights |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(EngineError::InvalidFen(fen.to_string())),
                };
            }
        }

        let ep_square = if fields[3] == "-" {
            None
        } else {
            Some(Square::from_algebraic(fields[3]).ok_or_else(|| EngineError::InvalidFen(fen.to_string()))?)
        };

        let halfmove_clock = fields
            .get(4)
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(|| EngineError::InvalidFen(fen.to_string()))
            .unwrap_or(0);
        let fullmove_number = fields
            .get(5)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1);

        Ok(Position::from_parts(
            mailbox,
            side_to_move,
            castling_rights,
            ep_square,
            halfmove_clock,
            fullmove_number,
        ))
    }

    fn from_parts(
        mailbox: [Piece; 64],
        side_to_move: Color,
        castling_rights: u8,
        ep_square: Option<Square>,
        halfmove_clock: u16,
        fullmove_number: u32,
    ) -> Position {
        let mut pieces = [[0u64; 6]; 2];
        let mut by_color = [0u64; 2];
        let mut zobrist_key = 0u64;
        let mut pawn_zobrist_key = 0u64;
        let mut material = [0i32; 2];
        let mut psqt_mid = [0i32; 2];
        let mut psqt_end = [0i32; 2];
        let mut game_phase = 0i32;

        for i in 0..64u8 {
            let sq = Square::new(i);
            let piece = mailbox[i as usize];
            if piece.is_none() {
                continue;
            }
            pieces[piece.color.index()][piece.kind.plane()] |= sq.bitboard();
            by_color[piece.color.index()] |= sq.bitboard();
            zobrist_key ^= zobrist::piece_square_key(piece.color, piece.kind, sq);
            if zobrist::is_pawn_key_component(piece.kind) {
                pawn_zobrist_key ^= zobrist::piece_square_key(piece.color, piece.kind, sq);
            }
            material[piece.color.index()] += piece.kind.material_value();
            let (mg, eg) = psqt_value(piece.color, piece.kind, sq);
            psqt_mid[piece.color.index()] += mg;
            psqt_end[piece.color.index()] += eg;
            game_phase += piece.kind.phase_weight();
        }
        game_phase = game_phase.min(24);

        if side_to_move == Color::Black {
            zobrist_key ^= zobrist::side_to_move_key();
        }
        zobrist_key ^= zobrist::castling_key(castling_rights);
        if let Some(ep) = ep_square {
            zobrist_key ^= zobrist::en_passant_key(ep.file_of().0);
        }

        Position {
            pieces,
            by_color,
            mailbox,
            side_to_move,
            castling_rights,
            ep_square,
            halfmove_clock,
            fullmove_number,
            zobrist_key,
            pawn_zobrist_key,
            material,
            psqt_mid,
            psqt_end,
            game_phase,
            history: Vec::with_capacity(crate::types::MAX_PLY * 2),
        }
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut board = String::new();
        for rank_from_top in 0..8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u32;
            for file in 0..8 {
                let sq = Square::new((rank * 8 + file) as u8);
                let piece = self.mailbox[sq.as_usize()];
                if piece.is_none() {
                    empty_run += 1;
                } else {
                    if empty_run > 0 {
                        board.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    board.push(piece.to_char());
                }
            }
            if empty_run > 0 {
                board.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                board.push('/');
            }
        }

        let side = if self.side_to_move == Color::White { "w" } else { "b" };

        let mut castle = String::new();
        if self.castling_rights & CASTLE_WK != 0 {
            castle.push('K');
        }
        if self.castling_rights & CASTLE_WQ != 0 {
            castle.push('Q');
        }
        if self.castling_rights & CASTLE_BK != 0 {
            castle.push('k');
        }
        if self.castling_rights & CASTLE_BQ != 0 {
            castle.push('q');
        }
        if castle.is_empty() {
            castle.push('-');
        }

        let ep = self.ep_square.map(|s| s.to_algebraic()).unwrap_or_else(|| "-".to_string());

        format!(
            "{board} {side} {castle} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }

    // --- Incremental piece placement helpers --------------------------------

    fn place(&mut self, color: Color, kind: PieceType, sq: Square) {
        self.pieces[color.index()][kind.plane()] |= sq.bitboard();
        self.by_color[color.index()] |= sq.bitboard();
        self.mailbox[sq.as_usize()] = Piece::new(color, kind);
        self.zobrist_key ^= zobrist::piece_square_key(color, kind, sq);
        if zobrist::is_pawn_key_component(kind) {
            self.pawn_zobrist_key ^= zobrist::piece_square_key(color, kind, sq);
        }
        self.material[color.index()] += kind.material_value();
        let (mg, eg) = psqt_value(color, kind, sq);
        self.psqt_mid[color.index()] += mg;
        self.psqt_end[color.index()] += eg;
        self.game_phase = (self.game_phase + kind.phase_weight()).min(24);
    }

    fn remove(&mut self, color: Color, kind: PieceType, sq: Square) {
        self.pieces[color.index()][kind.plane()] &= !sq.bitboard();
        self.by_color[color.index()] &= !sq.bitboard();
        self.mailbox[sq.as_usize()] = Piece::NONE;
        self.zobrist_key ^= zobrist::piece_square_key(color, kind, sq);
        if zobrist::is_pawn_key_component(kind) {
            self.pawn_zobrist_key ^= zobrist::piece_square_key(color, kind, sq);
        }
        self.material[color.index()] -= kind.material_value();
        let (mg, eg) = psqt_value(color, kind, sq);
        self.psqt_mid[color.index()] -= mg;
        self.psqt_end[color.index()] -= eg;
        self.game_phase = (self.game_phase - kind.phase_weight()).max(0);
    }

    fn move_piece(&mut self, color: Color, kind: PieceType, from: Square, to: Square) {
        self.remove(color, kind, from);
        self.place(color, kind, to);
    }

    // --- Make / unmake -------------------------------------------------------

    /// Applies `mv` to the position. The caller is responsible for having
    /// produced `mv` from the move generator (or for validating it
    /// separately); this only asserts the basic encoding, not legality.
    /// Check [`Position::was_legal_move`] afterwards to confirm the mover's
    /// king isn't left in check.
    pub fn do_move(&mut self, mv: Move) {
        debug_assert!(!mv.is_none());
        let us = self.side_to_move;
        let them = us.flip();
        let from = mv.from();
        let to = mv.to();
        let moving_piece = self.piece_at(from);
        debug_assert_eq!(moving_piece.color, us, "do_move: wrong side to move");

        let prior_zobrist_key = self.zobrist_key;
        let prior_pawn_zobrist_key = self.pawn_zobrist_key;
        let prior_ep_square = self.ep_square;
        let prior_castling_rights = self.castling_rights;
        let prior_halfmove_clock = self.halfmove_clock;

        self.zobrist_key ^= zobrist::castling_key(self.castling_rights);
        if let Some(ep) = self.ep_square {
            self.zobrist_key ^= zobrist::en_passant_key(ep.file_of().0);
        }
        self.ep_square = None;

        let mut captured = PieceType::None;

        match mv.move_type() {
            MoveType::EnPassant => {
                let captured_sq = Square::from_file_rank(to.file_of(), from.rank_of());
                captured = PieceType::Pawn;
                self.remove(them, PieceType::Pawn, captured_sq);
                self.move_piece(us, PieceType::Pawn, from, to);
            }
            MoveType::Castling => {
                self.move_piece(us, PieceType::King, from, to);
                let (rook_from, rook_to) = castling_rook_squares(us, to);
                self.move_piece(us, PieceType::Rook, rook_from, rook_to);
            }
            MoveType::Promotion => {
                let target = self.piece_at(to);
                if !target.is_none() {
                    captured = target.kind;
                    self.remove(them, target.kind, to);
                }
                self.remove(us, PieceType::Pawn, from);
                self.place(us, mv.promotion().unwrap(), to);
            }
            MoveType::Normal => {
                let target = self.piece_at(to);
                if !target.is_none() {
                    captured = target.kind;
                    self.remove(them, target.kind, to);
                }
                self.move_piece(us, moving_piece.kind, from, to);
                if moving_piece.kind == PieceType::Pawn
                    && (to.as_usize() as i16 - from.as_usize() as i16).abs() == 16
                {
                    let ep_sq = Square::new(((from.as_usize() + to.as_usize()) / 2) as u8);
                    self.ep_square = Some(ep_sq);
                }
            }
        }

        self.castling_rights &= castling_rights_lost(from) & castling_rights_lost(to);
        self.zobrist_key ^= zobrist::castling_key(self.castling_rights);
        if let Some(ep) = self.ep_square {
            self.zobrist_key ^= zobrist::en_passant_key(ep.file_of().0);
        }

        if moving_piece.kind == PieceType::Pawn || captured != PieceType::None {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.zobrist_key ^= zobrist::side_to_move_key();
        self.side_to_move = them;

        self.history.push(UndoFrame {
            mv,
            captured,
            prior_ep_square,
            prior_castling_rights,
            prior_halfmove_clock,
            prior_zobrist_key,
            prior_pawn_zobrist_key,
        });
    }

    /// Inverts the most recent `do_move`. Panics (in debug) if called with
    /// no move on the history stack.
    pub fn undo_move(&mut self) {
        let frame = self.history.pop().expect("undo_move: history is empty");
        let them = self.side_to_move; // side that just moved is the opposite of side_to_move now
        let us = them.flip();
        self.side_to_move = us;

        let mv = frame.mv;
        let from = mv.from();
        let to = mv.to();

        match mv.move_type() {
            MoveType::EnPassant => {
                self.move_piece(us, PieceType::Pawn, to, from);
                let captured_sq = Square::from_file_rank(to.file_of(), from.rank_of());
                self.place(them, PieceType::Pawn, captured_sq);
            }
            MoveType::Castling => {
                self.move_piece(us, PieceType::King, to, from);
                let (rook_from, rook_to) = castling_rook_squares(us, to);
                self.move_piece(us, PieceType::Rook, rook_to, rook_from);
            }
            MoveType::Promotion => {
                let promoted = mv.promotion().unwrap();
                self.remove(us, promoted, to);
                self.place(us, PieceType::Pawn, from);
                if frame.captured != PieceType::None {
                    self.place(them, frame.captured, to);
                }
            }
            MoveType::Normal => {
                let moved_kind = self.piece_at(to).kind;
                self.move_piece(us, moved_kind, to, from);
                if frame.captured != PieceType::None {
                    self.place(them, frame.captured, to);
                }
            }
        }

        self.ep_square = frame.prior_ep_square;
        self.castling_rights = frame.prior_castling_rights;
        self.halfmove_clock = frame.prior_halfmove_clock;
        self.zobrist_key = frame.prior_zobrist_key;
        self.pawn_zobrist_key = frame.prior_pawn_zobrist_key;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }
    }

    /// Plays a null move (side to move passes): flips the mover and clears
    /// the en-passant square, used by null-move pruning. Must be paired with
    /// [`Position::undo_null_move`].
    pub fn do_null_move(&mut self) -> Option<Square> {
        let prior_ep = self.ep_square;
        if let Some(ep) = self.ep_square {
            self.zobrist_key ^= zobrist::en_passant_key(ep.file_of().0);
        }
        self.ep_square = None;
        self.zobrist_key ^= zobrist::side_to_move_key();
        self.side_to_move = self.side_to_move.flip();
        prior_ep
    }

    pub fn undo_null_move(&mut self, prior_ep: Option<Square>) {
        self.side_to_move = self.side_to_move.flip();
        self.zobrist_key ^= zobrist::side_to_move_key();
        if let Some(ep) = prior_ep {
            self.zobrist_key ^= zobrist::en_passant_key(ep.file_of().0);
        }
        self.ep_square = prior_ep;
    }

    /// Recomputes the Zobrist key from scratch, for consistency checks.
    #[must_use]
    pub fn recompute_zobrist_key(&self) -> u64 {
        let mut key = 0u64;
        for i in 0..64u8 {
            let sq = Square::new(i);
            let piece = self.mailbox[sq.as_usize()];
            if !piece.is_none() {
                key ^= zobrist::piece_square_key(piece.color, piece.kind, sq);
            }
        }
        if self.side_to_move == Color::Black {
            key ^= zobrist::side_to_move_key();
        }
        key ^= zobrist::castling_key(self.castling_rights);
        if let Some(ep) = self.ep_square {
            key ^= zobrist::en_passant_key(ep.file_of().0);
        }
        key
    }
}

/// Given the king's *destination* square on a castling move, returns the
/// rook's (from, to) squares for the matching side/color.
fn castling_rook_squares(color: Color, king_to: Square) -> (Square, Square) {
    match (color, king_to.as_usize()) {
        (Color::White, 6) => (Square::new(7), Square::new(5)),
        (Color::White, 2) => (Square::new(0), Square::new(3)),
        (Color::Black, 62) => (Square::new(63), Square::new(61)),
        (Color::Black, 58) => (Square::new(56), Square::new(59)),
        _ => unreachable!("invalid castling destination {king_to:?}"),
    }
}

/// True if every square between the king and its castling destination
/// (exclusive of the king's own square) is unattacked and unoccupied, and
/// the relevant right is set. `kingside` selects king- vs queenside.
#[must_use]
pub fn can_castle(pos: &Position, color: Color, kingside: bool) -> bool {
    let right = match (color, kingside) {
        (Color::White, true) => CASTLE_WK,
        (Color::White, false) => CASTLE_WQ,
        (Color::Black, true) => CASTLE_BK,
        (Color::Black, false) => CASTLE_BQ,
    };
    if pos.castling_rights() & right == 0 {
        return false;
    }
    let side = if kingside { 0 } else { 1 };
    let empty_path = bitboard::CASTLING_EMPTY_PATH[color.index()][side];
    if pos.occupied_all() & empty_path != 0 {
        return false;
    }
    let king_sq = pos.king_square(color);
    let king_path = bitboard::CASTLING_KING_PATH[color.index()][side] | king_sq.bitboard();
    let mut sq_iter = king_path;
    while sq_iter != 0 {
        let sq = bitboard::pop_lsb(&mut sq_iter);
        if crate::attacks::attackers_to(pos, sq, color.flip()) != 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_fen_roundtrip() {
        let pos = Position::startpos();
        assert_eq!(pos.to_fen(), STARTPOS_FEN);
    }

    #[test]
    fn zobrist_key_matches_recompute() {
        let pos = Position::startpos();
        assert_eq!(pos.zobrist_key(), pos.recompute_zobrist_key());
    }

    #[test]
    fn make_unmake_restores_state() {
        let mut pos = Position::startpos();
        let before = pos.clone();
        let mv = Move::new(Square::from_algebraic("e2").unwrap(), Square::from_algebraic("e4").unwrap(), MoveType::Normal);
        pos.do_move(mv);
        assert_ne!(pos.zobrist_key(), before.zobrist_key());
        pos.undo_move();
        assert_eq!(pos.zobrist_key(), before.zobrist_key());
        assert_eq!(pos.to_fen(), before.to_fen());
        assert_eq!(pos.history_depth(), 0);
    }

    #[test]
    fn en_passant_round_trip_restores_captured_pawn_and_ep_square() {
        // Black to move, en-passant capture f4xe3 available.
        let mut pos = Position::from_fen(
            "r3k2r/1ppn3p/2q1q1n1/4P3/2q1Pp2/B5R1/pbp2PPP/1R4K1 b kq e3",
        )
        .unwrap();
        let before = pos.clone();
        let mv = Move::new(
            Square::from_algebraic("f4").unwrap(),
            Square::from_algebraic("e3").unwrap(),
            MoveType::EnPassant,
        );
        pos.do_move(mv);
        assert!(pos.piece_at(Square::from_algebraic("e4").unwrap()).is_none());
        pos.undo_move();
        assert_eq!(pos.zobrist_key(), before.zobrist_key());
        assert_eq!(pos.pawn_key(), before.pawn_key());
        assert_eq!(pos.to_fen(), before.to_fen());
    }

    #[test]
    fn insufficient_material_detects_kk_and_knk() {
        let kk = Position::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(kk.has_insufficient_material());
        let knk = Position::from_fen("8/8/8/4k3/8/3N4/8/4K3 w - - 0 1").unwrap();
        assert!(knk.has_insufficient_material());
        let krk = Position::from_fen("8/8/8/4k3/8/3R4/8/4K3 w - - 0 1").unwrap();
        assert!(!krk.has_insufficient_material());
    }

    #[test]
    fn game_phase_starts_at_maximum() {
        let pos = Position::startpos();
        assert_eq!(pos.game_phase(), 24);
        assert_eq!(pos.game_phase_factor(), 1.0);
    }
}
