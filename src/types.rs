//! Core primitive types: colors, piece types, pieces, squares, directions,
//! values and scores, and the packed move encoding.
//!
//! All of these are consolidated into a single module around one packed
//! 32-bit move representation and a 0-63 bitboard square index.

use std::fmt;

/// One of the two sides.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    #[must_use]
    pub fn flip(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// +1 for White, -1 for Black. Used to orient pawn pushes and PSQT mirroring.
    #[inline]
    #[must_use]
    pub fn direction(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Piece kind, independent of color. `None` stands for "no piece" in the
/// mailbox and is distinct from any real piece.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PieceType {
    None,
    King,
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Index into the six per-color bitboard planes (Pawn..King, 0..6).
    /// `None` has no plane and must never be indexed with this.
    #[inline]
    #[must_use]
    pub fn plane(self) -> usize {
        match self {
            PieceType::Pawn => 0,
            PieceType::Knight => 1,
            PieceType::Bishop => 2,
            PieceType::Rook => 3,
            PieceType::Queen => 4,
            PieceType::King => 5,
            PieceType::None => unreachable!("PieceType::None has no bitboard plane"),
        }
    }

    #[inline]
    #[must_use]
    pub fn from_plane(idx: usize) -> PieceType {
        match idx {
            0 => PieceType::Pawn,
            1 => PieceType::Knight,
            2 => PieceType::Bishop,
            3 => PieceType::Rook,
            4 => PieceType::Queen,
            5 => PieceType::King,
            _ => panic!("invalid piece plane index {idx}"),
        }
    }

    /// Game-phase weight used to interpolate between mid-game and end-game scores.
    #[inline]
    #[must_use]
    pub fn phase_weight(self) -> i32 {
        match self {
            PieceType::Knight | PieceType::Bishop => 1,
            PieceType::Rook => 2,
            PieceType::Queen => 4,
            _ => 0,
        }
    }

    /// Centipawn material value.
    #[inline]
    #[must_use]
    pub fn material_value(self) -> i32 {
        match self {
            PieceType::Pawn => 100,
            PieceType::Knight => 320,
            PieceType::Bishop => 330,
            PieceType::Rook => 500,
            PieceType::Queen => 900,
            PieceType::King => 2000,
            PieceType::None => 0,
        }
    }

    #[must_use]
    pub fn to_lower_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
            PieceType::None => '.',
        }
    }
}

/// A colored piece, packed as `(Color, PieceType)`. `NONE` is the empty slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
}

impl Piece {
    pub const NONE: Piece = Piece {
        color: Color::White,
        kind: PieceType::None,
    };

    #[inline]
    #[must_use]
    pub fn new(color: Color, kind: PieceType) -> Piece {
        Piece { color, kind }
    }

    #[inline]
    #[must_use]
    pub fn is_none(self) -> bool {
        self.kind == PieceType::None
    }

    #[must_use]
    pub fn to_char(self) -> char {
        let c = self.kind.to_lower_char();
        if self.color == Color::White {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }
}

/// File index 0..=7 (a..=h).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct File(pub u8);

/// Rank index 0..=7 (1..=8).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Rank(pub u8);

/// A board square in little-endian rank-file order: A1 = 0, H8 = 63.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Square(pub u8);

/// A ray direction expressed as the delta applied to a square index, along
/// with the file delta used to detect board-edge wraparound.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Direction {
    pub delta: i8,
    pub file_delta: i8,
}

impl Direction {
    pub const NORTH: Direction = Direction { delta: 8, file_delta: 0 };
    pub const SOUTH: Direction = Direction { delta: -8, file_delta: 0 };
    pub const EAST: Direction = Direction { delta: 1, file_delta: 1 };
    pub const WEST: Direction = Direction { delta: -1, file_delta: -1 };
    pub const NORTH_EAST: Direction = Direction { delta: 9, file_delta: 1 };
    pub const NORTH_WEST: Direction = Direction { delta: 7, file_delta: -1 };
    pub const SOUTH_EAST: Direction = Direction { delta: -7, file_delta: 1 };
    pub const SOUTH_WEST: Direction = Direction { delta: -9, file_delta: -1 };

    pub const ROOK_DIRS: [Direction; 4] = [Self::NORTH, Self::SOUTH, Self::EAST, Self::WEST];
    pub const BISHOP_DIRS: [Direction; 4] =
        [Self::NORTH_EAST, Self::NORTH_WEST, Self::SOUTH_EAST, Self::SOUTH_WEST];
}

impl Square {
    pub const COUNT: usize = 64;

    #[inline]
    #[must_use]
    pub fn new(index: u8) -> Square {
        debug_assert!(index < 64, "square index out of range: {index}");
        Square(index)
    }

    #[inline]
    #[must_use]
    pub fn from_file_rank(file: File, rank: Rank) -> Square {
        Square(rank.0 * 8 + file.0)
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub fn file_of(self) -> File {
        File(self.0 % 8)
    }

    #[inline]
    #[must_use]
    pub fn rank_of(self) -> Rank {
        Rank(self.0 / 8)
    }

    #[inline]
    #[must_use]
    pub fn bitboard(self) -> u64 {
        1u64 << self.0
    }

    /// Steps one square in `dir`, returning `None` if that would leave the board
    /// (including file wraparound for diagonal/horizontal steps).
    #[must_use]
    pub fn to(self, dir: Direction) -> Option<Square> {
        let target = self.0 as i16 + dir.delta as i16;
        if !(0..64).contains(&target) {
            return None;
        }
        let target = target as u8;
        let file_ok = (Square(target).file_of().0 as i16 - self.file_of().0 as i16)
            == dir.file_delta as i16;
        if !file_ok {
            return None;
        }
        Some(Square(target))
    }

    #[must_use]
    pub fn from_algebraic(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0];
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Some(Square::from_file_rank(File(file - b'a'), Rank(rank - b'1')))
    }

    #[must_use]
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file_of().0) as char;
        let rank = (b'1' + self.rank_of().0) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

/// Move type tag, stored in bits 14-15 of the packed move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum MoveType {
    Normal = 0,
    Promotion = 1,
    EnPassant = 2,
    Castling = 3,
}

impl MoveType {
    #[must_use]
    pub fn from_bits(bits: u32) -> MoveType {
        match bits {
            0 => MoveType::Normal,
            1 => MoveType::Promotion,
            2 => MoveType::EnPassant,
            3 => MoveType::Castling,
            _ => unreachable!(),
        }
    }
}

const FROM_SHIFT: u32 = 0;
const TO_SHIFT: u32 = 6;
const PROMO_SHIFT: u32 = 12;
const TYPE_SHIFT: u32 = 14;
const ORDER_SHIFT: u32 = 16;

const FROM_MASK: u32 = 0x3F << FROM_SHIFT;
const TO_MASK: u32 = 0x3F << TO_SHIFT;
const PROMO_MASK: u32 = 0x3 << PROMO_SHIFT;
const TYPE_MASK: u32 = 0x3 << TYPE_SHIFT;

/// A move packed into a 32-bit word: from (6 bits), to (6 bits), promotion
/// piece type (2 bits, Knight..Queen), move type (2 bits), and a signed
/// ordering value in the high 16 bits. `NONE` is the all-zero word.
///
/// Equality ignores the ordering value, since two encodings of "the same
/// move" found at different points in the search may carry different scores.
#[derive(Clone, Copy, Debug)]
pub struct Move(pub u32);

impl Move {
    pub const NONE: Move = Move(0);

    #[must_use]
    pub fn new(from: Square, to: Square, move_type: MoveType) -> Move {
        Move((from.0 as u32) | ((to.0 as u32) << TO_SHIFT) | ((move_type as u32) << TYPE_SHIFT))
    }

    #[must_use]
    pub fn new_promotion(from: Square, to: Square, promo: PieceType) -> Move {
        let promo_bits = match promo {
            PieceType::Knight => 0,
            PieceType::Bishop => 1,
            PieceType::Rook => 2,
            PieceType::Queen => 3,
            _ => panic!("invalid promotion piece {promo:?}"),
        };
        Move((from.0 as u32)
            | ((to.0 as u32) << TO_SHIFT)
            | (promo_bits << PROMO_SHIFT)
            | ((MoveType::Promotion as u32) << TYPE_SHIFT))
    }

    #[inline]
    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 & (FROM_MASK | TO_MASK | PROMO_MASK | TYPE_MASK) == 0
    }

    #[inline]
    #[must_use]
    pub fn from(self) -> Square {
        Square(((self.0 & FROM_MASK) >> FROM_SHIFT) as u8)
    }

    #[inline]
    #[must_use]
    pub fn to(self) -> Square {
        Square(((self.0 & TO_MASK) >> TO_SHIFT) as u8)
    }

    #[inline]
    #[must_use]
    pub fn move_type(self) -> MoveType {
        MoveType::from_bits((self.0 & TYPE_MASK) >> TYPE_SHIFT)
    }

    #[inline]
    #[must_use]
    pub fn promotion(self) -> Option<PieceType> {
        if self.move_type() != MoveType::Promotion {
            return None;
        }
        Some(match (self.0 & PROMO_MASK) >> PROMO_SHIFT {
            0 => PieceType::Knight,
            1 => PieceType::Bishop,
            2 => PieceType::Rook,
            3 => PieceType::Queen,
            _ => unreachable!(),
        })
    }

    #[inline]
    #[must_use]
    pub fn order_value(self) -> i16 {
        (self.0 >> ORDER_SHIFT) as i16
    }

    #[must_use]
    pub fn with_order_value(self, value: i32) -> Move {
        let clamped = value.clamp(i16::MIN as i32, i16::MAX as i32) as u16;
        Move((self.0 & 0x0000_FFFF) | ((clamped as u32) << ORDER_SHIFT))
    }

    /// Parses a UCI move string (`e2e4`, `e7e8q`, ...) without validating it
    /// against any position. Use the move generator to check legality.
    #[must_use]
    pub fn from_uci(s: &str) -> Option<Move> {
        if s.len() < 4 {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        if s.len() == 5 {
            let promo = match s.as_bytes()[4] {
                b'n' => PieceType::Knight,
                b'b' => PieceType::Bishop,
                b'r' => PieceType::Rook,
                b'q' => PieceType::Queen,
                _ => return None,
            };
            Some(Move::new_promotion(from, to, promo))
        } else {
            Some(Move::new(from, to, MoveType::Normal))
        }
    }

    #[must_use]
    pub fn to_uci(self) -> String {
        if self.is_none() {
            return "0000".to_string();
        }
        let mut s = format!("{}{}", self.from(), self.to());
        if let Some(promo) = self.promotion() {
            s.push(promo.to_lower_char());
        }
        s
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        (self.0 & 0x0000_FFFF) == (other.0 & 0x0000_FFFF)
    }
}
impl Eq for Move {}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// Centipawn evaluation, clamped to the legal range. Mate scores are
/// distance-encoded: `|v| > MATE_SCORE - MAX_PLY` means mate in
/// `(MATE_SCORE - |v| + 1) / 2` plies.
pub type Value = i32;

pub const VALUE_DRAW: Value = 0;
pub const VALUE_INFINITE: Value = 15_000;
pub const VALUE_CHECKMATE: Value = 10_000;
pub const MAX_PLY: usize = 128;

#[inline]
#[must_use]
pub fn is_mate_score(v: Value) -> bool {
    v.abs() > VALUE_CHECKMATE - MAX_PLY as i32
}

#[inline]
#[must_use]
pub fn mate_in_plies(v: Value) -> i32 {
    (VALUE_CHECKMATE - v.abs() + 1) / 2
}

/// A mid-game/end-game score pair, combined by linear interpolation on the
/// game-phase factor.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Score {
    pub mid: i32,
    pub end: i32,
}

impl Score {
    pub const ZERO: Score = Score { mid: 0, end: 0 };

    #[must_use]
    pub fn new(mid: i32, end: i32) -> Score {
        Score { mid, end }
    }

    /// Interpolates using `phase` in `[0.0, 1.0]`, 1.0 being the opening.
    #[must_use]
    pub fn interpolate(self, phase: f32) -> i32 {
        (self.mid as f32 * phase + self.end as f32 * (1.0 - phase)).round() as i32
    }
}

impl std::ops::Add for Score {
    type Output = Score;
    fn add(self, rhs: Score) -> Score {
        Score::new(self.mid + rhs.mid, self.end + rhs.end)
    }
}
impl std::ops::AddAssign for Score {
    fn add_assign(&mut self, rhs: Score) {
        self.mid += rhs.mid;
        self.end += rhs.end;
    }
}
impl std::ops::Sub for Score {
    type Output = Score;
    fn sub(self, rhs: Score) -> Score {
        Score::new(self.mid - rhs.mid, self.end - rhs.end)
    }
}
impl std::ops::SubAssign for Score {
    fn sub_assign(&mut self, rhs: Score) {
        self.mid -= rhs.mid;
        self.end -= rhs.end;
    }
}
impl std::ops::Neg for Score {
    type Output = Score;
    fn neg(self) -> Score {
        Score::new(-self.mid, -self.end)
    }
}
impl std::ops::Mul<i32> for Score {
    type Output = Score;
    fn mul(self, rhs: i32) -> Score {
        Score::new(self.mid * rhs, self.end * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_roundtrip() {
        for idx in 0..64u8 {
            let sq = Square::new(idx);
            assert_eq!(Square::from_algebraic(&sq.to_algebraic()), Some(sq));
        }
    }

    #[test]
    fn square_to_detects_wraparound() {
        let h_file = Square::from_algebraic("h4").unwrap();
        assert!(h_file.to(Direction::EAST).is_none());
        let a_file = Square::from_algebraic("a4").unwrap();
        assert!(a_file.to(Direction::WEST).is_none());
    }

    #[test]
    fn move_equality_ignores_order_value() {
        let m1 = Move::new(Square::new(12), Square::new(28), MoveType::Normal);
        let m2 = m1.with_order_value(500);
        assert_eq!(m1, m2);
        assert_ne!(m1.order_value(), m2.order_value());
    }

    #[test]
    fn move_uci_roundtrip() {
        let m = Move::from_uci("e7e8q").unwrap();
        assert_eq!(m.to_uci(), "e7e8q");
        assert_eq!(m.promotion(), Some(PieceType::Queen));
    }

    #[test]
    fn score_interpolation() {
        let s = Score::new(100, 50);
        assert_eq!(s.interpolate(1.0), 100);
        assert_eq!(s.interpolate(0.0), 50);
    }
}
