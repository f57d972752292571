use std::fmt;
use std::str::FromStr;

use crate::error::{ChessError, Result};
use crate::movegen::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Stored rank of this side's back row (rank 0 is the 8th rank).
    pub fn back_rank(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn pawn_rank(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    pub fn promotion_rank(&self) -> u8 {
        self.opposite().back_rank()
    }

    /// Stored-rank step of a pawn advance. White moves towards rank 0.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Knight,
    Bishop,
    Pawn,
}

impl PieceKind {
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    pub fn is_promotion_target(&self) -> bool {
        !matches!(self, PieceKind::King | PieceKind::Pawn)
    }

    /// Parses a promotion suffix letter, either case.
    pub fn from_promotion_char(c: char) -> Result<PieceKind> {
        match c.to_ascii_lowercase() {
            'q' => Ok(PieceKind::Queen),
            'r' => Ok(PieceKind::Rook),
            'b' => Ok(PieceKind::Bishop),
            'n' => Ok(PieceKind::Knight),
            _ => Err(ChessError::InvalidMoveInput(format!(
                "unknown promotion piece '{c}'"
            ))),
        }
    }

    fn letter(&self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Pawn => 'p',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// Decodes a placement letter: upper case is White, lower case Black.
    pub fn from_char(c: char) -> Option<Piece> {
        let kind = match c.to_ascii_lowercase() {
            'k' => PieceKind::King,
            'q' => PieceKind::Queen,
            'r' => PieceKind::Rook,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'p' => PieceKind::Pawn,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(color, kind))
    }

    pub fn to_char(&self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn glyph(&self) -> char {
        match (self.color, self.kind) {
            (Color::White, PieceKind::King) => '♔',
            (Color::White, PieceKind::Queen) => '♕',
            (Color::White, PieceKind::Rook) => '♖',
            (Color::White, PieceKind::Bishop) => '♗',
            (Color::White, PieceKind::Knight) => '♘',
            (Color::White, PieceKind::Pawn) => '♙',
            (Color::Black, PieceKind::King) => '♚',
            (Color::Black, PieceKind::Queen) => '♛',
            (Color::Black, PieceKind::Rook) => '♜',
            (Color::Black, PieceKind::Bishop) => '♝',
            (Color::Black, PieceKind::Knight) => '♞',
            (Color::Black, PieceKind::Pawn) => '♟',
        }
    }
}

/// What stands on a square. `Invalid` only comes out of the lenient loader
/// and keeps the character it was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Occupant {
    #[default]
    Empty,
    Piece(Piece),
    Invalid(char),
}

impl Occupant {
    pub fn piece(&self) -> Option<Piece> {
        match self {
            Occupant::Piece(piece) => Some(*piece),
            _ => None,
        }
    }

    pub fn color(&self) -> Option<Color> {
        self.piece().map(|p| p.color)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Occupant::Empty)
    }

    pub fn is(&self, color: Color, kind: PieceKind) -> bool {
        self.piece() == Some(Piece::new(color, kind))
    }
}

/// A board coordinate. File 0 is the a-file, rank 0 is the 8th rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Result<Square> {
        if file < 8 && rank < 8 {
            Ok(Square { file, rank })
        } else {
            Err(ChessError::InvalidMoveInput(format!(
                "square ({file}, {rank}) is off the board"
            )))
        }
    }

    pub(crate) const fn at(file: u8, rank: u8) -> Square {
        debug_assert!(file < 8 && rank < 8);
        Square { file, rank }
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// The square `(df, dr)` away, if it is still on the board.
    pub fn offset(&self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::at(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// All 64 squares, rank-major from a8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square::at(file, rank)))
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidMoveInput(format!("bad square '{s}'")));
        }
        let (file, digit) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&digit) {
            return Err(ChessError::InvalidMoveInput(format!("bad square '{s}'")));
        }
        Ok(Square::at(file - b'a', 7 - (digit - b'1')))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, 8 - self.rank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub fn rook_file(&self) -> u8 {
        match self {
            CastleSide::King => 7,
            CastleSide::Queen => 0,
        }
    }

    pub fn king_target_file(&self) -> u8 {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }

    pub fn rook_target_file(&self) -> u8 {
        match self {
            CastleSide::King => 5,
            CastleSide::Queen => 3,
        }
    }
}

pub const KING_FILE: u8 = 4;

/// Four bits, KQkq from the low end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    fn bit(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::King) => 0b0001,
            (Color::White, CastleSide::Queen) => 0b0010,
            (Color::Black, CastleSide::King) => 0b0100,
            (Color::Black, CastleSide::Queen) => 0b1000,
        }
    }

    pub fn has(&self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::bit(color, side) != 0
    }

    pub fn set(&mut self, color: Color, side: CastleSide) {
        self.0 |= Self::bit(color, side);
    }

    pub fn remove(&mut self, color: Color, side: CastleSide) {
        self.0 &= !Self::bit(color, side);
    }

    /// Drops every right whose king or rook home square is `square`.
    fn forget_square(&mut self, square: Square) {
        for color in [Color::White, Color::Black] {
            if square.rank() != color.back_rank() {
                continue;
            }
            for side in [CastleSide::King, CastleSide::Queen] {
                if square.file() == KING_FILE || square.file() == side.rook_file() {
                    self.remove(color, side);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub board: [[Occupant; 8]; 8],
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

const BACK_ROW: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        let mut position = Self::empty();
        for color in [Color::White, Color::Black] {
            for (file, kind) in BACK_ROW.iter().enumerate() {
                position.board[color.back_rank() as usize][file] =
                    Occupant::Piece(Piece::new(color, *kind));
                position.board[color.pawn_rank() as usize][file] =
                    Occupant::Piece(Piece::new(color, PieceKind::Pawn));
            }
        }
        position.castling_rights = CastlingRights::ALL;
        position
    }

    /// No pieces, White to move, no rights.
    pub fn empty() -> Self {
        Self {
            board: [[Occupant::Empty; 8]; 8],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        crate::fen::load(fen)
    }

    pub fn piece_at(&self, square: Square) -> Occupant {
        self.board[square.rank() as usize][square.file() as usize]
    }

    pub fn set(&mut self, square: Square, occupant: Occupant) {
        self.board[square.rank() as usize][square.file() as usize] = occupant;
    }

    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| match self.piece_at(square) {
            Occupant::Piece(piece) if piece.color == color => Some((square, piece)),
            _ => None,
        })
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(square, _)| square)
    }

    /// Plays `mv` without asking whether it is legal. Callers outside the
    /// rules engine should go through `MoveGenerator::make_move`.
    pub fn apply_move(&mut self, mv: Move) {
        let moving = match self.piece_at(mv.from).piece() {
            Some(piece) => piece,
            None => return,
        };
        let color = moving.color;
        let is_pawn = moving.kind == PieceKind::Pawn;
        let is_en_passant = is_pawn
            && mv.from.file() != mv.to.file()
            && self.piece_at(mv.to).is_empty()
            && self.en_passant_square == Some(mv.to);
        let is_capture = self.piece_at(mv.to).piece().is_some() || is_en_passant;

        // Move or promote
        let placed = if is_pawn && mv.to.rank() == color.promotion_rank() {
            Piece::new(color, mv.promotion.unwrap_or(PieceKind::Queen))
        } else {
            moving
        };
        self.set(mv.from, Occupant::Empty);
        self.set(mv.to, Occupant::Piece(placed));

        // The captured pawn stands beside the mover, not on the target.
        if is_en_passant {
            self.set(Square::at(mv.to.file(), mv.from.rank()), Occupant::Empty);
        }

        // Rook hop
        if moving.kind == PieceKind::King
            && mv.from.file() == KING_FILE
            && mv.from.rank() == color.back_rank()
            && mv.from.rank() == mv.to.rank()
            && mv.from.file().abs_diff(mv.to.file()) == 2
        {
            let side = if mv.to.file() > mv.from.file() {
                CastleSide::King
            } else {
                CastleSide::Queen
            };
            let rank = mv.from.rank();
            let rook_from = Square::at(side.rook_file(), rank);
            let rook = self.piece_at(rook_from);
            self.set(rook_from, Occupant::Empty);
            self.set(Square::at(side.rook_target_file(), rank), rook);
        }

        self.castling_rights.forget_square(mv.from);
        self.castling_rights.forget_square(mv.to);

        self.en_passant_square = None;
        if is_pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            let passed = Square::at(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2);
            let enemy_pawn_beside = [-1, 1].iter().any(|&df| {
                mv.to
                    .offset(df, 0)
                    .map_or(false, |s| self.piece_at(s).is(color.opposite(), PieceKind::Pawn))
            });
            if enemy_pawn_beside {
                self.en_passant_square = Some(passed);
            }
        }

        if is_pawn || is_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if color == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = color.opposite();
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_fen(s)
    }
}

/// Rank 8 first. `{:#}` draws chess glyphs instead of letters.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let glyphs = f.alternate();
        let mut result = String::new();
        for (rank, row) in self.board.iter().enumerate() {
            result.push((b'8' - rank as u8) as char);
            result.push(' ');
            for (file, occupant) in row.iter().enumerate() {
                result.push(match occupant {
                    Occupant::Piece(piece) if glyphs => piece.glyph(),
                    Occupant::Piece(piece) => piece.to_char(),
                    Occupant::Empty => '.',
                    Occupant::Invalid(_) => '?',
                });
                if file < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h\n");
        write!(f, "{}", result)
    }
}
