use std::fmt;
use std::str::FromStr;

use crate::board::{CastleSide, Color, Occupant, Piece, PieceKind, Position, Square, KING_FILE};
use crate::error::{ChessError, Result};

/// A move in coordinate form. `promotion` only matters when a pawn reaches
/// the far rank; `None` there means a queen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn new_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

/// Parses `e2e4` or `e7e8n`.
impl FromStr for Move {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(ChessError::InvalidMoveInput(format!("bad move '{s}'")));
        }
        let from = s[0..2].parse()?;
        let to = s[2..4].parse()?;
        let promotion = match s[4..].chars().next() {
            Some(c) => Some(PieceKind::from_promotion_char(c)?),
            None => None,
        };
        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            let letter = Piece::new(Color::Black, promotion).to_char();
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}

/// Result of asking whether the side to move can still play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    /// The colour is the side that has been mated.
    Checkmate(Color),
    /// The colour is the side left without a move.
    Stalemate(Color),
}

impl GameState {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameState::Ongoing)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Ongoing => write!(f, "ongoing"),
            GameState::Checkmate(loser) => {
                write!(f, "checkmate, {} wins", loser.opposite())
            }
            GameState::Stalemate(side) => write!(f, "stalemate, {} cannot move", side),
        }
    }
}

fn is_line(df: i8, dr: i8) -> bool {
    df == 0 || dr == 0 || df.abs() == dr.abs()
}

/// Stateless rule checks over a borrowed [`Position`]. Probing never touches
/// the caller's position; king safety is tested on a copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// True if any square strictly between `from` and `to` is occupied.
    /// Spans that are not a straight or diagonal line never count as blocked.
    pub fn is_pieces_between(&self, board: &Position, from: Square, to: Square) -> bool {
        let df = to.file() as i8 - from.file() as i8;
        let dr = to.rank() as i8 - from.rank() as i8;
        if from == to || !is_line(df, dr) {
            return false;
        }

        let (step_file, step_rank) = (df.signum(), dr.signum());
        let mut square = from.offset(step_file, step_rank);
        while let Some(current) = square {
            if current == to {
                break;
            }
            if !board.piece_at(current).is_empty() {
                return true;
            }
            square = current.offset(step_file, step_rank);
        }
        false
    }

    // Shared movement shape of everything but pawns and castling.
    fn reaches(&self, board: &Position, kind: PieceKind, from: Square, to: Square) -> bool {
        let df = to.file() as i8 - from.file() as i8;
        let dr = to.rank() as i8 - from.rank() as i8;
        match kind {
            PieceKind::King => df.abs() <= 1 && dr.abs() <= 1,
            PieceKind::Queen => is_line(df, dr) && !self.is_pieces_between(board, from, to),
            PieceKind::Rook => (df == 0 || dr == 0) && !self.is_pieces_between(board, from, to),
            PieceKind::Bishop => df.abs() == dr.abs() && !self.is_pieces_between(board, from, to),
            PieceKind::Knight => matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)),
            PieceKind::Pawn => false,
        }
    }

    /// Whether the piece on `from` attacks `target`, whoever is to move and
    /// whatever stands on `target`.
    fn attacks(&self, board: &Position, from: Square, target: Square) -> bool {
        let piece = match board.piece_at(from).piece() {
            Some(piece) => piece,
            None => return false,
        };
        if from == target {
            return false;
        }
        match piece.kind {
            PieceKind::Pawn => {
                let df = target.file() as i8 - from.file() as i8;
                let dr = target.rank() as i8 - from.rank() as i8;
                df.abs() == 1 && dr == piece.color.forward()
            }
            kind => self.reaches(board, kind, from, target),
        }
    }

    pub fn is_square_attacked(
        &self,
        board: &Position,
        square: Square,
        attacker_color: Color,
    ) -> bool {
        board
            .pieces(attacker_color)
            .any(|(from, _)| self.attacks(board, from, square))
    }

    /// A side without a king is never in check.
    pub fn is_in_check(&self, board: &Position, color: Color) -> bool {
        match board.king_square(color) {
            Some(king_square) => self.is_square_attacked(board, king_square, color.opposite()),
            None => false,
        }
    }

    fn is_pawn_move(&self, board: &Position, color: Color, from: Square, to: Square) -> bool {
        let df = to.file() as i8 - from.file() as i8;
        let dr = to.rank() as i8 - from.rank() as i8;
        let forward = color.forward();
        let target = board.piece_at(to);

        if df == 0 && dr == forward {
            target.is_empty()
        } else if df == 0 && dr == 2 * forward && from.rank() == color.pawn_rank() {
            let passed = from.offset(0, forward);
            target.is_empty() && passed.map_or(false, |s| board.piece_at(s).is_empty())
        } else if df.abs() == 1 && dr == forward {
            if target.color() == Some(color.opposite()) {
                return true;
            }
            // En passant: the pawn being taken sits beside the mover.
            target.is_empty()
                && board.en_passant_square == Some(to)
                && board
                    .piece_at(Square::at(to.file(), from.rank()))
                    .is(color.opposite(), PieceKind::Pawn)
        } else {
            false
        }
    }

    fn is_castling_legal(&self, board: &Position, color: Color, from: Square, to: Square) -> bool {
        let rank = color.back_rank();
        if from != Square::at(KING_FILE, rank) || to.rank() != rank {
            return false;
        }
        let side = if to.file() == CastleSide::King.king_target_file() {
            CastleSide::King
        } else if to.file() == CastleSide::Queen.king_target_file() {
            CastleSide::Queen
        } else {
            return false;
        };
        if !board.castling_rights.has(color, side) {
            return false;
        }

        let rook_square = Square::at(side.rook_file(), rank);
        if !board.piece_at(rook_square).is(color, PieceKind::Rook) {
            return false;
        }
        if self.is_pieces_between(board, from, rook_square) {
            return false;
        }

        // Not out of, through, or into check.
        let enemy = color.opposite();
        let transit = Square::at(side.rook_target_file(), rank);
        [from, transit, to]
            .iter()
            .all(|&square| !self.is_square_attacked(board, square, enemy))
    }

    fn is_pseudo_legal(
        &self,
        board: &Position,
        from: Square,
        to: Square,
        enforce_turn: bool,
    ) -> bool {
        if from == to {
            return false;
        }
        let piece = match board.piece_at(from) {
            Occupant::Piece(piece) => piece,
            Occupant::Empty | Occupant::Invalid(_) => return false,
        };
        if enforce_turn && piece.color != board.side_to_move {
            return false;
        }
        match board.piece_at(to) {
            Occupant::Piece(target) if target.color == piece.color => return false,
            Occupant::Invalid(_) => return false,
            _ => {}
        }

        match piece.kind {
            PieceKind::Pawn => self.is_pawn_move(board, piece.color, from, to),
            PieceKind::King => {
                self.reaches(board, PieceKind::King, from, to)
                    || self.is_castling_legal(board, piece.color, from, to)
            }
            kind => self.reaches(board, kind, from, to),
        }
    }

    /// Full legality: movement rules plus own-king safety.
    pub fn is_legal_move(
        &self,
        board: &Position,
        from: Square,
        to: Square,
        enforce_turn: bool,
    ) -> bool {
        if !self.is_pseudo_legal(board, from, to, enforce_turn) {
            return false;
        }
        let mover = match board.piece_at(from).color() {
            Some(color) => color,
            None => return false,
        };

        let mut board_copy = *board;
        board_copy.apply_move(Move::new(from, to));
        !self.is_in_check(&board_copy, mover)
    }

    /// Checks and plays a move for the side to move, promoting to
    /// `promotion` (queen by default). On error `board` is untouched.
    pub fn make_move(
        &self,
        board: &mut Position,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<GameState> {
        let promotion = promotion.unwrap_or(PieceKind::Queen);
        if !promotion.is_promotion_target() {
            return Err(ChessError::InvalidMoveInput(format!(
                "cannot promote to {promotion:?}"
            )));
        }
        if !self.is_legal_move(board, from, to, true) {
            return Err(ChessError::IllegalMove { from, to });
        }

        board.apply_move(Move::new_promotion(from, to, promotion));
        Ok(self.get_game_state(board))
    }

    pub fn play(&self, board: &mut Position, mv: Move) -> Result<GameState> {
        self.make_move(board, mv.from, mv.to, mv.promotion)
    }

    pub fn legal_destinations(&self, board: &Position, from: Square) -> Vec<Square> {
        Square::all()
            .filter(|&to| self.is_legal_move(board, from, to, true))
            .collect()
    }

    /// Every legal move for the side to move. Promotions are listed once per
    /// promotion piece.
    pub fn generate_moves(&self, board: &Position) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in board.pieces(board.side_to_move) {
            for to in self.legal_destinations(board, from) {
                if piece.kind == PieceKind::Pawn && to.rank() == piece.color.promotion_rank() {
                    for promotion in PieceKind::PROMOTIONS {
                        moves.push(Move::new_promotion(from, to, promotion));
                    }
                } else {
                    moves.push(Move::new(from, to));
                }
            }
        }
        moves
    }

    fn has_legal_move(&self, board: &Position) -> bool {
        board.pieces(board.side_to_move).any(|(from, _)| {
            Square::all().any(|to| self.is_legal_move(board, from, to, true))
        })
    }

    pub fn get_game_state(&self, board: &Position) -> GameState {
        if self.has_legal_move(board) {
            GameState::Ongoing
        } else if self.is_in_check(board, board.side_to_move) {
            GameState::Checkmate(board.side_to_move)
        } else {
            GameState::Stalemate(board.side_to_move)
        }
    }
}
