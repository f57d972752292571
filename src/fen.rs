//! Position-description (FEN) loading.
//!
//! Only reading is supported. Strict mode rejects anything outside the
//! standard alphabet; lenient mode turns unknown placement characters into
//! [`Occupant::Invalid`] squares and keeps going.

use crate::board::{CastleSide, CastlingRights, Color, Occupant, Piece, Position, Square};
use crate::error::{ChessError, Result};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    #[default]
    Strict,
    Lenient,
}

fn malformed(msg: impl Into<String>) -> ChessError {
    ChessError::MalformedPosition(msg.into())
}

pub fn load(fen: &str) -> Result<Position> {
    load_with(fen, LoadMode::Strict)
}

pub fn load_with(fen: &str, mode: LoadMode) -> Result<Position> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() != 6 {
        return Err(malformed(format!(
            "expected 6 fields, found {}",
            parts.len()
        )));
    }

    let mut position = Position::empty();
    parse_placement(parts[0], mode, &mut position)?;
    position.side_to_move = parse_side_to_move(parts[1], mode)?;
    position.castling_rights = parse_castling(parts[2], mode)?;
    position.en_passant_square = match parts[3] {
        "-" => None,
        square => Some(
            square
                .parse::<Square>()
                .map_err(|_| malformed(format!("bad en-passant square '{square}'")))?,
        ),
    };
    position.halfmove_clock = parts[4]
        .parse()
        .map_err(|_| malformed(format!("bad halfmove clock '{}'", parts[4])))?;
    position.fullmove_number = parts[5]
        .parse()
        .map_err(|_| malformed(format!("bad fullmove number '{}'", parts[5])))?;

    Ok(position)
}

fn parse_placement(placement: &str, mode: LoadMode, position: &mut Position) -> Result<()> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(malformed(format!("expected 8 ranks, found {}", rows.len())));
    }

    for (rank, row) in rows.iter().enumerate() {
        let mut file = 0usize;
        for c in row.chars() {
            let run = match c {
                '1'..='8' => c as usize - '0' as usize,
                _ => 1,
            };
            if file + run > 8 {
                return Err(malformed(format!("rank {} is wider than 8", 8 - rank)));
            }
            match c {
                '1'..='8' => {}
                _ => {
                    let occupant = match (Piece::from_char(c), mode) {
                        (Some(piece), _) => Occupant::Piece(piece),
                        (None, LoadMode::Lenient) => Occupant::Invalid(c),
                        (None, LoadMode::Strict) => {
                            return Err(malformed(format!("unknown piece character '{c}'")))
                        }
                    };
                    position.board[rank][file] = occupant;
                }
            }
            file += run;
        }
        if file != 8 {
            return Err(malformed(format!("rank {} is narrower than 8", 8 - rank)));
        }
    }
    Ok(())
}

fn parse_side_to_move(field: &str, mode: LoadMode) -> Result<Color> {
    match (field, mode) {
        ("b", _) => Ok(Color::Black),
        ("w", _) | (_, LoadMode::Lenient) => Ok(Color::White),
        (other, LoadMode::Strict) => Err(malformed(format!("bad side to move '{other}'"))),
    }
}

fn parse_castling(field: &str, mode: LoadMode) -> Result<CastlingRights> {
    if mode == LoadMode::Strict && field != "-" && !field.chars().all(|c| "KQkq".contains(c)) {
        return Err(malformed(format!("bad castling field '{field}'")));
    }

    let mut rights = CastlingRights::NONE;
    for (letter, color, side) in [
        ('K', Color::White, CastleSide::King),
        ('Q', Color::White, CastleSide::Queen),
        ('k', Color::Black, CastleSide::King),
        ('q', Color::Black, CastleSide::Queen),
    ] {
        if field.contains(letter) {
            rights.set(color, side);
        }
    }
    Ok(rights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceKind;

    #[test]
    fn test_start_fen_matches_new() {
        assert_eq!(load(START_FEN).unwrap(), Position::new());
    }

    #[test]
    fn test_fields() {
        let position = load("4k3/8/8/3pP3/8/8/8/4K2R b Kq d6 3 42").unwrap();
        assert_eq!(position.side_to_move, Color::Black);
        assert!(position.castling_rights.has(Color::White, CastleSide::King));
        assert!(!position.castling_rights.has(Color::White, CastleSide::Queen));
        assert!(!position.castling_rights.has(Color::Black, CastleSide::King));
        assert!(position.castling_rights.has(Color::Black, CastleSide::Queen));
        assert_eq!(position.en_passant_square, Some("d6".parse().unwrap()));
        assert_eq!(position.halfmove_clock, 3);
        assert_eq!(position.fullmove_number, 42);
        assert!(position
            .piece_at("e5".parse().unwrap())
            .is(Color::White, PieceKind::Pawn));
        assert!(position
            .piece_at("h1".parse().unwrap())
            .is(Color::White, PieceKind::Rook));
    }

    #[test]
    fn test_strict_rejects_unknown_piece() {
        let err = load("rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap_err();
        assert!(matches!(err, ChessError::MalformedPosition(_)));
    }

    #[test]
    fn test_lenient_degrades_unknown_piece() {
        let position = load_with(
            "rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            LoadMode::Lenient,
        )
        .unwrap();
        assert_eq!(position.piece_at("e7".parse().unwrap()), Occupant::Invalid('x'));
        assert!(position
            .piece_at("f7".parse().unwrap())
            .is(Color::Black, PieceKind::Pawn));
    }

    #[test]
    fn test_lenient_side_to_move() {
        let position = load_with("4k3/8/8/8/8/8/8/4K3 x - - 0 1", LoadMode::Lenient).unwrap();
        assert_eq!(position.side_to_move, Color::White);
        assert!(load("4k3/8/8/8/8/8/8/4K3 x - - 0 1").is_err());
    }

    #[test]
    fn test_structural_errors() {
        for bad in [
            "",
            "4k3/8/8/8/8/8/8/4K3 w - - 0",
            "4k3/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K4 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K2 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - z9 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - - x 1",
            "4k3/8/8/8/8/8/8/4K3 w - - 0 -1",
            "4k3/8/8/8/8/8/8/4K3 w KX - 0 1",
        ] {
            assert!(
                matches!(load(bad), Err(ChessError::MalformedPosition(_))),
                "accepted {bad:?}"
            );
        }
        // Structure errors are not softened by lenient mode.
        assert!(load_with("4k3/8/8/8/8/8/8/4K4 w - - 0 1", LoadMode::Lenient).is_err());
    }
}
