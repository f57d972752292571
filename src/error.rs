use crate::board::Square;

/// Everything the rules engine can reject.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("malformed position: {0}")]
    MalformedPosition(String),

    #[error("invalid move input: {0}")]
    InvalidMoveInput(String),

    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Square, to: Square },
}

pub type Result<T> = std::result::Result<T, ChessError>;
