pub mod board;
pub mod error;
pub mod fen;
pub mod movegen;
pub mod session;
