use crate::board::{Occupant, Position, Square};
use crate::error::ChessError;
use crate::fen::{self, LoadMode};
use crate::movegen::{GameState, Move, MoveGenerator};
use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};

const HELP: &str = "\
commands:
  <move>          play a move in coordinate form, e.g. e2e4 or e7e8n
  moves [square]  list legal moves, or legal destinations from a square
  board           show the board
  fen <fen>       load a position
  new             start a new game
  quit            leave
";

/// One game as seen by a front end: the position, what stands where, where
/// a piece may go, and whether the game has ended.
pub struct Session {
    position: Position,
    move_generator: MoveGenerator,
    state: GameState,
    mode: LoadMode,
    unicode: bool,
}

impl Session {
    pub fn new(position: Position) -> Self {
        let move_generator = MoveGenerator::new();
        let state = move_generator.get_game_state(&position);
        Session {
            position,
            move_generator,
            state,
            mode: LoadMode::Strict,
            unicode: false,
        }
    }

    pub fn from_fen(fen: &str, mode: LoadMode) -> std::result::Result<Self, ChessError> {
        let mut session = Session::new(fen::load_with(fen, mode)?);
        session.mode = mode;
        Ok(session)
    }

    pub fn with_unicode(mut self, unicode: bool) -> Self {
        self.unicode = unicode;
        self
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn piece_at(&self, square: Square) -> Occupant {
        self.position.piece_at(square)
    }

    pub fn destinations(&self, square: Square) -> Vec<Square> {
        self.move_generator.legal_destinations(&self.position, square)
    }

    /// Plays coordinate text such as `e2e4` or `a7a8n`.
    pub fn play(&mut self, text: &str) -> std::result::Result<GameState, ChessError> {
        let mv: Move = text.parse()?;
        self.state = self.move_generator.play(&mut self.position, mv)?;
        Ok(self.state)
    }

    pub fn load(&mut self, fen: &str) -> std::result::Result<(), ChessError> {
        *self = Session {
            unicode: self.unicode,
            ..Session::from_fen(fen, self.mode)?
        };
        Ok(())
    }

    fn status(&self) -> String {
        let side = self.position.side_to_move;
        match self.state {
            GameState::Ongoing if self.move_generator.is_in_check(&self.position, side) => {
                format!("{} to move, in check", side)
            }
            GameState::Ongoing => format!("{} to move", side),
            finished => finished.to_string(),
        }
    }

    fn render(&self) -> String {
        let board = if self.unicode {
            format!("{:#}", self.position)
        } else {
            self.position.to_string()
        };
        format!("{}{}\n", board, self.status())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok("".to_string());
        }

        match parts[0] {
            "help" => Ok(HELP.to_string()),
            "board" => Ok(self.render()),
            "new" => {
                self.position = Position::new();
                self.state = self.move_generator.get_game_state(&self.position);
                Ok(self.render())
            }
            "fen" => {
                let fen = parts[1..].join(" ");
                self.load(&fen).context("cannot load position")?;
                Ok(self.render())
            }
            "moves" => self.handle_moves(&parts[1..]),
            mv if parts.len() == 1 => {
                self.play(mv)
                    .with_context(|| format!("cannot play '{mv}'"))?;
                Ok(self.render())
            }
            other => bail!("unknown command '{other}'"),
        }
    }

    fn handle_moves(&self, parts: &[&str]) -> Result<String> {
        let listed: Vec<String> = match parts.first() {
            Some(square) => {
                let square: Square = square.parse()?;
                self.destinations(square)
                    .iter()
                    .map(Square::to_string)
                    .collect()
            }
            None => self
                .move_generator
                .generate_moves(&self.position)
                .iter()
                .map(Move::to_string)
                .collect(),
        };
        Ok(format!("{}\n", listed.join(" ")))
    }

    /// Reads commands line by line until `quit` or end of input. Command
    /// failures and undecodable lines are reported on stderr and the loop
    /// carries on; only I/O failures end it.
    pub fn run<R: BufRead, W: Write>(&mut self, mut reader: R, mut out: W) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let command = match std::str::from_utf8(&buf) {
                Ok(text) => text.trim(),
                Err(e) => {
                    eprintln!("error: input line is not UTF-8: {}", e);
                    continue;
                }
            };
            if command == "quit" {
                break;
            }
            match self.handle_command(command) {
                Ok(response) => write!(out, "{}", response)?,
                Err(e) => eprintln!("error: {:#}", e),
            }
            out.flush()?;
        }
        Ok(())
    }
}
