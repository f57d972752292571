use anyhow::Result;
use chess_rules::fen::{LoadMode, START_FEN};
use chess_rules::session::Session;
use clap::{arg, command};
use std::io;

fn main() -> Result<()> {
    let matches = command!()
        .arg(arg!(-f --fen <FEN> "Starting position").default_value(START_FEN))
        .arg(arg!(-l --lenient "Load unknown piece letters as blocked squares"))
        .arg(arg!(-u --unicode "Draw the board with chess glyphs"))
        .get_matches();

    let fen = matches
        .get_one::<String>("fen")
        .map(String::as_str)
        .unwrap_or(START_FEN);
    let mode = if matches.get_flag("lenient") {
        LoadMode::Lenient
    } else {
        LoadMode::Strict
    };

    let mut session = Session::from_fen(fen, mode)?.with_unicode(matches.get_flag("unicode"));
    print!("{}", session.handle_command("board")?);

    let stdin = io::stdin();
    session.run(stdin.lock(), io::stdout())
}
