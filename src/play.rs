//! Text front end: a human against the engine, or the engine against itself.

use std::io::{self, BufRead, Write};

use log::info;
use shakmaty::Color;

use crate::error::EngineError;
use crate::rules::{uci, BoardStatus, Game};
use crate::selector::{MoveSelector, MoveSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayOptions {
    pub depth: u8,
    /// Side the human plays; `None` lets the engine play both sides
    pub human: Option<Color>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Finished(BoardStatus),
    Quit,
    /// The engine found nothing to play in a running game
    NoMove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub outcome: Outcome,
    pub moves_played: usize,
    pub result: &'static str,
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Quit,
    Board,
    Move(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    match line.to_ascii_lowercase().as_str() {
        "quit" | "exit" => Command::Quit,
        "d" | "board" => Command::Board,
        _ => Command::Move(line),
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Announcement for a finished game, `None` while it is still running.
pub fn game_over_message(game: &Game) -> Option<String> {
    let message = match game.status() {
        BoardStatus::Ongoing => return None,
        BoardStatus::Checkmate => {
            format!("{} wins by checkmate!", color_name(game.side_to_move().other()))
        }
        BoardStatus::Stalemate => "Draw by stalemate!".to_string(),
        BoardStatus::InsufficientMaterial => "Draw: insufficient material!".to_string(),
        BoardStatus::SeventyFiveMoves => "Draw: 75-move rule!".to_string(),
        BoardStatus::FivefoldRepetition => "Draw: fivefold repetition!".to_string(),
    };
    Some(message)
}

fn source_label(source: MoveSource) -> &'static str {
    match source {
        MoveSource::Book => "book",
        MoveSource::Cache => "cache",
        MoveSource::Search => "search",
    }
}

/// Runs one game to completion, reading human moves from `input`.
/// End of input counts as `quit`.
pub fn run<R, W>(
    game: &mut Game,
    selector: &mut MoveSelector,
    opts: PlayOptions,
    mut input: R,
    out: &mut W,
) -> io::Result<Summary>
where
    R: BufRead,
    W: Write,
{
    let start_ply = game.ply_count();
    writeln!(
        out,
        "Welcome to MoonBot! Enter moves in UCI format (e.g. e2e4). Type 'quit' to exit."
    )?;
    writeln!(
        out,
        "Playing as: {} | Depth: {} | Bot vs Bot: {}",
        opts.human.map_or("nobody", color_name),
        opts.depth,
        opts.human.is_none()
    )?;
    writeln!(out, "{}", game)?;

    let mut line = String::new();
    let outcome = loop {
        if let Some(message) = game_over_message(game) {
            writeln!(out, "{}", message)?;
            break Outcome::Finished(game.status());
        }

        let mover = game.side_to_move();
        if opts.human != Some(mover) {
            let Some(selection) = selector.select_move(game, opts.depth) else {
                writeln!(out, "MoonBot could not find a move.")?;
                break Outcome::NoMove;
            };
            writeln!(
                out,
                "MoonBot ({}) plays: {} [{}]",
                color_name(mover),
                uci(&selection.mv),
                source_label(selection.source)
            )?;
            game.apply(&selection.mv);
            writeln!(out, "{}", game)?;
            continue;
        }

        write!(out, "Your move: ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break Outcome::Quit;
        }
        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => break Outcome::Quit,
            Command::Board => writeln!(out, "{}", game)?,
            Command::Move(text) => match game.play_uci(text) {
                Ok(_) => writeln!(out, "{}", game)?,
                Err(EngineError::IllegalMove { .. }) => writeln!(out, "Illegal move.")?,
                Err(_) => writeln!(out, "Invalid move format.")?,
            },
        }
    };

    let moves_played = game.ply_count() - start_ply;
    writeln!(out, "Game over! {} moves played, result {}.", moves_played, game.result())?;
    info!("game finished: {:?} after {} moves", outcome, moves_played);

    Ok(Summary {
        outcome,
        moves_played,
        result: game.result(),
    })
}
