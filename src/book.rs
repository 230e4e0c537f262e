use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use shakmaty::san::SanPlus;
use shakmaty::Move;

use crate::error::{EngineError, EngineResult};
use crate::pgn::{self, PgnGame};
use crate::rules::Game;

/// Short built-in repertoire in UCI form.
pub const BUILTIN_LINES: &[&[&str]] = &[
    &["e2e4", "e7e5", "g1f3", "b8c6"], // King's Knight Opening
    &["e2e4", "c7c5"],                 // Sicilian Defence
    &["e2e4", "e7e6"],                 // French Defence
    &["e2e4", "c7c6"],                 // Caro-Kann
    &["e2e4", "d7d6"],                 // Pirc Defence
    &["d2d4", "d7d5", "c2c4"],         // Queen's Gambit
    &["d2d4", "g8f6"],                 // Indian Defence
    &["d2d4", "d7d5", "c2c4", "e7e6"], // Queen's Gambit Declined
    &["d2d4", "d7d5", "c2c4", "c7c6"], // Slav Defence
    &["c2c4"],                         // English
    &["g1f3"],                         // Reti
];

/// Exact-position opening book. The first game to reach a position decides its move.
#[derive(Clone, Debug, Default)]
pub struct OpeningBook {
    entries: HashMap<String, Move>,
}

impl OpeningBook {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replays `moves` from `start`, recording each position that is not booked yet.
    /// Stops at the first move that is not legal where it is played.
    pub fn ingest<I>(&mut self, start: Game, moves: I) -> usize
    where
        I: IntoIterator<Item = Move>,
    {
        let mut game = start;
        let mut played = 0;
        for mv in moves {
            if !game.legal_moves().contains(&mv) {
                break;
            }
            self.entries.entry(game.key()).or_insert_with(|| mv.clone());
            game.apply(&mv);
            played += 1;
        }
        played
    }

    /// Builds a book from a sequence of games, each a start position plus its moves.
    pub fn from_games<I, M>(games: I) -> Self
    where
        I: IntoIterator<Item = (Game, M)>,
        M: IntoIterator<Item = Move>,
    {
        let mut book = Self::empty();
        for (start, moves) in games {
            book.ingest(start, moves);
        }
        book
    }

    /// Builds a book from lines of UCI moves played from the initial position.
    pub fn from_uci_lines(lines: &[&[&str]]) -> EngineResult<Self> {
        let mut book = Self::empty();
        for line in lines {
            let mut game = Game::default();
            let mut moves = Vec::with_capacity(line.len());
            for text in *line {
                moves.push(game.play_uci(text)?);
            }
            book.ingest(Game::default(), moves);
        }
        Ok(book)
    }

    pub fn builtin() -> Self {
        // Every built-in line is legal from the initial position
        Self::from_uci_lines(BUILTIN_LINES).unwrap_or_default()
    }

    /// Builds a book from PGN text. Unparsable or illegal moves truncate their game.
    pub fn from_pgn(text: &str) -> Self {
        let mut book = Self::empty();
        for (idx, record) in pgn::read_games(text).iter().enumerate() {
            match replay(record) {
                Ok((start, moves)) => {
                    book.ingest(start, moves);
                }
                Err(err) => warn!("skipping game {} of opening corpus: {}", idx + 1, err),
            }
        }
        book
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let book = Self::from_pgn(&text);
        info!(
            "opening book {}: {} positions",
            path.display(),
            book.len()
        );
        Ok(book)
    }

    /// Like [`OpeningBook::load`], but a missing or unreadable corpus yields an empty book.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(book) => book,
            Err(err) => {
                warn!("opening book not loaded, continuing without it: {}", err);
                Self::empty()
            }
        }
    }

    pub fn lookup(&self, game: &Game) -> Option<Move> {
        self.entries.get(&game.key()).cloned()
    }
}

/// Resolves a PGN record's SAN tokens against its start position.
fn replay(record: &PgnGame) -> EngineResult<(Game, Vec<Move>)> {
    let start = match record.start_fen() {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::default(),
    };

    let mut game = start.clone();
    let mut moves = Vec::with_capacity(record.moves.len());
    for token in &record.moves {
        let parsed = token
            .parse::<SanPlus>()
            .ok()
            .and_then(|san| san.san.to_move(game.position()).ok());
        let Some(mv) = parsed else {
            warn!("unplayable move {} after {} plies, truncating game", token, moves.len());
            break;
        };
        game.apply(&mv);
        moves.push(mv);
    }
    Ok((start, moves))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::uci;

    #[test]
    fn test_empty_book_misses() {
        let book = OpeningBook::empty();
        assert!(book.is_empty());
        assert_eq!(book.lookup(&Game::default()), None);
    }

    #[test]
    fn test_first_game_wins() {
        let book = OpeningBook::from_uci_lines(&[&["e2e4", "e7e5"], &["e2e4", "c7c5"], &["d2d4"]])
            .unwrap();
        assert_eq!(uci(&book.lookup(&Game::default()).unwrap()), "e2e4");

        let mut game = Game::default();
        game.play_uci("e2e4").unwrap();
        assert_eq!(uci(&book.lookup(&game).unwrap()), "e7e5");

        game.play_uci("e7e5").unwrap();
        assert_eq!(book.lookup(&game), None);
    }

    #[test]
    fn test_builtin_book() {
        let book = OpeningBook::builtin();
        assert_eq!(uci(&book.lookup(&Game::default()).unwrap()), "e2e4");

        let mut game = Game::default();
        game.play_uci("d2d4").unwrap();
        game.play_uci("d7d5").unwrap();
        assert_eq!(uci(&book.lookup(&game).unwrap()), "c2c4");
    }

    #[test]
    fn test_from_pgn_with_transposition() {
        // Both games reach the same position after four plies; the first one's continuation sticks
        let text = "1. d4 Nf6 2. Nf3 d5 3. c4 *\n\n1. Nf3 Nf6 2. d4 d5 3. Bf4 *";
        let book = OpeningBook::from_pgn(text);

        let mut game = Game::default();
        for mv in ["g1f3", "g8f6", "d2d4", "d7d5"] {
            game.play_uci(mv).unwrap();
        }
        assert_eq!(uci(&book.lookup(&game).unwrap()), "c2c4");
        // The second game still books the positions only it visited
        let mut game = Game::default();
        game.play_uci("g1f3").unwrap();
        assert_eq!(uci(&book.lookup(&game).unwrap()), "g8f6");
    }

    #[test]
    fn test_from_pgn_truncates_at_illegal_move() {
        let book = OpeningBook::from_pgn("1. e4 e5 2. Ke3 Nc6 *");
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_from_pgn_with_fen_start() {
        let text = "[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n1. e4 Kd7 *";
        let book = OpeningBook::from_pgn(text);
        let game = Game::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(uci(&book.lookup(&game).unwrap()), "e2e4");
    }

    #[test]
    fn test_ingest_stops_at_illegal_move() {
        let mut game = Game::default();
        let e4 = game.play_uci("e2e4").unwrap();
        let mut book = OpeningBook::empty();
        // e2e4 twice in a row is not legal for black
        let played = book.ingest(Game::default(), vec![e4.clone(), e4]);
        assert_eq!(played, 1);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let book = OpeningBook::load_or_empty(Path::new("/nonexistent/openings.pgn"));
        assert!(book.is_empty());
        assert!(matches!(
            OpeningBook::load(Path::new("/nonexistent/openings.pgn")),
            Err(EngineError::Io { .. })
        ));
    }
}
