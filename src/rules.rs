//! Adapter over `shakmaty` exposing the rules surface the engine consumes.
//!
//! `shakmaty` positions have no undo, so `Game` keeps a stack of snapshots.
//! Every `apply` pushes one and every `undo` pops one. Searches should prefer
//! [`Game::play_scoped`], whose guard rewinds on every exit path.

use std::fmt;
use std::ops::{Deref, DerefMut};

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    Bitboard, CastlingMode, Chess, Color, EnPassantMode, File, Move, MoveList, Piece, Position,
    Rank, Role, Square,
};

use crate::error::{EngineError, EngineResult};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoardStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

#[derive(Clone, Debug)]
struct Snapshot {
    pos: Chess,
    hash: Zobrist64,
    mv: Move,
}

/// A position plus the line of moves that led to it.
#[derive(Clone, Debug)]
pub struct Game {
    pos: Chess,
    hash: Zobrist64,
    stack: Vec<Snapshot>,
}

impl Default for Game {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl Game {
    pub fn from_position(pos: Chess) -> Self {
        let hash = pos.zobrist_hash(EnPassantMode::Legal);
        Self {
            pos,
            hash,
            stack: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidFen {
            fen: fen.to_string(),
        };
        let parsed: Fen = fen.trim().parse().map_err(|_| invalid())?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|_| invalid())?;
        Ok(Self::from_position(pos))
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    /// Exact position key: FEN with the en passant square only when a capture is legal.
    pub fn key(&self) -> String {
        position_key(&self.pos)
    }

    pub fn side_to_move(&self) -> Color {
        self.pos.turn()
    }

    pub fn legal_moves(&self) -> MoveList {
        self.pos.legal_moves()
    }

    pub fn pieces(&self, role: Role, color: Color) -> Bitboard {
        let board = self.pos.board();
        board.by_color(color) & board.by_role(role)
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.pos.board().piece_at(sq)
    }

    /// Number of moves applied since this game was created.
    pub fn ply_count(&self) -> usize {
        self.stack.len()
    }

    /// Plays `mv` without legality checks. Callers pass moves from `legal_moves`.
    pub fn apply(&mut self, mv: &Move) {
        let prev = self.pos.clone();
        self.pos.play_unchecked(mv);
        let hash = self.pos.zobrist_hash(EnPassantMode::Legal);
        self.stack.push(Snapshot {
            pos: prev,
            hash: std::mem::replace(&mut self.hash, hash),
            mv: mv.clone(),
        });
    }

    /// Reverts the most recent `apply`, returning the move that was taken back.
    pub fn undo(&mut self) -> Option<Move> {
        let snap = self.stack.pop()?;
        self.pos = snap.pos;
        self.hash = snap.hash;
        Some(snap.mv)
    }

    fn rewind_to(&mut self, len: usize) {
        while self.stack.len() > len {
            self.undo();
        }
    }

    /// Applies `mv` and returns a guard that restores the current position on drop.
    pub fn play_scoped(&mut self, mv: &Move) -> Applied<'_> {
        let restore_len = self.stack.len();
        self.apply(mv);
        Applied {
            game: self,
            restore_len,
        }
    }

    /// Parses a UCI move and checks it against the current position.
    pub fn parse_uci(&self, text: &str) -> EngineResult<Move> {
        let uci: UciMove = text.trim().parse().map_err(|_| EngineError::InvalidMove {
            notation: text.to_string(),
        })?;
        uci.to_move(&self.pos).map_err(|_| EngineError::IllegalMove {
            notation: text.to_string(),
        })
    }

    /// Parses and plays a UCI move. The game is untouched on error.
    pub fn play_uci(&mut self, text: &str) -> EngineResult<Move> {
        let mv = self.parse_uci(text)?;
        self.apply(&mv);
        Ok(mv)
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.pos.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.pos.is_insufficient_material()
    }

    /// 150 half-moves without capture or pawn move, unless the last one mated.
    pub fn is_seventyfive_move_rule(&self) -> bool {
        self.pos.halfmoves() >= 150 && !self.pos.legal_moves().is_empty()
    }

    /// Current position has occurred five times since the last irreversible move.
    pub fn is_fivefold_repetition(&self) -> bool {
        let window = (self.pos.halfmoves() as usize).min(self.stack.len());
        let earlier = self.stack[self.stack.len() - window..]
            .iter()
            .filter(|snap| snap.hash == self.hash)
            .count();
        earlier + 1 >= 5
    }

    pub fn status(&self) -> BoardStatus {
        if self.is_checkmate() {
            BoardStatus::Checkmate
        } else if self.is_stalemate() {
            BoardStatus::Stalemate
        } else if self.is_insufficient_material() {
            BoardStatus::InsufficientMaterial
        } else if self.is_seventyfive_move_rule() {
            BoardStatus::SeventyFiveMoves
        } else if self.is_fivefold_repetition() {
            BoardStatus::FivefoldRepetition
        } else {
            BoardStatus::Ongoing
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status() != BoardStatus::Ongoing
    }

    /// Game result in PGN notation, `*` while the game is still running.
    pub fn result(&self) -> &'static str {
        match self.status() {
            BoardStatus::Ongoing => "*",
            BoardStatus::Checkmate => match self.side_to_move() {
                Color::White => "0-1",
                Color::Black => "1-0",
            },
            _ => "1/2-1/2",
        }
    }

    /// Repetition hashes from the root of this game up to the current position.
    pub(crate) fn hash_line(&self) -> Vec<Zobrist64> {
        let mut line: Vec<Zobrist64> = self.stack.iter().map(|snap| snap.hash).collect();
        line.push(self.hash);
        line
    }
}

/// Scoped application of one move. Dropping it restores the position it was created from.
pub struct Applied<'a> {
    game: &'a mut Game,
    restore_len: usize,
}

impl Deref for Applied<'_> {
    type Target = Game;

    fn deref(&self) -> &Game {
        self.game
    }
}

impl DerefMut for Applied<'_> {
    fn deref_mut(&mut self) -> &mut Game {
        self.game
    }
}

impl Drop for Applied<'_> {
    fn drop(&mut self) {
        self.game.rewind_to(self.restore_len);
    }
}

pub fn position_key(pos: &Chess) -> String {
    Fen::from_setup(pos.clone().into_setup(EnPassantMode::Legal)).to_string()
}

/// UCI coordinate form of a move, castling written as the king's move.
pub fn uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::ALL.into_iter().rev() {
            let row: Vec<String> = File::ALL
                .into_iter()
                .map(|file| match self.piece_at(Square::from_coords(file, rank)) {
                    Some(piece) => piece.char().to_string(),
                    None => ".".to_string(),
                })
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_startpos_key() {
        assert_eq!(Game::default().key(), START_FEN);
    }

    #[test]
    fn test_key_omits_unusable_en_passant() {
        let mut game = Game::default();
        game.play_uci("e2e4").unwrap();
        // No black pawn can capture on e3, so the square is not part of the key
        assert_eq!(
            game.key(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_key_keeps_legal_en_passant() {
        let mut game =
            Game::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3").unwrap();
        game.play_uci("c2c4").unwrap();
        assert!(game.key().contains(" c3 "), "key was {}", game.key());
    }

    #[test]
    fn test_apply_undo_restores_key() {
        let mut game = Game::default();
        let before = game.key();
        let mv = game.parse_uci("g1f3").unwrap();
        game.apply(&mv);
        assert_ne!(game.key(), before);
        assert_eq!(game.undo(), Some(mv));
        assert_eq!(game.key(), before);
        assert_eq!(game.undo(), None);
    }

    #[test]
    fn test_scoped_guard_rewinds() {
        let mut game = Game::default();
        let before = game.key();
        let mv = game.parse_uci("e2e4").unwrap();
        {
            let mut child = game.play_scoped(&mv);
            // Nested application inside the guard is also taken back
            child.play_uci("e7e5").unwrap();
            assert_eq!(child.ply_count(), 2);
        }
        assert_eq!(game.key(), before);
        assert_eq!(game.ply_count(), 0);
    }

    #[test]
    fn test_invalid_vs_illegal_move() {
        let mut game = Game::default();
        assert!(matches!(
            game.play_uci("hello"),
            Err(EngineError::InvalidMove { .. })
        ));
        assert!(matches!(
            game.play_uci("e2e5"),
            Err(EngineError::IllegalMove { .. })
        ));
        assert_eq!(game.key(), START_FEN);
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = game.parse_uci("e1g1").unwrap();
        assert_eq!(uci(&mv), "e1g1");
    }

    #[test]
    fn test_checkmate_and_result() {
        let game =
            Game::from_fen("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(game.is_checkmate());
        assert!(game.is_terminal());
        assert_eq!(game.status(), BoardStatus::Checkmate);
        assert_eq!(game.result(), "0-1");
    }

    #[test]
    fn test_stalemate() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(game.is_stalemate());
        assert_eq!(game.result(), "1/2-1/2");
    }

    #[test]
    fn test_insufficient_material() {
        let game = Game::from_fen("8/8/4k3/8/8/3K4/8/8 w - - 0 1").unwrap();
        assert_eq!(game.status(), BoardStatus::InsufficientMaterial);
    }

    #[test]
    fn test_seventyfive_move_rule() {
        let game = Game::from_fen("4k3/8/8/8/8/8/4P3/4K2R w - - 150 120").unwrap();
        assert!(game.is_seventyfive_move_rule());
        assert_eq!(game.status(), BoardStatus::SeventyFiveMoves);
    }

    #[test]
    fn test_fivefold_repetition() {
        let mut game = Game::default();
        for _ in 0..4 {
            for mv in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                assert!(!game.is_fivefold_repetition());
                game.play_uci(mv).unwrap();
            }
        }
        assert!(game.is_fivefold_repetition());
        assert_eq!(game.result(), "1/2-1/2");
    }

    #[test]
    fn test_pieces_and_piece_at() {
        let game = Game::default();
        assert_eq!(game.pieces(Role::Pawn, Color::White).count(), 8);
        assert_eq!(game.pieces(Role::Queen, Color::Black).count(), 1);
        assert_eq!(
            game.piece_at(Square::E1),
            Some(Piece {
                color: Color::White,
                role: Role::King
            })
        );
        assert_eq!(game.piece_at(Square::E4), None);
    }

    #[test]
    fn test_display_board() {
        let text = Game::default().to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "r n b q k b n r");
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn test_invalid_fen() {
        assert!(matches!(
            Game::from_fen("not a fen"),
            Err(EngineError::InvalidFen { .. })
        ));
    }
}

// Snapshots store the whole previous position (a few hundred bytes) rather than a diff, so undo
// is a plain assignment. The Zobrist key rides along in the snapshot for repetition checks
