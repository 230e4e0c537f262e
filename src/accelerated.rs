//! Copy-make search backend.
//!
//! Produces the same scores, moves and node counts as the reference minimax. Each node
//! generates its legal moves once and reuses them for terminal detection, the mobility term
//! and child enumeration, instead of going back to the oracle for each query.

use arrayvec::ArrayVec;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, Color, EnPassantMode, MoveList, Position};

use crate::evaluation::white_score;
use crate::rules::Game;
use crate::search::SearchBackend;
use crate::types::{Score, SearchResult, SCORE_INFINITY};

const LINE_CAPACITY: usize = 512;
// A root with 150 or more reversible half-moves is already drawn, so a longer tail never matters
const SEED_LIMIT: usize = 160;

type HashLine = ArrayVec<Zobrist64, LINE_CAPACITY>;

#[derive(Default)]
pub struct AcceleratedSearch;

impl SearchBackend for AcceleratedSearch {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn search(&mut self, game: &mut Game, depth: u8) -> SearchResult {
        let full = game.hash_line();
        let keep = (game.position().halfmoves() as usize + 1)
            .min(full.len())
            .min(SEED_LIMIT);
        let mut line: HashLine = full[full.len() - keep..].iter().copied().collect();

        let maximizing = game.side_to_move() == Color::White;
        minimax(
            game.position(),
            &mut line,
            depth,
            -SCORE_INFINITY,
            SCORE_INFINITY,
            maximizing,
        )
    }
}

fn minimax(
    pos: &Chess,
    line: &mut HashLine,
    depth: u8,
    mut alpha: Score,
    mut beta: Score,
    maximizing: bool,
) -> SearchResult {
    let moves = pos.legal_moves();
    if depth == 0 || is_terminal(pos, &moves, line) {
        return SearchResult::leaf(white_score(pos, moves.len()));
    }

    let mut nodes = 1;
    let mut best_move = None;
    let mut best_score = if maximizing {
        -SCORE_INFINITY
    } else {
        SCORE_INFINITY
    };

    for mv in moves {
        let mut child = pos.clone();
        child.play_unchecked(&mv);
        line.push(child.zobrist_hash(EnPassantMode::Legal));
        let result = minimax(&child, line, depth - 1, alpha, beta, !maximizing);
        line.pop();
        nodes += result.nodes;

        if maximizing {
            if result.score > best_score {
                best_score = result.score;
                best_move = Some(mv);
            }
            alpha = alpha.max(result.score);
        } else {
            if result.score < best_score {
                best_score = result.score;
                best_move = Some(mv);
            }
            beta = beta.min(result.score);
        }

        if beta <= alpha {
            break;
        }
    }

    SearchResult {
        best_move,
        score: best_score,
        nodes,
    }
}

fn is_terminal(pos: &Chess, moves: &MoveList, line: &[Zobrist64]) -> bool {
    moves.is_empty()
        || pos.is_insufficient_material()
        || pos.halfmoves() >= 150
        || is_fivefold(pos, line)
}

fn is_fivefold(pos: &Chess, line: &[Zobrist64]) -> bool {
    let Some((current, earlier)) = line.split_last() else {
        return false;
    };
    let window = (pos.halfmoves() as usize).min(earlier.len());
    let repeats = earlier[earlier.len() - window..]
        .iter()
        .filter(|hash| *hash == current)
        .count();
    repeats + 1 >= 5
}


// Copy-make: each child is a fresh clone of the parent position, so there is nothing to undo.
// Repetition still needs history, which lives in the hash line: one Zobrist key per ply, pushed
// on the way down and popped on the way up
