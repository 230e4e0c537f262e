use log::{debug, info};
use shakmaty::Color;

use crate::error::{EngineError, EngineResult};
use crate::evaluation::{evaluate, material};
use crate::rules::{uci, Game};
use crate::types::{Score, SearchResult, MAX_DEPTH, SCORE_INFINITY};

/// A search implementation the move selector can delegate to.
///
/// Implementations share one contract: minimax with alpha-beta over the oracle's native move
/// order, White-positive scores, and `game` left exactly as it was passed in.
pub trait SearchBackend {
    fn name(&self) -> &'static str;

    fn search(&mut self, game: &mut Game, depth: u8) -> SearchResult;
}

/// Portable backend: apply/undo on a single `Game`.
#[derive(Default)]
pub struct ReferenceSearch;

impl SearchBackend for ReferenceSearch {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn search(&mut self, game: &mut Game, depth: u8) -> SearchResult {
        search(game, depth)
    }
}

#[cfg(feature = "accelerated")]
fn accelerated_backend() -> Option<Box<dyn SearchBackend>> {
    Some(Box::new(crate::accelerated::AcceleratedSearch))
}

#[cfg(not(feature = "accelerated"))]
fn accelerated_backend() -> Option<Box<dyn SearchBackend>> {
    None
}

/// Picks the backend once. The accelerated one wins whenever it was compiled in,
/// unless the caller asks for the reference implementation.
pub fn detect_backend(prefer_reference: bool) -> Box<dyn SearchBackend> {
    let backend = match accelerated_backend() {
        Some(fast) if !prefer_reference => fast,
        _ => Box::new(ReferenceSearch),
    };
    info!("search backend: {}", backend.name());
    backend
}

pub fn validate_depth(depth: u32) -> EngineResult<u8> {
    if depth == 0 || depth > MAX_DEPTH as u32 {
        return Err(EngineError::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(depth as u8)
}

/// Root minimax search with a full window, maximizing when White is to move.
pub fn search(game: &mut Game, depth: u8) -> SearchResult {
    let maximizing = game.side_to_move() == Color::White;
    let result = minimax(game, depth, -SCORE_INFINITY, SCORE_INFINITY, maximizing);
    log_result("minimax", depth, &result);
    result
}

/// Root negamax search with a full window. Score is relative to the side to move.
pub fn search_negamax(game: &mut Game, depth: u8) -> SearchResult {
    let result = negamax(game, depth, -SCORE_INFINITY, SCORE_INFINITY);
    log_result("negamax", depth, &result);
    result
}

fn log_result(kind: &str, depth: u8, result: &SearchResult) {
    debug!(
        "{} depth {} score {} nodes {} best {}",
        kind,
        depth,
        result.score,
        result.nodes,
        result.best_move.as_ref().map_or_else(|| "none".to_string(), uci)
    );
}

/// Minimax with alpha-beta pruning. Scores are White-positive.
pub fn minimax(
    game: &mut Game,
    depth: u8,
    mut alpha: Score,
    mut beta: Score,
    maximizing: bool,
) -> SearchResult {
    if depth == 0 || game.is_terminal() {
        return SearchResult::leaf(evaluate(game, Color::White));
    }

    let mut nodes = 1;
    let mut best_move = None;
    let mut best_score = if maximizing {
        -SCORE_INFINITY
    } else {
        SCORE_INFINITY
    };

    for mv in game.legal_moves() {
        let child = {
            let mut next = game.play_scoped(&mv);
            minimax(&mut next, depth - 1, alpha, beta, !maximizing)
        };
        nodes += child.nodes;

        if maximizing {
            if child.score > best_score {
                best_score = child.score;
                best_move = Some(mv);
            }
            alpha = alpha.max(child.score);
        } else {
            if child.score < best_score {
                best_score = child.score;
                best_move = Some(mv);
            }
            beta = beta.min(child.score);
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

/// Negamax with alpha-beta pruning over the material-only evaluator.
pub fn negamax(game: &mut Game, depth: u8, mut alpha: Score, beta: Score) -> SearchResult {
    if depth == 0 || game.is_terminal() {
        return SearchResult::leaf(material(game));
    }

    let mut nodes = 1;
    let mut best_move = None;
    let mut best_score = -SCORE_INFINITY;

    for mv in game.legal_moves() {
        let child = {
            let mut next = game.play_scoped(&mv);
            negamax(&mut next, depth - 1, -beta, -alpha)
        };
        nodes += child.nodes;
        let score = -child.score;

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        alpha = alpha.max(score);

        if alpha >= beta {
            break;
        }
    }

    SearchResult {
        best_move,
        score: best_score,
        nodes,
    }
}


// Minimax keeps two loops (max and min side) w/ scores always in White terms. Negamax folds both
// into one loop by negating the child score, so its scores are relative to whoever is to move.
// Both prune on the same condition: once alpha meets beta, no remaining sibling can change the
// parent's choice
