use shakmaty::{Chess, Color, Position, Role};

use crate::pst::{self, PIECE_VALUE, TABLE};
use crate::rules::Game;
use crate::types::{Score, SCORE_MATE};

const MOBILITY_WEIGHT: Score = 5;

/// Full static evaluation: material, piece-square tables, mobility and mate/stalemate.
/// Computed in White terms, then negated when `perspective` is Black.
pub fn evaluate(game: &Game, perspective: Color) -> Score {
    let legal = game.legal_moves().len();
    orient(white_score(game.position(), legal), perspective)
}

/// Same as [`evaluate`] in White terms, for callers that already generated the legal moves.
pub(crate) fn white_score(pos: &Chess, legal_move_count: usize) -> Score {
    if legal_move_count == 0 {
        // Side to move is mated, or stalemated
        return if pos.is_check() {
            match pos.turn() {
                Color::White => -SCORE_MATE,
                Color::Black => SCORE_MATE,
            }
        } else {
            0
        };
    }

    let mut score = placement(pos);

    // Only the side to move's mobility is counted
    let mobility = MOBILITY_WEIGHT * legal_move_count as Score;
    score += match pos.turn() {
        Color::White => mobility,
        Color::Black => -mobility,
    };

    score
}

/// Material plus piece-square bonuses, White minus Black.
fn placement(pos: &Chess) -> Score {
    let board = pos.board();
    let mut score = 0;

    for role in Role::ALL {
        let idx = pst::role_index(role);
        let of_role = board.by_role(role);

        for sq in board.white() & of_role {
            score += PIECE_VALUE[idx] + TABLE[idx][sq as usize];
        }
        for sq in board.black() & of_role {
            score -= PIECE_VALUE[idx] + TABLE[idx][sq.flip_vertical() as usize];
        }
    }

    score
}

/// Net material balance from the side to move's point of view.
/// No positional, mobility or terminal terms.
pub fn material(game: &Game) -> Score {
    material_balance(game.position())
}

pub(crate) fn material_balance(pos: &Chess) -> Score {
    let board = pos.board();
    let mut white_minus_black = 0;

    for role in Role::ALL {
        let value = PIECE_VALUE[pst::role_index(role)];
        let of_role = board.by_role(role);
        let diff = (board.white() & of_role).count() as Score
            - (board.black() & of_role).count() as Score;
        white_minus_black += value * diff;
    }

    orient(white_minus_black, pos.turn())
}

fn orient(white_score: Score, perspective: Color) -> Score {
    match perspective {
        Color::White => white_score,
        Color::Black => -white_score,
    }
}


// Tables are authored from White's side w/ a1 = index 0. A black piece on square `sq` reads the
// entry for `sq.flip_vertical()`, ie. the same square seen from Black's back rank
