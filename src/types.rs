use std::path::PathBuf;

use shakmaty::Move;

pub type Score = i32;

/// Window bound for the root search. Wider than any attainable score.
pub const SCORE_INFINITY: Score = 100_000;
pub const SCORE_MATE: Score = 99_999;
pub const MAX_DEPTH: u8 = 18;
pub const DEFAULT_DEPTH: u8 = 3;
pub const DEFAULT_MAX_POSITIONS: usize = 100_000;
pub const DEFAULT_BOOK_PATH: &str = "openings.pgn";
pub const DEFAULT_CACHE_PATH: &str = "move_sim_cache.json";

pub struct EngineConfig {
    pub depth: u8,
    pub book_path: PathBuf,
    pub builtin_book: bool,
    pub cache_path: PathBuf,
    pub max_positions: usize,
    pub prefer_reference: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            book_path: PathBuf::from(DEFAULT_BOOK_PATH),
            builtin_book: false,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            max_positions: DEFAULT_MAX_POSITIONS,
            prefer_reference: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: Score,
    pub nodes: u64,
}

impl SearchResult {
    pub fn leaf(score: Score) -> Self {
        Self {
            best_move: None,
            score,
            nodes: 1,
        }
    }
}
