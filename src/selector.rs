use log::debug;
use shakmaty::Move;

use crate::book::OpeningBook;
use crate::cache::PositionCache;
use crate::rules::{uci, Game};
use crate::search::SearchBackend;
use crate::types::Score;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveSource {
    Book,
    Cache,
    Search,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub mv: Move,
    pub source: MoveSource,
    /// White-positive search score; book and cache hits carry none
    pub score: Option<Score>,
}

/// Chooses moves: opening book first, then the position cache, then a live search.
pub struct MoveSelector {
    book: OpeningBook,
    cache: PositionCache,
    backend: Box<dyn SearchBackend>,
}

impl MoveSelector {
    pub fn new(book: OpeningBook, cache: PositionCache, backend: Box<dyn SearchBackend>) -> Self {
        Self {
            book,
            cache,
            backend,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns `None` only when the side to move has no move to play.
    pub fn select_move(&mut self, game: &mut Game, depth: u8) -> Option<Selection> {
        if let Some(mv) = self.book.lookup(game) {
            debug!("book move {}", uci(&mv));
            return Some(Selection {
                mv,
                source: MoveSource::Book,
                score: None,
            });
        }

        if let Some(mv) = self.cache.lookup(game) {
            debug!("cached move {}", uci(&mv));
            return Some(Selection {
                mv,
                source: MoveSource::Cache,
                score: None,
            });
        }

        let result = self.backend.search(game, depth);
        result.best_move.map(|mv| Selection {
            mv,
            source: MoveSource::Search,
            score: Some(result.score),
        })
    }
}
