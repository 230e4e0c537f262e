//! Offline position cache.
//!
//! `generate` walks principal lines breadth-first: every dequeued position is searched with
//! negamax, recorded once, and contributes at most one successor (its best move played).
//! The table is ordered by key so identical runs serialise to identical bytes.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shakmaty::Move;

use crate::error::{EngineError, EngineResult};
use crate::rules::{uci, Game};
use crate::search::search_negamax;
use crate::types::Score;

const PROGRESS_INTERVAL: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "move")]
    pub mv: Option<String>,
    #[serde(alias = "cp")]
    pub score: Score,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionCache {
    entries: BTreeMap<String, CacheEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    QueueExhausted,
    LimitReached,
}

pub struct Generation {
    pub cache: PositionCache,
    pub processed: usize,
    /// Positions still queued when generation stopped
    pub pending: usize,
    pub stop: StopReason,
}

/// Builds a cache from `root`, processing at most `max_positions` distinct positions.
pub fn generate(root: &Game, depth: u8, max_positions: usize) -> Generation {
    generate_from([root.clone()], depth, max_positions)
}

/// Like [`generate`], with several seed positions queued in order.
pub fn generate_from<I>(roots: I, depth: u8, max_positions: usize) -> Generation
where
    I: IntoIterator<Item = Game>,
{
    let mut queue: VecDeque<Game> = roots.into_iter().collect();
    let mut visited: HashSet<String> = HashSet::new();
    let mut cache = PositionCache::default();
    let mut processed = 0;

    while processed < max_positions {
        let Some(mut game) = queue.pop_front() else {
            break;
        };
        let key = game.key();
        if !visited.insert(key.clone()) {
            debug!("already cached, skipping {}", key);
            continue;
        }

        let result = search_negamax(&mut game, depth);
        cache.insert(
            key,
            CacheEntry {
                mv: result.best_move.as_ref().map(uci),
                score: result.score,
            },
        );
        if let Some(mv) = result.best_move {
            game.apply(&mv);
            queue.push_back(game);
        }

        processed += 1;
        if processed % PROGRESS_INTERVAL == 0 {
            info!("generated {} positions...", processed);
        }
    }

    let stop = if queue.is_empty() {
        StopReason::QueueExhausted
    } else {
        StopReason::LimitReached
    };
    info!(
        "move cache generated for {} positions at depth {} ({:?})",
        processed, depth, stop
    );

    Generation {
        cache,
        processed,
        pending: queue.len(),
        stop,
    }
}

impl PositionCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    // Entries are write-once
    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.entries.entry(key).or_insert(entry);
    }

    /// Cached move for the exact position, if it is still legal there.
    pub fn lookup(&self, game: &Game) -> Option<Move> {
        let key = game.key();
        let text = self.entries.get(&key)?.mv.as_deref()?;
        match game.parse_uci(text) {
            Ok(mv) => Some(mv),
            Err(err) => {
                warn!("ignoring cache entry for {}: {}", key, err);
                None
            }
        }
    }

    pub fn to_json(&self) -> String {
        // A string-keyed map of plain structs always serialises
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        fs::write(path, self.to_json()).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cache: Self = serde_json::from_str(&text).map_err(|source| EngineError::CacheFormat {
            path: path.to_path_buf(),
            source,
        })?;
        info!("position cache {}: {} positions", path.display(), cache.len());
        Ok(cache)
    }

    /// Like [`PositionCache::load`], but a missing or malformed file yields an empty cache.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cache) => cache,
            Err(err) => {
                warn!("position cache not loaded, continuing without it: {}", err);
                Self::default()
            }
        }
    }
}


// Each processed position contributes at most one successor, so the queue is usually 1 long and
// generation walks a single principal line. Keys carry both move counters, so a line can only hit
// the visited set when the same game state is reached again, clocks included
