//! MoonBot: a small chess move-selection engine.
//!
//! Moves come from an opening book, then an offline position cache, then a live
//! alpha-beta search over a hand-tuned evaluator. Chess rules are delegated to `shakmaty`.

#[cfg(feature = "accelerated")]
pub mod accelerated;
pub mod book;
pub mod cache;
pub mod error;
pub mod evaluation;
pub mod pgn;
pub mod play;
pub mod pst;
pub mod rules;
pub mod search;
pub mod selector;
pub mod types;
