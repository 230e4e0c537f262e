//! Error types for the move-selection engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the engine library
#[derive(Error, Debug)]
pub enum EngineError {
    /// Move text that is not coordinate notation at all
    #[error("Invalid move format: {notation}")]
    InvalidMove { notation: String },

    /// Well-formed move that the position does not allow
    #[error("Illegal move: {notation}")]
    IllegalMove { notation: String },

    #[error("Invalid FEN: {fen}")]
    InvalidFen { fen: String },

    #[error("Search depth must be between 1 and {max}, got {depth}")]
    InvalidDepth { depth: u32, max: u8 },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file exists but does not hold the expected table
    #[error("Malformed position cache {}: {source}", path.display())]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
