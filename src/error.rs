/// Crate-wide error type.
///
/// Only precondition violations and I/O failures surface here. Expected
/// in-game outcomes (blocked moves, unknown commands, duplicate pickups)
/// are plain values, not errors.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("render target must have a non-zero size (got {width}x{height})")]
    InvalidRenderTarget { width: u16, height: u16 },
    #[error("level numbers start at 1 (got {0})")]
    InvalidLevel(u32),
    #[error("Invalid screen: {0}")]
    InvalidScreen(String),
    #[error("no game session is active")]
    NoSession,
    #[error("storage failure: {0}")]
    Storage(#[from] io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type GameResult<T> = Result<T, GameError>;
