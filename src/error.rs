use thiserror::Error;

use crate::grid::Cell;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("empty cell count {empty_count} out of range (must be below {limit})")]
    EmptyCountOutOfRange { empty_count: usize, limit: usize },

    #[error("no path from {start} to {end}")]
    PathNotFound { start: Cell, end: Cell },

    #[error("invalid path: {reason}")]
    InvalidPath { reason: String },
}

pub type Result<T> = std::result::Result<T, PuzzleError>;
