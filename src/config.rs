//! Level configuration.

use std::time::Duration;

use crate::error::{PuzzleError, Result};

pub const DEFAULT_WIDTH: usize = 6;
pub const DEFAULT_HEIGHT: usize = 6;
pub const DEFAULT_EMPTY_COUNT: usize = 5;
pub const DEFAULT_CELL_SIZE: f32 = 1.5;
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_WIN_DELAY: Duration = Duration::from_millis(500);

/// Exclusive upper bound on the empty cell count: start and end always hold pieces.
pub fn empty_limit(width: usize, height: usize) -> usize {
    (width * height).saturating_sub(2)
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfig {
    pub width: usize,
    pub height: usize,
    /// Non-path cells left without a piece.
    pub empty_count: usize,
    /// World units per cell, for `Geometry`.
    pub cell_size: f32,
    /// Minimum time between win checks.
    pub check_interval: Duration,
    /// Pause between a win and the next level.
    pub win_delay: Duration,
    /// Randomly rotate path pieces so levels start unsolved.
    pub scramble: bool,
    /// Recompute water right after every rotation instead of on the next check.
    pub flow_on_rotate: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            empty_count: DEFAULT_EMPTY_COUNT,
            cell_size: DEFAULT_CELL_SIZE,
            check_interval: DEFAULT_CHECK_INTERVAL,
            win_delay: DEFAULT_WIN_DELAY,
            scramble: true,
            flow_on_rotate: false,
        }
    }
}

impl LevelConfig {
    #[must_use]
    pub fn with_size(mut self, width: usize, height: usize, empty_count: usize) -> Self {
        self.width = width;
        self.height = height;
        self.empty_count = empty_count;
        self
    }

    pub fn empty_limit(&self) -> usize {
        empty_limit(self.width, self.height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PuzzleError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let limit = self.empty_limit();
        if self.empty_count >= limit {
            return Err(PuzzleError::EmptyCountOutOfRange {
                empty_count: self.empty_count,
                limit,
            });
        }
        Ok(())
    }
}
