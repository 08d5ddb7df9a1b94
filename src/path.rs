//! Randomized backtracking search for the solution path.
//!
//! The search is depth-first with the four directions shuffled at every cell,
//! and keeps its used-mask and partial path as explicit state on an explicit
//! stack. With pruning on (the default) a neighbor is skipped as soon as the
//! end can no longer be reached from it through unused cells, which keeps the
//! search linear in practice on large grids.

use std::collections::VecDeque;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::direction::Direction;
use crate::error::{PuzzleError, Result};
use crate::grid::Cell;

/// Ordered, simple, 4-connected sequence of cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<Cell>,
}

impl Path {
    /// Validate that `cells` is non-empty, 4-connected and never repeats a cell.
    pub fn new(cells: Vec<Cell>) -> Result<Self> {
        if cells.is_empty() {
            return Err(PuzzleError::InvalidPath {
                reason: "path is empty".into(),
            });
        }
        for pair in cells.windows(2) {
            if pair[0].direction_to(pair[1]).is_none() {
                return Err(PuzzleError::InvalidPath {
                    reason: format!("{} and {} are not adjacent", pair[0], pair[1]),
                });
            }
        }
        let mut sorted = cells.clone();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|p| p[0] == p[1]) {
            return Err(PuzzleError::InvalidPath {
                reason: format!("{} visited twice", pair[0]),
            });
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn first(&self) -> Cell {
        self.cells[0]
    }

    pub fn last(&self) -> Cell {
        self.cells[self.cells.len() - 1]
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }
}

/// One level of the explicit search stack.
struct Frame {
    dirs: [Direction; 4],
    next: usize,
}

impl Frame {
    fn new(rng: &mut impl Rng) -> Self {
        let mut dirs = Direction::ALL;
        dirs.shuffle(rng);
        Self { dirs, next: 0 }
    }

    fn next_dir(&mut self) -> Option<Direction> {
        let dir = self.dirs.get(self.next).copied();
        self.next += 1;
        dir
    }
}

#[derive(Clone, Debug)]
pub struct PathBuilder {
    width: usize,
    height: usize,
    start: Cell,
    end: Cell,
    blocked: Vec<bool>,
    prune: bool,
}

impl PathBuilder {
    pub fn new(width: usize, height: usize, start: Cell, end: Cell) -> Self {
        Self {
            width,
            height,
            start,
            end,
            blocked: vec![false; width * height],
            prune: true,
        }
    }

    /// Mark cells the path may not pass through. Out-of-grid cells are ignored.
    #[must_use]
    pub fn with_blocked(mut self, cells: &[Cell]) -> Self {
        for &cell in cells {
            if let Some(i) = self.index(cell) {
                self.blocked[i] = true;
            }
        }
        self
    }

    /// Toggle dead-branch pruning.
    #[must_use]
    pub fn prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        let in_bounds = cell.x >= 0
            && (cell.x as usize) < self.width
            && cell.y >= 0
            && (cell.y as usize) < self.height;
        in_bounds.then(|| cell.y as usize * self.width + cell.x as usize)
    }

    fn open(&self, cell: Cell, used: &[bool]) -> Option<usize> {
        self.index(cell).filter(|&i| !used[i] && !self.blocked[i])
    }

    pub fn build_path(&self, rng: &mut impl Rng) -> Result<Path> {
        let not_found = PuzzleError::PathNotFound {
            start: self.start,
            end: self.end,
        };
        let mut used = vec![false; self.width * self.height];
        let Some(start_idx) = self.open(self.start, &used) else {
            return Err(not_found);
        };
        if self.open(self.end, &used).is_none() {
            return Err(not_found);
        }

        used[start_idx] = true;
        let mut path = vec![self.start];
        if self.start == self.end {
            return Path::new(path);
        }

        let mut stack = vec![Frame::new(rng)];
        let mut backtracks = 0usize;
        while let Some(frame) = stack.last_mut() {
            let current = path[path.len() - 1];
            let Some(dir) = frame.next_dir() else {
                // Dead end: undo this cell and resume the caller's loop.
                stack.pop();
                if let Some(cell) = path.pop() {
                    if let Some(i) = self.index(cell) {
                        used[i] = false;
                    }
                }
                backtracks += 1;
                continue;
            };

            let next = current.step(dir);
            let Some(i) = self.open(next, &used) else {
                continue;
            };
            if self.prune && !self.reaches_end(next, &used) {
                continue;
            }

            used[i] = true;
            path.push(next);
            if next == self.end {
                debug!(
                    "path {} -> {}: {} cells, {} backtracks",
                    self.start,
                    self.end,
                    path.len(),
                    backtracks
                );
                return Path::new(path);
            }
            stack.push(Frame::new(rng));
        }

        Err(not_found)
    }

    /// Whether the end is reachable from `from` through cells that are neither used nor blocked.
    fn reaches_end(&self, from: Cell, used: &[bool]) -> bool {
        if from == self.end {
            return true;
        }
        let Some(from_idx) = self.index(from) else {
            return false;
        };
        let mut seen = used.to_vec();
        seen[from_idx] = true;
        let mut q = VecDeque::new();
        q.push_back(from);
        while let Some(cell) = q.pop_front() {
            for dir in Direction::ALL {
                let next = cell.step(dir);
                let Some(i) = self.index(next) else {
                    continue;
                };
                if seen[i] || self.blocked[i] {
                    continue;
                }
                if next == self.end {
                    return true;
                }
                seen[i] = true;
                q.push_back(next);
            }
        }
        false
    }
}
