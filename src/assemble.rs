//! Turns a solution path into a populated grid.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config;
use crate::direction::Direction;
use crate::error::{PuzzleError, Result};
use crate::grid::{Cell, Grid};
use crate::path::Path;
use crate::piece::{Openings, Piece, Shape};

/// Travel direction into the start cell: water arrives from the inlet on its Right.
const START_ENTRY: Direction = Direction::Left;
/// Travel direction out of the end cell, into the outlet on its Left.
const END_EXIT: Direction = Direction::Left;

#[derive(Clone, Copy, Debug)]
pub struct LevelAssembler {
    width: usize,
    height: usize,
}

impl LevelAssembler {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn empty_limit(&self) -> usize {
        config::empty_limit(self.width, self.height)
    }

    /// Build a grid whose path pieces are already in their solved orientation.
    pub fn assemble(&self, path: &Path, empty_count: usize, rng: &mut impl Rng) -> Result<Grid> {
        let limit = self.empty_limit();
        if empty_count >= limit {
            return Err(PuzzleError::EmptyCountOutOfRange { empty_count, limit });
        }

        let mut grid = Grid::new(self.width, self.height);
        self.check_path(&grid, path)?;

        let cells = path.cells();
        for (i, &cell) in cells.iter().enumerate() {
            let entry = if i == 0 {
                START_ENTRY
            } else {
                travel(cells[i - 1], cell)?
            };
            let exit = if i == cells.len() - 1 {
                END_EXIT
            } else {
                travel(cell, cells[i + 1])?
            };
            grid.place(Piece::new(cell, path_openings(entry, exit)));
        }

        let mut non_path: Vec<Cell> = grid.cells().filter(|c| !path.contains(*c)).collect();
        non_path.shuffle(rng);
        let empties = empty_count.min(non_path.len());
        for &cell in &non_path[empties..] {
            let shape = *Shape::ALL.choose(rng).unwrap_or(&Shape::Straight);
            let turns = rng.gen_range(0..4u8);
            grid.place(Piece::from_shape(cell, shape, turns));
        }

        debug!(
            "assembled {}x{}: {} path pieces, {} decoys, {} empty",
            self.width,
            self.height,
            cells.len(),
            non_path.len() - empties,
            empties
        );
        Ok(grid)
    }

    fn check_path(&self, grid: &Grid, path: &Path) -> Result<()> {
        if path.first() != grid.start() || path.last() != grid.end() {
            return Err(PuzzleError::InvalidPath {
                reason: format!(
                    "path runs {} -> {}, expected {} -> {}",
                    path.first(),
                    path.last(),
                    grid.start(),
                    grid.end()
                ),
            });
        }
        if let Some(cell) = path.cells().iter().find(|c| !grid.in_bounds(**c)) {
            return Err(PuzzleError::InvalidPath {
                reason: format!("{cell} is outside the {}x{} grid", self.width, self.height),
            });
        }
        Ok(())
    }
}

fn travel(from: Cell, to: Cell) -> Result<Direction> {
    from.direction_to(to).ok_or_else(|| PuzzleError::InvalidPath {
        reason: format!("{from} and {to} are not adjacent"),
    })
}

/// Openings of a path piece entered travelling `entry` and left travelling `exit`.
pub fn path_openings(entry: Direction, exit: Direction) -> Openings {
    if entry == exit || entry == exit.opposite() {
        Openings::of(&[entry, entry.opposite()])
    } else {
        Openings::of(&[entry.opposite(), exit])
    }
}

/// Rotate every path piece by a random number of quarter turns.
pub fn scramble_path(grid: &mut Grid, path: &Path, rng: &mut impl Rng) {
    for &cell in path.cells() {
        let turns = rng.gen_range(0..4);
        for _ in 0..turns {
            grid.rotate(cell);
        }
    }
}
