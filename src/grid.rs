//! Grid of optional pipe pieces, fixed terminal cells, and cell/world geometry.

use std::fmt;

use crate::direction::Direction;
use crate::piece::Piece;

/// Grid coordinate. Signed so neighbors just outside the grid are representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Direction of the unit step from `self` to `other`, if they are adjacent.
    pub fn direction_to(self, other: Cell) -> Option<Direction> {
        Direction::from_delta(other.x - self.x, other.y - self.y)
    }

    pub fn manhattan(self, other: Cell) -> usize {
        (self.x - other.x).unsigned_abs() as usize + (self.y - other.y).unsigned_abs() as usize
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// `width × height` slots, each empty or holding one piece.
///
/// Out-of-bounds reads return `None`, writes are no-ops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    pieces: Vec<Option<Piece>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pieces: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bottom-right corner; water enters it from the inlet on its Right side.
    pub fn start(&self) -> Cell {
        Cell::new(self.width as i32 - 1, 0)
    }

    /// Top-left corner; it drains into the outlet on its Left side.
    pub fn end(&self) -> Cell {
        Cell::new(0, self.height as i32 - 1)
    }

    /// Cosmetic inlet pipe, one cell right of the start.
    pub fn inlet(&self) -> Cell {
        self.start().step(Direction::Right)
    }

    /// Cosmetic outlet pipe, one cell left of the end.
    pub fn outlet(&self) -> Cell {
        self.end().step(Direction::Left)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && (cell.x as usize) < self.width
            && cell.y >= 0
            && (cell.y as usize) < self.height
    }

    /// Row-major slot index, `None` outside the grid.
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, cell: Cell) -> Option<&Piece> {
        self.index(cell).and_then(|i| self.pieces[i].as_ref())
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut Piece> {
        let i = self.index(cell)?;
        self.pieces[i].as_mut()
    }

    /// Place a piece at its own position. Returns the piece it replaced.
    pub fn place(&mut self, piece: Piece) -> Option<Piece> {
        let i = self.index(piece.position())?;
        self.pieces[i].replace(piece)
    }

    /// Rotate the piece at `cell`. Returns false if there is none.
    pub fn rotate(&mut self, cell: Cell) -> bool {
        match self.get_mut(cell) {
            Some(piece) => {
                piece.rotate();
                true
            }
            None => false,
        }
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.get(cell).is_some()
    }

    /// All in-grid cells, x-major (column by column).
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..w).flat_map(move |x| (0..h).map(move |y| Cell::new(x, y)))
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().flatten()
    }

    pub fn pieces_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.pieces.iter_mut().flatten()
    }

    pub fn occupied_count(&self) -> usize {
        self.pieces().count()
    }
}

/// Maps cells to world-space centers and back.
///
/// The grid is centered on `origin`; world y grows upward like grid y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    pub origin: (f32, f32),
}

impl Geometry {
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            origin: (0.0, 0.0),
        }
    }

    #[must_use]
    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = (x, y);
        self
    }

    /// Center of `cell`. Works for out-of-grid cells such as the inlet.
    pub fn cell_to_world(&self, cell: Cell) -> (f32, f32) {
        let offset_x = (self.width as f32 - 1.0) * self.cell_size * 0.5;
        let offset_y = (self.height as f32 - 1.0) * self.cell_size * 0.5;
        (
            cell.x as f32 * self.cell_size - offset_x + self.origin.0,
            cell.y as f32 * self.cell_size - offset_y + self.origin.1,
        )
    }

    /// The in-grid cell whose square contains the point, if any.
    pub fn world_to_cell(&self, x: f32, y: f32) -> Option<Cell> {
        if self.cell_size <= 0.0 {
            return None;
        }
        let fx = (x - self.origin.0) / self.cell_size + self.width as f32 * 0.5;
        let fy = (y - self.origin.1) / self.cell_size + self.height as f32 * 0.5;
        if fx < 0.0 || fy < 0.0 || fx >= self.width as f32 || fy >= self.height as f32 {
            return None;
        }
        Some(Cell::new(fx.floor() as i32, fy.floor() as i32))
    }
}
