//! Pipe pieces: opening sets, base shapes and quarter-turn rotation.

use std::fmt;

use crate::direction::Direction;
use crate::grid::Cell;

/// Set of open sides, one bit per `Direction` index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Openings(u8);

impl Openings {
    pub const NONE: Openings = Openings(0);

    pub fn of(dirs: &[Direction]) -> Self {
        dirs.iter().copied().collect()
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & (1 << dir.index()) != 0
    }

    pub fn insert(&mut self, dir: Direction) {
        self.0 |= 1 << dir.index();
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Open sides in `Direction::ALL` order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }

    /// Every open side moved by `Direction::rotate_step`.
    #[must_use]
    pub fn rotated(self) -> Self {
        self.iter().map(Direction::rotate_step).collect()
    }
}

impl FromIterator<Direction> for Openings {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Openings::NONE;
        for dir in iter {
            set.insert(dir);
        }
        set
    }
}

impl fmt::Display for Openings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, dir) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dir}")?;
        }
        f.write_str("}")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Shape {
    Straight,
    Elbow,
}

impl Shape {
    pub const ALL: [Shape; 2] = [Shape::Straight, Shape::Elbow];

    /// Openings before any rotation.
    pub fn base_openings(self) -> Openings {
        match self {
            Shape::Straight => Openings::of(&[Direction::Up, Direction::Down]),
            Shape::Elbow => Openings::of(&[Direction::Up, Direction::Right]),
        }
    }
}

/// One occupied grid slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    openings: Openings,
    has_water: bool,
    position: Cell,
}

impl Piece {
    pub fn new(position: Cell, openings: Openings) -> Self {
        Self {
            openings,
            has_water: false,
            position,
        }
    }

    /// A base shape turned `turns` quarter steps.
    pub fn from_shape(position: Cell, shape: Shape, turns: u8) -> Self {
        let mut piece = Self::new(position, shape.base_openings());
        for _ in 0..turns % 4 {
            piece.rotate();
        }
        piece
    }

    pub fn rotate(&mut self) {
        self.openings = self.openings.rotated();
    }

    pub fn has_connection(&self, dir: Direction) -> bool {
        self.openings.contains(dir)
    }

    pub fn openings(&self) -> Openings {
        self.openings
    }

    pub fn has_water(&self) -> bool {
        self.has_water
    }

    pub fn set_water(&mut self, water: bool) {
        self.has_water = water;
    }

    pub fn position(&self) -> Cell {
        self.position
    }
}
