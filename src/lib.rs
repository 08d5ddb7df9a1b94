//! Pipe-rotation puzzle engine.
//!
//! A random simple path links the start cell (bottom-right) to the end cell
//! (top-left); path cells get straight or elbow pipes, other cells get decoys
//! or stay empty. Rotating pieces changes which cells water reaches from the
//! start, and the level is solved when water leaves the end piece through its
//! Left side.

pub mod assemble;
pub mod config;
pub mod direction;
pub mod error;
pub mod flow;
pub mod game;
pub mod grid;
pub mod path;
pub mod piece;

pub use config::LevelConfig;
pub use direction::Direction;
pub use error::{PuzzleError, Result};
pub use game::{Game, GameEvent, PieceVisual};
pub use grid::{Cell, Geometry, Grid};
pub use path::{Path, PathBuilder};
pub use piece::{Openings, Piece, Shape};
