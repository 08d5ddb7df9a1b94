//! Water propagation from the start cell and the win predicate.

use std::collections::{BTreeSet, VecDeque};

use crate::direction::Direction;
use crate::grid::{Cell, Grid};

/// Side of the start piece that faces the inlet.
pub const INLET_SIDE: Direction = Direction::Right;
/// Side of the end piece that must face the outlet.
pub const OUTLET_SIDE: Direction = Direction::Left;

pub type WaterSet = BTreeSet<Cell>;

/// Recompute water from scratch and return the watered cells.
///
/// Breadth-first from the start, entering through `INLET_SIDE`. A neighbor is
/// queued only when it opens back toward the current cell; the entry check is
/// repeated when it is dequeued.
pub fn propagate(grid: &mut Grid) -> WaterSet {
    for piece in grid.pieces_mut() {
        piece.set_water(false);
    }

    let mut watered = WaterSet::new();
    let mut q = VecDeque::new();
    q.push_back((grid.start(), INLET_SIDE));

    while let Some((cell, entry)) = q.pop_front() {
        if watered.contains(&cell) {
            continue;
        }
        let Some(piece) = grid.get_mut(cell) else {
            continue;
        };
        if !piece.has_connection(entry) {
            continue;
        }
        piece.set_water(true);
        watered.insert(cell);

        let openings = piece.openings();
        for exit in openings.iter().filter(|d| *d != entry) {
            let next = cell.step(exit);
            let back = exit.opposite();
            if grid.get(next).is_some_and(|p| p.has_connection(back)) {
                q.push_back((next, back));
            }
        }
    }
    watered
}

/// End piece holds water and opens toward the outlet.
pub fn is_solved(grid: &Grid) -> bool {
    grid.get(grid.end())
        .is_some_and(|p| p.has_water() && p.has_connection(OUTLET_SIDE))
}

/// Read-only early-exit check that agrees with `propagate` + `is_solved`.
pub fn connects(grid: &Grid) -> bool {
    let end = grid.end();
    let mut seen = vec![false; grid.width() * grid.height()];
    let mut stack = vec![(grid.start(), INLET_SIDE)];

    while let Some((cell, entry)) = stack.pop() {
        let Some(i) = grid.index(cell) else {
            continue;
        };
        if seen[i] {
            continue;
        }
        let Some(piece) = grid.get(cell) else {
            continue;
        };
        if !piece.has_connection(entry) {
            continue;
        }
        seen[i] = true;
        if cell == end {
            // The end is entered at most once, so its outlet decides.
            return piece.has_connection(OUTLET_SIDE);
        }
        for exit in piece.openings().iter().filter(|d| *d != entry) {
            stack.push((cell.step(exit), exit.opposite()));
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Openings, Piece};
    use proptest::prelude::*;

    fn horizontal() -> Openings {
        Openings::of(&[Direction::Right, Direction::Left])
    }

    fn two_by_one(end_openings: Openings) -> Grid {
        let mut grid = Grid::new(2, 1);
        grid.place(Piece::new(Cell::new(1, 0), horizontal()));
        grid.place(Piece::new(Cell::new(0, 0), end_openings));
        grid
    }

    #[test]
    fn horizontal_pair_is_solved() {
        let mut grid = two_by_one(horizontal());
        let watered = propagate(&mut grid);
        assert!(watered.contains(&Cell::new(0, 0)));
        assert!(grid.get(Cell::new(0, 0)).unwrap().has_water());
        assert!(is_solved(&grid));
        assert!(connects(&grid));
    }

    #[test]
    fn single_cell_grid_is_solved_by_a_horizontal_piece() {
        let mut grid = Grid::new(1, 1);
        grid.place(Piece::new(Cell::new(0, 0), horizontal()));
        propagate(&mut grid);
        assert!(is_solved(&grid));
    }

    #[test]
    fn vertical_end_piece_stays_dry() {
        let mut grid = two_by_one(Openings::of(&[Direction::Up, Direction::Down]));
        let watered = propagate(&mut grid);
        assert!(!watered.contains(&Cell::new(0, 0)));
        assert!(!grid.get(Cell::new(0, 0)).unwrap().has_water());
        assert!(!is_solved(&grid));
        assert!(!connects(&grid));
    }

    #[test]
    fn watered_end_without_outlet_is_not_solved() {
        // Water reaches (0, 0) through its Right side, but it drains Up, not Left.
        let mut grid = two_by_one(Openings::of(&[Direction::Right, Direction::Up]));
        let watered = propagate(&mut grid);
        assert!(watered.contains(&Cell::new(0, 0)));
        assert!(!is_solved(&grid));
        assert!(!connects(&grid));
    }

    #[test]
    fn start_without_inlet_side_is_dry() {
        let mut grid = Grid::new(2, 1);
        grid.place(Piece::new(Cell::new(1, 0), Openings::of(&[Direction::Left, Direction::Up])));
        grid.place(Piece::new(Cell::new(0, 0), horizontal()));
        assert!(propagate(&mut grid).is_empty());
        assert!(!is_solved(&grid));
    }

    #[test]
    fn empty_start_waters_nothing() {
        let mut grid = Grid::new(3, 3);
        grid.place(Piece::new(Cell::new(0, 2), horizontal()));
        assert!(propagate(&mut grid).is_empty());
        assert!(!is_solved(&grid));
    }

    #[test]
    fn stale_water_is_cleared() {
        let mut grid = two_by_one(horizontal());
        propagate(&mut grid);
        grid.rotate(Cell::new(0, 0));
        let watered = propagate(&mut grid);
        assert_eq!(watered.len(), 1);
        assert!(!grid.get(Cell::new(0, 0)).unwrap().has_water());
    }

    #[test]
    fn rotating_a_path_piece_breaks_the_solution() {
        // 3x1: start (2, 0) -> (1, 0) -> end (0, 0), all horizontal.
        let mut grid = Grid::new(3, 1);
        for x in 0..3 {
            grid.place(Piece::new(Cell::new(x, 0), horizontal()));
        }
        propagate(&mut grid);
        assert!(is_solved(&grid));

        grid.rotate(Cell::new(1, 0));
        let watered = propagate(&mut grid);
        assert!(!is_solved(&grid));
        assert_eq!(watered.into_iter().collect::<Vec<_>>(), vec![Cell::new(2, 0)]);

        grid.rotate(Cell::new(1, 0));
        propagate(&mut grid);
        assert!(is_solved(&grid));
    }

    #[test]
    fn water_spreads_into_side_branches() {
        // A cross at (1, 0) of a 3x2 grid feeds the cell above it too.
        let mut grid = Grid::new(3, 2);
        grid.place(Piece::new(Cell::new(2, 0), horizontal()));
        grid.place(Piece::new(
            Cell::new(1, 0),
            Openings::of(&Direction::ALL),
        ));
        grid.place(Piece::new(Cell::new(1, 1), Openings::of(&[Direction::Down])));
        grid.place(Piece::new(Cell::new(0, 1), horizontal()));
        let watered = propagate(&mut grid);
        let expected: WaterSet = [Cell::new(2, 0), Cell::new(1, 0), Cell::new(1, 1)]
            .into_iter()
            .collect();
        assert_eq!(watered, expected);
        assert!(!is_solved(&grid));
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        (1usize..6, 1usize..6).prop_flat_map(|(w, h)| {
            proptest::collection::vec(prop::option::weighted(0.8, 0u8..16), w * h).prop_map(
                move |slots| {
                    let mut grid = Grid::new(w, h);
                    for (i, slot) in slots.into_iter().enumerate() {
                        if let Some(bits) = slot {
                            let cell = Cell::new((i % w) as i32, (i / w) as i32);
                            let openings = Direction::ALL
                                .into_iter()
                                .filter(|d| bits & (1 << d.index()) != 0)
                                .collect();
                            grid.place(Piece::new(cell, openings));
                        }
                    }
                    grid
                },
            )
        })
    }

    proptest! {
        #[test]
        fn prop_propagate_is_deterministic(grid in arb_grid()) {
            let mut a = grid.clone();
            let mut b = grid;
            prop_assert_eq!(propagate(&mut a), propagate(&mut b));
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_water_flags_match_returned_set(grid in arb_grid()) {
            let mut grid = grid;
            let watered = propagate(&mut grid);
            for cell in grid.cells() {
                let flagged = grid.get(cell).is_some_and(|p| p.has_water());
                prop_assert_eq!(flagged, watered.contains(&cell));
            }
        }

        #[test]
        fn prop_watered_neighbors_are_mutually_open(grid in arb_grid()) {
            let mut grid = grid;
            let watered = propagate(&mut grid);
            for &cell in &watered {
                if cell == grid.start() {
                    continue;
                }
                let fed = Direction::ALL.into_iter().any(|d| {
                    let n = cell.step(d);
                    watered.contains(&n)
                        && grid.get(cell).is_some_and(|p| p.has_connection(d))
                        && grid.get(n).is_some_and(|p| p.has_connection(d.opposite()))
                });
                prop_assert!(fed, "{} watered without a feeding neighbor", cell);
            }
        }

        #[test]
        fn prop_connects_agrees_with_propagate(grid in arb_grid()) {
            let mut grid = grid;
            let quick = connects(&grid);
            propagate(&mut grid);
            prop_assert_eq!(quick, is_solved(&grid));
        }
    }
}
