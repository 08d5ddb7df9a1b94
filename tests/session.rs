use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use reflow::assemble::LevelAssembler;
use reflow::flow;
use reflow::{Cell, Game, GameEvent, Grid, LevelConfig, PathBuilder, PuzzleError};

fn quick_config() -> LevelConfig {
    LevelConfig {
        check_interval: Duration::from_millis(10),
        win_delay: Duration::from_millis(20),
        ..LevelConfig::default()
    }
}

#[test]
fn fresh_level_matches_config() {
    let mut game = Game::new(LevelConfig::default(), Some(42));
    game.generate().expect("generate");
    let grid = game.grid().expect("grid");
    assert_eq!((grid.width(), grid.height()), (6, 6));
    assert_eq!(grid.start(), Cell::new(5, 0));
    assert_eq!(grid.end(), Cell::new(0, 5));
    assert!(grid.occupied_count() >= 36 - 5);
    assert!(grid.is_occupied(grid.start()));
    assert!(grid.is_occupied(grid.end()));
    assert!(!game.is_solved());
}

#[test]
fn same_seed_same_level() {
    let mut a = Game::new(LevelConfig::default(), Some(9));
    let mut b = Game::new(LevelConfig::default(), Some(9));
    a.generate().expect("generate");
    b.generate().expect("generate");
    assert_eq!(a.grid(), b.grid());
}

#[test]
fn invalid_config_is_reported() {
    let mut game = Game::new(LevelConfig::default(), Some(1));
    assert_eq!(
        game.generate_with(3, 3, 7, None),
        Err(PuzzleError::EmptyCountOutOfRange {
            empty_count: 7,
            limit: 7
        })
    );
    assert!(game.grid().is_none());
    assert_eq!(game.config().width, 6);
}

#[test]
fn unscrambled_level_wins_and_advances() {
    let config = LevelConfig {
        scramble: false,
        ..quick_config()
    };
    let mut game = Game::new(config, Some(5));
    game.generate().expect("generate");

    let event = game.update(Duration::from_millis(10));
    assert_eq!(event, Some(GameEvent::Solved { level: 1, moves: 0 }));
    assert!(game.is_pausing());
    assert!(!game.on_cell_clicked(game.grid().expect("grid").start()));

    assert_eq!(game.update(Duration::from_millis(5)), None);
    assert_eq!(
        game.update(Duration::from_millis(20)),
        Some(GameEvent::Regenerated { level: 2 })
    );
    assert_eq!(game.level(), 2);
    assert_eq!(game.moves(), 0);
}

#[test]
fn four_rotations_restore_a_level() {
    let mut game = Game::new(quick_config(), Some(77));
    game.generate().expect("generate");
    let before = game.grid().expect("grid").clone();
    let start = before.start();
    for _ in 0..4 {
        assert!(game.on_cell_clicked(start));
    }
    assert_eq!(game.moves(), 4);
    assert_eq!(
        game.piece_visual_state(start).map(|v| v.openings),
        before.get(start).map(|p| p.openings())
    );
}

#[test]
fn library_pipeline_builds_a_solved_grid() {
    let mut rng = StdRng::seed_from_u64(31);
    for (w, h, empty) in [(3, 1, 0), (4, 4, 3), (8, 5, 20), (12, 12, 60)] {
        let blank = Grid::new(w, h);
        let path = PathBuilder::new(w, h, blank.start(), blank.end())
            .build_path(&mut rng)
            .expect("path");
        assert_eq!(path.first(), blank.start());
        assert_eq!(path.last(), blank.end());

        let mut grid = LevelAssembler::new(w, h)
            .assemble(&path, empty, &mut rng)
            .expect("assemble");
        assert!(flow::connects(&grid));
        let watered = flow::propagate(&mut grid);
        assert!(path.cells().iter().all(|c| watered.contains(c)));
        assert!(flow::is_solved(&grid));
    }
}
