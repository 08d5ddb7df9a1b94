//! Host-facing puzzle session: generation, clicks, throttled win checks and
//! the delayed move to the next level.

use std::time::Duration;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assemble::{scramble_path, LevelAssembler};
use crate::config::LevelConfig;
use crate::error::{PuzzleError, Result};
use crate::flow;
use crate::grid::{Cell, Geometry, Grid};
use crate::path::PathBuilder;
use crate::piece::Openings;

/// Re-rolls allowed when a scramble happens to leave the level solved.
const SCRAMBLE_ATTEMPTS: u32 = 8;

/// What a renderer needs to draw one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceVisual {
    pub openings: Openings,
    pub has_water: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Solved { level: u32, moves: u32 },
    Regenerated { level: u32 },
    GenerationFailed(PuzzleError),
}

#[derive(Debug)]
pub struct Game {
    config: LevelConfig,
    rng: StdRng,
    grid: Option<Grid>,
    geometry: Geometry,
    level: u32,
    moves: u32,
    check_timer: Duration,
    solved: bool,
    regen_in: Option<Duration>,
}

impl Game {
    /// A session without a grid yet; call `generate` to build the first level.
    pub fn new(config: LevelConfig, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let geometry = Geometry::new(config.width, config.height, config.cell_size);
        Self {
            config,
            rng,
            grid: None,
            geometry,
            level: 1,
            moves: 0,
            check_timer: Duration::ZERO,
            solved: false,
            regen_in: None,
        }
    }

    /// Replace the grid with a fresh level from the current config.
    ///
    /// On error the previous grid stays in place.
    pub fn generate(&mut self) -> Result<()> {
        let config = self.config.clone();
        self.generate_from(config)
    }

    /// Reconfigure and generate. On error neither the grid nor the config changes.
    pub fn generate_with(
        &mut self,
        width: usize,
        height: usize,
        empty_count: usize,
        seed: Option<u64>,
    ) -> Result<()> {
        let config = self.config.clone().with_size(width, height, empty_count);
        if let Err(e) = config.validate() {
            error!("rejected {width}x{height} level with {empty_count} empty cells: {e}");
            return Err(e);
        }
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.generate_from(config)
    }

    fn generate_from(&mut self, config: LevelConfig) -> Result<()> {
        match self.build_level(&config) {
            Ok(grid) => {
                info!(
                    "level {} ready: {}x{}, {} pieces",
                    self.level,
                    grid.width(),
                    grid.height(),
                    grid.occupied_count()
                );
                self.geometry = Geometry::new(config.width, config.height, config.cell_size);
                self.config = config;
                self.grid = Some(grid);
                self.moves = 0;
                self.check_timer = Duration::ZERO;
                self.solved = false;
                self.regen_in = None;
                Ok(())
            }
            Err(e) => {
                error!("level generation failed: {e}");
                Err(e)
            }
        }
    }

    fn build_level(&mut self, config: &LevelConfig) -> Result<Grid> {
        config.validate()?;
        let (w, h) = (config.width, config.height);
        let empty = Grid::new(w, h);
        let path = PathBuilder::new(w, h, empty.start(), empty.end()).build_path(&mut self.rng)?;
        let mut grid = LevelAssembler::new(w, h).assemble(&path, config.empty_count, &mut self.rng)?;

        if config.scramble {
            let mut attempts = 0;
            while attempts < SCRAMBLE_ATTEMPTS && flow::connects(&grid) {
                scramble_path(&mut grid, &path, &mut self.rng);
                attempts += 1;
            }
            if flow::connects(&grid) {
                warn!("level still solved after {SCRAMBLE_ATTEMPTS} scrambles");
            }
        }

        flow::propagate(&mut grid);
        Ok(grid)
    }

    /// Rotate the clicked piece. Clicks on empty cells, outside the grid or
    /// during the post-win pause do nothing and return false.
    pub fn on_cell_clicked(&mut self, cell: Cell) -> bool {
        if self.solved {
            return false;
        }
        let Some(grid) = self.grid.as_mut() else {
            return false;
        };
        if !grid.rotate(cell) {
            return false;
        }
        self.moves += 1;
        if self.config.flow_on_rotate {
            flow::propagate(grid);
        }
        true
    }

    /// Click at a world-space point.
    pub fn on_world_clicked(&mut self, x: f32, y: f32) -> bool {
        match self.geometry.world_to_cell(x, y) {
            Some(cell) => self.on_cell_clicked(cell),
            None => false,
        }
    }

    pub fn piece_visual_state(&self, cell: Cell) -> Option<PieceVisual> {
        let piece = self.grid.as_ref()?.get(cell)?;
        Some(PieceVisual {
            openings: piece.openings(),
            has_water: piece.has_water(),
        })
    }

    /// Recompute water and test for a win, whatever the check interval.
    pub fn is_solved(&mut self) -> bool {
        self.recheck()
    }

    /// Recompute water now, bypassing the check interval.
    pub fn recheck(&mut self) -> bool {
        match self.grid.as_mut() {
            Some(grid) => {
                flow::propagate(grid);
                flow::is_solved(grid)
            }
            None => false,
        }
    }

    /// Advance session time by `elapsed`.
    ///
    /// Runs at most one win check per `check_interval`; after a win, waits
    /// `win_delay` and then generates the next level.
    pub fn update(&mut self, elapsed: Duration) -> Option<GameEvent> {
        if let Some(remaining) = self.regen_in {
            if elapsed < remaining {
                self.regen_in = Some(remaining - elapsed);
                return None;
            }
            return Some(self.advance_level());
        }

        if self.solved || self.grid.is_none() {
            return None;
        }
        self.check_timer += elapsed;
        if self.check_timer < self.config.check_interval {
            return None;
        }
        self.check_timer = Duration::ZERO;

        if !self.recheck() {
            debug!("level {} not solved after {} moves", self.level, self.moves);
            return None;
        }
        info!("level {} solved in {} moves", self.level, self.moves);
        self.solved = true;
        self.regen_in = Some(self.config.win_delay);
        Some(GameEvent::Solved {
            level: self.level,
            moves: self.moves,
        })
    }

    fn advance_level(&mut self) -> GameEvent {
        self.level += 1;
        match self.generate() {
            Ok(()) => GameEvent::Regenerated { level: self.level },
            Err(e) => {
                // Keep the solved grid and retry after another pause.
                self.level -= 1;
                self.regen_in = Some(self.config.win_delay);
                GameEvent::GenerationFailed(e)
            }
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// True between a detected win and the next level.
    pub fn is_pausing(&self) -> bool {
        self.regen_in.is_some()
    }
}
