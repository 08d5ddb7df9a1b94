use clap::Parser;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::info;
use reflow::config::{DEFAULT_EMPTY_COUNT, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use reflow::flow;
use reflow::{Cell, Direction, Game, GameEvent, Geometry, LevelConfig, Openings};
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;
const DEFAULT_RENDER_FPS: u64 = 60;
const DEFAULT_CHECK_MS: u64 = 500;
const DEFAULT_WIN_DELAY_MS: u64 = 500;

/// Rotate pipes until water runs from the inlet to the outlet.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grid width in cells
    #[arg(short = 'W', long, default_value_t = DEFAULT_WIDTH)]
    width: usize,

    /// Grid height in cells
    #[arg(short = 'H', long, default_value_t = DEFAULT_HEIGHT)]
    height: usize,

    /// Non-path cells left empty
    #[arg(short, long, default_value_t = DEFAULT_EMPTY_COUNT)]
    empty: usize,

    /// Seed for reproducible levels
    #[arg(short, long)]
    seed: Option<u64>,

    /// Milliseconds between win checks
    #[arg(long, env = "REFLOW_CHECK_MS", default_value_t = DEFAULT_CHECK_MS)]
    check_ms: u64,

    /// Milliseconds between a win and the next level
    #[arg(long, default_value_t = DEFAULT_WIN_DELAY_MS)]
    win_delay_ms: u64,

    /// Render frames per second
    #[arg(long, env = "REFLOW_FPS", default_value_t = DEFAULT_RENDER_FPS)]
    fps: u64,

    /// Recompute water right after each rotation
    #[arg(long)]
    instant_flow: bool,

    /// Start levels in their solved orientation
    #[arg(long)]
    no_scramble: bool,

    /// Seconds for the whole run; when they run out the game is over
    #[arg(long, env = "REFLOW_TIME_LIMIT")]
    time_limit: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn level_config(&self) -> LevelConfig {
        LevelConfig {
            check_interval: Duration::from_millis(self.check_ms),
            win_delay: Duration::from_millis(self.win_delay_ms),
            scramble: !self.no_scramble,
            flow_on_rotate: self.instant_flow,
            ..LevelConfig::default().with_size(self.width, self.height, self.empty)
        }
    }
}

/// Time left in the run. Carries over between levels and resets only on restart.
struct Countdown {
    limit: Option<Duration>,
    left: Duration,
}

impl Countdown {
    fn new(limit: Option<Duration>) -> Self {
        Self {
            limit,
            left: limit.unwrap_or(Duration::ZERO),
        }
    }

    fn restart(&mut self) {
        *self = Self::new(self.limit);
    }

    /// Spend `elapsed`; true on the tick that empties the budget.
    fn tick(&mut self, elapsed: Duration) -> bool {
        if self.limit.is_none() || self.left.is_zero() {
            return false;
        }
        self.left = self.left.saturating_sub(elapsed);
        self.left.is_zero()
    }

    fn is_over(&self) -> bool {
        self.limit.is_some() && self.left.is_zero()
    }

    fn seconds_left(&self) -> Option<u64> {
        self.limit.map(|_| self.left.as_secs_f64().ceil() as u64)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Pipe(Openings),
    Empty,
    Inlet,
    Outlet,
    Blank,
}

#[derive(Clone, Copy, PartialEq)]
struct Sprite {
    glyph: Glyph,
    color: Color,
    highlight: bool,
}

const BLANK: Sprite = Sprite {
    glyph: Glyph::Blank,
    color: Color::Reset,
    highlight: false,
};

/// Board columns run from the outlet (x = -1) to the inlet (x = width).
struct Renderer {
    width: usize,
    height: usize,
    last: Vec<Sprite>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            last: vec![BLANK; (width + 2) * height],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    fn board_cols(&self) -> u16 {
        ((self.width + 2) * CELL_W) as u16
    }

    /// Screen position of a board cell; y grows upward on the board.
    fn screen_pos(&self, cell: Cell) -> (u16, u16) {
        let col = self.origin_x + ((cell.x + 1) as usize * CELL_W) as u16;
        let row = self.origin_y + (self.height as i32 - 1 - cell.y) as u16;
        (col, row)
    }

    /// World-space point under a terminal position.
    fn world_at(&self, column: u16, row: u16, geometry: &Geometry) -> (f32, f32) {
        let grid_left = i32::from(self.origin_x) + CELL_W as i32;
        let fx = (i32::from(column) - grid_left) as f32 / CELL_W as f32 + 0.5 / CELL_W as f32;
        let fy = (i32::from(row) - i32::from(self.origin_y)) as f32 + 0.5;
        (
            (fx - self.width as f32 * 0.5) * geometry.cell_size + geometry.origin.0,
            (self.height as f32 * 0.5 - fy) * geometry.cell_size + geometry.origin.1,
        )
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut game = Game::new(args.level_config(), args.seed);
    game.generate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    info!("starting reflow with {:?}", game.config());

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    stdout.execute(Hide)?;

    let countdown = Countdown::new(args.time_limit.map(Duration::from_secs));
    let result = run(&mut stdout, &mut game, countdown, args.fps);

    stdout.execute(Show)?;
    stdout.execute(DisableMouseCapture)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run(stdout: &mut Stdout, game: &mut Game, mut countdown: Countdown, fps: u64) -> io::Result<()> {
    let (width, height) = board_size(game);
    let mut renderer = Renderer::new(width, height);
    let mut cursor = game.grid().map_or(Cell::new(0, 0), |g| g.start());
    let mut last_update = Instant::now();
    let mut status = String::new();
    let frame_time = Duration::from_micros(1_000_000 / fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    KeyCode::Char('r') if countdown.is_over() => {
                        let mut fresh = Game::new(game.config().clone(), None);
                        match fresh.generate() {
                            Ok(()) => {
                                info!("restarting after game over at level {}", game.level());
                                *game = fresh;
                                countdown.restart();
                                status.clear();
                            }
                            Err(e) => status = format!("Restart failed: {e}"),
                        }
                    }
                    KeyCode::Char('r') => match game.generate() {
                        Ok(()) => status.clear(),
                        Err(e) => status = format!("New level failed: {e}"),
                    },
                    _ if countdown.is_over() => {}
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        game.on_cell_clicked(cursor);
                    }
                    KeyCode::Up | KeyCode::Char('k') => move_cursor(&mut cursor, Direction::Up, game),
                    KeyCode::Down | KeyCode::Char('j') => {
                        move_cursor(&mut cursor, Direction::Down, game)
                    }
                    KeyCode::Left | KeyCode::Char('h') => {
                        move_cursor(&mut cursor, Direction::Left, game)
                    }
                    KeyCode::Right | KeyCode::Char('l') => {
                        move_cursor(&mut cursor, Direction::Right, game)
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => {
                    if mouse.kind == MouseEventKind::Down(MouseButton::Left) && !countdown.is_over() {
                        let (x, y) = renderer.world_at(mouse.column, mouse.row, game.geometry());
                        if let Some(cell) = game.geometry().world_to_cell(x, y) {
                            cursor = cell;
                        }
                        game.on_world_clicked(x, y);
                    }
                }
                Event::Resize(_, _) => renderer.needs_full = true,
                _ => {}
            }
        }

        let elapsed = last_update.elapsed();
        last_update = Instant::now();
        if countdown.is_over() {
            render(stdout, game, &mut renderer, cursor, &countdown, &status)?;
            pace(frame_start, frame_time);
            continue;
        }
        if countdown.tick(elapsed) {
            info!("time is up at level {} after {} moves", game.level(), game.moves());
            status = format!("GAME OVER at level {}! r restart, q quit", game.level());
            continue;
        }

        match game.update(elapsed) {
            Some(GameEvent::Solved { level, moves }) => {
                status = format!("Solved level {level} in {moves} moves!");
            }
            Some(GameEvent::Regenerated { .. }) => {
                status.clear();
                let (width, height) = board_size(game);
                if (width, height) != (renderer.width, renderer.height) {
                    renderer = Renderer::new(width, height);
                }
            }
            Some(GameEvent::GenerationFailed(e)) => status = format!("Next level failed: {e}"),
            None => {}
        }

        render(stdout, game, &mut renderer, cursor, &countdown, &status)?;
        pace(frame_start, frame_time);
    }
}

fn pace(frame_start: Instant, frame_time: Duration) {
    let elapsed = frame_start.elapsed();
    if elapsed < frame_time {
        thread::sleep(frame_time - elapsed);
    }
}

fn board_size(game: &Game) -> (usize, usize) {
    game.grid().map_or((0, 0), |g| (g.width(), g.height()))
}

fn move_cursor(cursor: &mut Cell, dir: Direction, game: &Game) {
    if let Some(grid) = game.grid() {
        let next = cursor.step(dir);
        if grid.in_bounds(next) {
            *cursor = next;
        }
    }
}

fn render(
    stdout: &mut Stdout,
    game: &Game,
    renderer: &mut Renderer,
    cursor: Cell,
    countdown: &Countdown,
    status: &str,
) -> io::Result<()> {
    let Some(grid) = game.grid() else {
        return Ok(());
    };
    let needed_w = renderer.board_cols();
    let needed_h = (renderer.height + 2) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }
    if renderer.needs_full {
        stdout.queue(Clear(ClearType::All))?;
    }

    let mut hud = format!("Level: {}  Moves: {}", game.level(), game.moves());
    if let Some(secs) = countdown.seconds_left() {
        hud.push_str(&format!("  Time: {secs}s"));
    }
    if status.is_empty() {
        hud.push_str("  (click/space rotate, r new, q quit)");
    } else {
        hud.push_str("  ");
        hud.push_str(status);
    }
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(0, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    let solved = flow::is_solved(grid);
    for y in 0..renderer.height as i32 {
        for x in -1..=renderer.width as i32 {
            let cell = Cell::new(x, y);
            let sprite = if cell == grid.inlet() {
                Sprite {
                    glyph: Glyph::Inlet,
                    color: Color::Cyan,
                    highlight: false,
                }
            } else if cell == grid.outlet() {
                Sprite {
                    glyph: Glyph::Outlet,
                    color: if solved { Color::Cyan } else { Color::DarkGrey },
                    highlight: false,
                }
            } else if grid.in_bounds(cell) {
                sprite_for(game, cell, cell == cursor)
            } else {
                BLANK
            };
            let idx = y as usize * (renderer.width + 2) + (x + 1) as usize;
            if renderer.needs_full || sprite != renderer.last[idx] {
                renderer.last[idx] = sprite;
                draw_sprite(stdout, renderer, cell, sprite)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn sprite_for(game: &Game, cell: Cell, highlight: bool) -> Sprite {
    match game.piece_visual_state(cell) {
        Some(visual) => Sprite {
            glyph: Glyph::Pipe(visual.openings),
            color: if visual.has_water {
                Color::Cyan
            } else {
                Color::White
            },
            highlight,
        },
        None => Sprite {
            glyph: Glyph::Empty,
            color: Color::DarkGrey,
            highlight,
        },
    }
}

fn draw_sprite(stdout: &mut Stdout, renderer: &Renderer, cell: Cell, sprite: Sprite) -> io::Result<()> {
    let text = match sprite.glyph {
        Glyph::Pipe(openings) => {
            let tail = if openings.contains(Direction::Right) { '━' } else { ' ' };
            format!("{}{}", pipe_char(openings), tail)
        }
        Glyph::Empty => "· ".to_string(),
        Glyph::Inlet => "━━".to_string(),
        Glyph::Outlet => "◀━".to_string(),
        Glyph::Blank => "  ".to_string(),
    };
    let (x_pos, y_pos) = renderer.screen_pos(cell);
    stdout.queue(MoveTo(x_pos, y_pos))?;
    if sprite.highlight {
        stdout.queue(SetBackgroundColor(Color::DarkBlue))?;
    }
    stdout.queue(SetForegroundColor(sprite.color))?;
    stdout.queue(Print(&text))?;
    let w = UnicodeWidthStr::width(text.as_str());
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

/// Heavy box-drawing character whose arms match the openings.
fn pipe_char(openings: Openings) -> char {
    let up = openings.contains(Direction::Up);
    let right = openings.contains(Direction::Right);
    let down = openings.contains(Direction::Down);
    let left = openings.contains(Direction::Left);
    match (up, right, down, left) {
        (false, false, false, false) => '·',
        (true, false, false, false) => '╹',
        (false, true, false, false) => '╺',
        (false, false, true, false) => '╻',
        (false, false, false, true) => '╸',
        (true, false, true, false) => '┃',
        (false, true, false, true) => '━',
        (true, true, false, false) => '┗',
        (false, true, true, false) => '┏',
        (false, false, true, true) => '┓',
        (true, false, false, true) => '┛',
        (true, true, true, false) => '┣',
        (false, true, true, true) => '┳',
        (true, false, true, true) => '┫',
        (true, true, false, true) => '┻',
        (true, true, true, true) => '╋',
    }
}
