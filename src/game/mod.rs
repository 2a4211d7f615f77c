mod paused;
use self::paused::{PauseOpt, Paused};
use crate::app::Screen;
use crate::command::Command;
use crate::config::Rgb;
use crate::consts;
use crate::highscores::error_chain;
use crate::particles::Shape;
use crate::round::{Intent, Round};
use crate::sim::direction::Direction;
use crate::sim::grid::Grid;
use crate::snapshot::{Drawable, Snapshot, Sprite};
use crate::util::{center_rect, Globals};
use crossterm::event::{poll, read, Event};
use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Margin, Position, Rect, Size},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
    Frame,
};
use std::time::Instant;

/// The game screen: a [`Round`] driven by wall-clock frames and keyboard
/// input, plus the pause menu and game-over prompt around it
#[derive(Clone, Debug)]
pub(crate) struct Game<R = StdRng> {
    round: Round<R>,
    globals: Globals,
    menu: Option<Paused>,
    last_frame: Option<Instant>,
    /// When the accelerator is held, the moment at which it counts as
    /// released unless pressed again
    accelerate_until: Option<Instant>,
}

impl Game<StdRng> {
    pub(crate) fn new(globals: Globals) -> Self {
        let rng = match globals.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Game::new_with_rng(globals, rng)
    }
}

impl<R: Rng + SeedableRng> Game<R> {
    pub(crate) fn new_with_rng(globals: Globals, rng: R) -> Game<R> {
        let round = Round::new(rng, &globals.config.round, globals.best_length);
        Game::from_round(round, globals)
    }
}

impl<R: Rng> Game<R> {
    pub(crate) fn from_round(round: Round<R>, globals: Globals) -> Game<R> {
        Game {
            round,
            globals,
            menu: None,
            last_frame: None,
            accelerate_until: None,
        }
    }

    /// Wait up to one frame period for input, handle it if it arrives, and
    /// then advance the round to the present
    pub(crate) fn process_input(&mut self) -> std::io::Result<Option<Screen>> {
        if poll(consts::FRAME_PERIOD)? {
            if let Some(screen) = self.handle_event(read()?, Instant::now()) {
                return Ok(Some(screen));
            }
        }
        self.advance(Instant::now());
        Ok(None)
    }

    fn advance(&mut self, now: Instant) {
        let dt = self
            .last_frame
            .replace(now)
            .map_or(0.0, |then| now.saturating_duration_since(then).as_secs_f32());
        if self.accelerate_until.is_some_and(|t| now >= t) {
            self.accelerate_until = None;
            self.round.handle(Intent::Accelerate(false));
        }
        self.round.frame(dt);
        if self.round.game_over().is_some() {
            self.record_best();
        }
    }

    fn handle_event(&mut self, event: Event, now: Instant) -> Option<Screen> {
        if let Some(ref mut menu) = self.menu {
            match menu.handle_event(event)? {
                PauseOpt::Resume => self.resume(),
                PauseOpt::Restart => return Some(self.restart()),
                PauseOpt::Quit => return self.quit(),
            }
            return None;
        }
        if event == Event::FocusLost {
            self.pause();
            return None;
        }
        let cmd = Command::from_key_event(event.as_key_press_event()?)?;
        if self.round.game_over().is_some() {
            match cmd {
                Command::R => return Some(self.restart()),
                Command::Q | Command::Quit => return self.quit(),
                _ => (),
            }
            return None;
        }
        match cmd {
            Command::Quit | Command::Q => return self.quit(),
            Command::Up => self.round.handle(Intent::Turn(Direction::North)),
            Command::Left => self.round.handle(Intent::Turn(Direction::West)),
            Command::Down => self.round.handle(Intent::Turn(Direction::South)),
            Command::Right => self.round.handle(Intent::Turn(Direction::East)),
            Command::Space => {
                if self.accelerate_until.is_none() {
                    self.round.handle(Intent::Accelerate(true));
                }
                self.accelerate_until = Some(now + consts::ACCELERATE_HOLD);
            }
            Command::Esc | Command::P => self.pause(),
            _ => (),
        }
        None
    }

    fn pause(&mut self) {
        if self.round.game_over().is_none() && !self.round.is_paused() {
            self.round.handle(Intent::TogglePause);
            self.menu = Some(Paused::new());
        }
    }

    fn resume(&mut self) {
        self.menu = None;
        if self.round.is_paused() {
            self.round.handle(Intent::TogglePause);
        }
        // Don't count the time spent in the menu as one long frame
        self.last_frame = None;
    }

    fn restart(&mut self) -> Screen {
        self.record_best();
        let mut globals = self.globals.clone();
        globals.seed = globals.seed.map(|s| s.wrapping_add(1));
        Screen::Game(Box::new(Game::new(globals)))
    }

    fn quit(&mut self) -> Option<Screen> {
        self.round.handle(Intent::Quit);
        self.round.quit_requested().then(|| {
            self.record_best();
            Screen::Quit
        })
    }

    /// Persist the round's best length if it beats the stored record
    fn record_best(&mut self) {
        let best = self.round.best_length();
        if best > self.globals.best_length {
            self.globals.best_length = best;
            match self.globals.config.save_best_length(best) {
                Ok(()) => log::info!("New best length: {best}"),
                Err(e) => log::error!("Failed to save best length: {}", error_chain(&e)),
            }
        }
    }
}

impl<R> Game<R> {
    pub(crate) fn draw(&self, frame: &mut Frame<'_>) {
        frame.render_widget(self, frame.area());
    }
}

impl<R> Widget for &Game<R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.round.snapshot();
        let board = board_size(snapshot.grid);
        let status = Line::styled(
            format!(
                " Length: {}  Best: {}  Speed: x{:.1}",
                snapshot.length, snapshot.best_length, snapshot.speed
            ),
            consts::STATUS_BAR_STYLE,
        );
        let messages = snapshot.overlay.game_over_reason().map(|reason| {
            [
                Line::raw(format!(" — GAME OVER: {reason} —")),
                Line::from_iter([
                    Span::raw(" Restart ("),
                    Span::styled("r", consts::KEY_STYLE),
                    Span::raw(") — Quit ("),
                    Span::styled("q", consts::KEY_STYLE),
                    Span::raw(")"),
                ]),
            ]
        });
        // Widen the display past the board when the text would be clipped
        let text_width = messages
            .iter()
            .flatten()
            .chain([&status])
            .map(Line::width)
            .max()
            .unwrap_or(0);
        let display = center_rect(
            area,
            Size {
                width: board
                    .width
                    .saturating_add(2)
                    .max(u16::try_from(text_width).unwrap_or(u16::MAX)),
                height: board.height.saturating_add(5),
            },
        );
        let [status_area, block_area, msg1_area, msg2_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(display);
        status.render(status_area, buf);

        let block_area = center_rect(
            block_area,
            Size {
                width: board.width.saturating_add(2),
                height: board.height.saturating_add(2),
            },
        );
        Block::bordered().render(block_area, buf);
        let mut canvas = Canvas {
            area: block_area.inner(Margin::new(1, 1)),
            size: board,
            buf,
        };
        draw_sprites(&mut canvas, &snapshot);

        if let Some([msg1, msg2]) = messages {
            msg1.render(msg1_area, buf);
            msg2.render(msg2_area, buf);
        } else if snapshot.overlay.paused {
            let menu = self.menu.unwrap_or_else(Paused::new);
            let pause_area = center_rect(
                display,
                Size {
                    width: Paused::WIDTH,
                    height: Paused::HEIGHT,
                },
            );
            menu.render(pause_area, buf);
        }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Color {
        Color::Rgb(rgb.r, rgb.g, rgb.b)
    }
}

/// Size of the board in terminal cells, excluding its border
fn board_size(grid: Grid) -> Size {
    Size {
        width: grid.width.saturating_mul(consts::CELL_WIDTH),
        height: grid.height,
    }
}

/// Terminal position on the board of a sprite whose top-left corner is at
/// `pos`.  Horizontal positions have half-cell resolution.
fn board_position(grid: Grid, pos: Vec2) -> Position {
    let cell = f32::from(grid.cell_size);
    let cols = f32::from(board_size(grid).width);
    let x = (pos.x / cell * f32::from(consts::CELL_WIDTH))
        .round()
        .rem_euclid(cols);
    let y = (pos.y / cell).round().rem_euclid(f32::from(grid.height));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x, y) = (x as u16, y as u16);
    Position::new(x, y)
}

/// Terminal position of the board column containing the particle centered
/// at `pos`
fn spark_position(grid: Grid, pos: Vec2) -> Position {
    let cell = f32::from(grid.cell_size);
    let cols = f32::from(board_size(grid).width);
    let x = (pos.x / cell * f32::from(consts::CELL_WIDTH))
        .floor()
        .rem_euclid(cols);
    let y = (pos.y / cell).floor().rem_euclid(f32::from(grid.height));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x, y) = (x as u16, y as u16);
    Position::new(x, y)
}

fn head_glyph(facing: Direction) -> [char; 2] {
    match facing {
        Direction::North => consts::HEAD_NORTH_GLYPH,
        Direction::South => consts::HEAD_SOUTH_GLYPH,
        Direction::East => consts::HEAD_EAST_GLYPH,
        Direction::West => consts::HEAD_WEST_GLYPH,
    }
}

fn draw_sprites(canvas: &mut Canvas<'_>, snapshot: &Snapshot) {
    let grid = snapshot.grid;
    for sprite in &snapshot.sprites {
        let fg = Style::new().fg(sprite.color().into());
        let (glyph, style) = match sprite {
            Sprite::SparkSprite(spark) => {
                let symbol = match spark.shape {
                    _ if spark.size < consts::SPARK_MIN_SIZE => consts::SPARK_SMALL_SYMBOL,
                    Shape::Circle => consts::SPARK_CIRCLE_SYMBOL,
                    Shape::Square => consts::SPARK_SQUARE_SYMBOL,
                };
                canvas.draw_char(spark_position(grid, spark.pos), symbol, fg);
                continue;
            }
            Sprite::HeadSprite(head) if head.stopped => {
                (consts::COLLISION_GLYPH, consts::COLLISION_STYLE)
            }
            Sprite::HeadSprite(head) => (
                head_glyph(head.facing),
                Style::new()
                    .fg(consts::HEAD_MARK_COLOR)
                    .bg(head.color.into())
                    .add_modifier(Modifier::BOLD),
            ),
            Sprite::SegmentSprite(_) => (consts::SEGMENT_GLYPH, fg),
            Sprite::GhostSprite(_) => (consts::GHOST_GLYPH, fg),
            Sprite::AppleSprite(apple) => {
                let glyph = if apple.scale < 0.5 {
                    consts::APPLE_SEED_GLYPH
                } else {
                    consts::APPLE_GLYPH
                };
                // Brighten from half intensity as the apple appears
                let color = apple.color.scale(0.5 + apple.phase / 2.0);
                (glyph, Style::new().fg(color.into()))
            }
            Sprite::HintSprite(_) => (consts::HINT_GLYPH, fg),
            Sprite::StoneSprite(_) => (consts::STONE_GLYPH, fg),
        };
        canvas.draw_glyph(board_position(grid, sprite.position()), glyph, style);
    }
}

/// The drawable board area.  Positions wrap around `size`, which may be
/// larger than `area` if the terminal is too small.
#[derive(Debug, Eq, PartialEq)]
struct Canvas<'a> {
    area: Rect,
    size: Size,
    buf: &'a mut Buffer,
}

impl Canvas<'_> {
    fn draw_char(&mut self, pos: Position, symbol: char, style: Style) {
        if self.size.width == 0 || self.size.height == 0 {
            return;
        }
        let x = pos.x % self.size.width;
        let y = pos.y % self.size.height;
        if x >= self.area.width || y >= self.area.height {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((self.area.x + x, self.area.y + y)) {
            cell.set_char(symbol);
            cell.set_style(Style::reset().patch(style));
        }
    }

    fn draw_glyph(&mut self, pos: Position, glyph: [char; 2], style: Style) {
        for (dx, symbol) in (0..).zip(glyph) {
            let x = (u32::from(pos.x) + dx) % u32::from(self.size.width.max(1));
            let x = u16::try_from(x).unwrap_or_default();
            self.draw_char(Position { x, ..pos }, symbol, style);
        }
    }
}
