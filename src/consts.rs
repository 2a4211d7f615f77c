//! Assorted constants & hard-coded presentation settings
use ratatui::style::{Color, Modifier, Style};
use std::time::Duration;

/// Time to wait for input before drawing the next frame
pub(crate) const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Terminals only report key presses, so the accelerator counts as held until
/// this long after the most recent press of it (key auto-repeat keeps
/// renewing it).
pub(crate) const ACCELERATE_HOLD: Duration = Duration::from_millis(600);

/// Number of terminal columns used to draw a single board cell
pub(crate) const CELL_WIDTH: u16 = 2;

/// Glyph for the snake's head when it is moving north/up
pub(crate) const HEAD_NORTH_GLYPH: [char; 2] = ['^', '^'];

/// Glyph for the snake's head when it is moving south/down
pub(crate) const HEAD_SOUTH_GLYPH: [char; 2] = ['v', 'v'];

/// Glyph for the snake's head when it is moving east/right
pub(crate) const HEAD_EAST_GLYPH: [char; 2] = ['>', '>'];

/// Glyph for the snake's head when it is moving west/left
pub(crate) const HEAD_WEST_GLYPH: [char; 2] = ['<', '<'];

/// Glyph for the snake's head while it is pressed against a stone
pub(crate) const COLLISION_GLYPH: [char; 2] = ['×', '×'];

/// Glyph for the parts of the snake's body
pub(crate) const SEGMENT_GLYPH: [char; 2] = ['█', '█'];

/// Glyph for a shed tail segment as it fades out
pub(crate) const GHOST_GLYPH: [char; 2] = ['░', '░'];

/// Glyph for the apple once it has grown in
pub(crate) const APPLE_GLYPH: [char; 2] = ['▐', '▌'];

/// Glyph for the apple during the first half of its appearance
pub(crate) const APPLE_SEED_GLYPH: [char; 2] = ['▗', '▖'];

/// Glyph marking where the next apple will appear
pub(crate) const HINT_GLYPH: [char; 2] = ['·', '·'];

/// Glyph for stones
pub(crate) const STONE_GLYPH: [char; 2] = ['▓', '▓'];

/// Particles smaller than this many pixels are drawn with
/// [`SPARK_SMALL_SYMBOL`]
pub(crate) const SPARK_MIN_SIZE: f32 = 2.5;

/// Glyph for a small particle of any shape
pub(crate) const SPARK_SMALL_SYMBOL: char = '·';

/// Glyph for a round particle
pub(crate) const SPARK_CIRCLE_SYMBOL: char = '•';

/// Glyph for a square particle
pub(crate) const SPARK_SQUARE_SYMBOL: char = '▪';

/// Foreground for the facing marks drawn on the snake's head
pub(crate) const HEAD_MARK_COLOR: Color = Color::Black;

/// Style for [`COLLISION_GLYPH`]
pub(crate) const COLLISION_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .add_modifier(Modifier::REVERSED);

/// Style for key codes shown in the interface
pub(crate) const KEY_STYLE: Style = Style::new().fg(Color::Yellow);

/// Style for the status bar at the top of the game screen
pub(crate) const STATUS_BAR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

/// Style for the currently-selected menu item
pub(crate) const MENU_SELECTION_STYLE: Style = Style::new().add_modifier(Modifier::UNDERLINED);
