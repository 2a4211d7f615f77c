use crate::highscores::{BestLength, SaveError};
use crate::sim::grid::Grid;
use crate::util::{best_length_file_path, log_file_path};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Program configuration read from a configuration file
#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
pub(crate) struct Config {
    /// Parameters for every round played
    #[serde(default)]
    pub(crate) round: RoundConfig,

    /// Settings about data files
    #[serde(default)]
    pub(crate) files: FileConfig,
}

impl Config {
    /// Return the default configuration file path
    pub(crate) fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_local_dir()
            .map(|p| p.join("stonesnake").join("config.toml"))
            .ok_or(ConfigError::NoPath)
    }

    /// Read configuration from a file on disk.  If the file does not exist and
    /// `allow_missing` is true, a default `Config` value is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file could not be read, if the file's contents
    /// could not be deserialized, or if the resulting round parameters are
    /// unusable.
    pub(crate) fn load(path: &Path, allow_missing: bool) -> Result<Config, ConfigError> {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                return Ok(Config::default())
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };
        Config::from_toml(&content)
    }

    pub(crate) fn from_toml(src: &str) -> Result<Config, ConfigError> {
        let config = toml::from_str::<Config>(src)?;
        config.round.validate()?;
        Ok(config)
    }

    /// Read the best snake length recorded so far.  Any failure is logged
    /// and yields the default of 1.
    pub(crate) fn load_best_length(&self) -> u32 {
        match self.files.best_length_file() {
            Some(p) => BestLength::load(&p),
            None => {
                log::warn!("Could not determine path to best-length file; starting from 1");
                BestLength::DEFAULT
            }
        }
    }

    /// Save the best snake length.
    ///
    /// If `self.files.save_best` is `false`, nothing is saved.
    pub(crate) fn save_best_length(&self, length: u32) -> Result<(), SaveError> {
        if !self.files.save_best {
            return Ok(());
        }
        if let Some(p) = self.files.best_length_file() {
            BestLength::save(&p, length)
        } else {
            Err(SaveError::no_path())
        }
    }
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct FileConfig {
    /// Path at which the best snake length should be stored
    best_length_file: Option<PathBuf>,

    /// Whether to save the best snake length at the end of a round
    save_best: bool,

    /// Path of the log file
    log_file: Option<PathBuf>,
}

impl FileConfig {
    fn best_length_file(&self) -> Option<Cow<'_, Path>> {
        self.best_length_file
            .as_deref()
            .map(Cow::from)
            .or_else(|| best_length_file_path().map(Cow::from))
    }

    pub(crate) fn log_file(&self) -> Option<Cow<'_, Path>> {
        self.log_file
            .as_deref()
            .map(Cow::from)
            .or_else(|| log_file_path().map(Cow::from))
    }
}

impl Default for FileConfig {
    fn default() -> FileConfig {
        FileConfig {
            best_length_file: None,
            save_best: true,
            log_file: None,
        }
    }
}

/// Everything a round needs to know, fixed for the round's lifetime
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct RoundConfig {
    pub(crate) grid: GridConfig,
    pub(crate) speed: SpeedConfig,
    pub(crate) snake: SnakeConfig,
    pub(crate) stones: StoneConfig,
    pub(crate) animation: AnimationConfig,
    pub(crate) apple: AppleConfig,
    pub(crate) particles: ParticleConfig,
    pub(crate) colors: Palette,
}

impl RoundConfig {
    pub(crate) fn grid(&self) -> Grid {
        Grid::new(self.grid.width, self.grid.height, self.grid.cell_size)
    }

    pub(crate) fn validate(&self) -> Result<(), InvalidConfig> {
        let GridConfig {
            width,
            height,
            cell_size,
        } = self.grid;
        if width == 0 || height == 0 || cell_size == 0 {
            return Err(InvalidConfig::EmptyGrid);
        }
        let s = &self.speed;
        for (name, value) in [
            ("speed.base-speed", s.base_speed),
            ("speed.acceleration", s.acceleration),
            ("speed.deceleration", s.deceleration),
            ("animation.move-duration", self.animation.move_duration),
            ("animation.grow-duration", self.animation.grow_duration),
            ("animation.shrink-duration", self.animation.shrink_duration),
            ("animation.twitch-duration", self.animation.twitch_duration),
            ("animation.appear-duration", self.animation.appear_duration),
            ("apple.hint-pulse-interval", self.apple.hint_pulse_interval),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(InvalidConfig::NotPositive(name));
            }
        }
        if !(s.max_multiplier.is_finite() && s.max_multiplier >= 1.0) {
            return Err(InvalidConfig::MaxMultiplier);
        }
        let initial = self.snake.initial_length;
        if initial == 0 || initial > usize::from(width.min(height)) {
            return Err(InvalidConfig::InitialLength(initial));
        }
        if !(0.0..=1.0).contains(&self.snake.tail_brightness) {
            return Err(InvalidConfig::TailBrightness);
        }
        let st = &self.stones;
        if st.min_count > st.max_count {
            return Err(InvalidConfig::Range("stones.min-count", "stones.max-count"));
        }
        if st.min_size == 0 {
            return Err(InvalidConfig::NotPositive("stones.min-size"));
        }
        if st.min_size > st.max_size {
            return Err(InvalidConfig::Range("stones.min-size", "stones.max-size"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct GridConfig {
    /// Number of cells across
    pub(crate) width: u16,
    /// Number of cells down
    pub(crate) height: u16,
    /// Pixel size of one cell
    pub(crate) cell_size: u16,
}

impl Default for GridConfig {
    fn default() -> GridConfig {
        GridConfig {
            width: 32,
            height: 24,
            cell_size: 20,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct SpeedConfig {
    /// Cells per second at a multiplier of 1
    pub(crate) base_speed: f32,
    /// Increase of the speed multiplier per second while accelerating
    pub(crate) acceleration: f32,
    /// Decrease of the speed multiplier per second after accelerating stops
    pub(crate) deceleration: f32,
    pub(crate) max_multiplier: f32,
}

impl Default for SpeedConfig {
    fn default() -> SpeedConfig {
        SpeedConfig {
            base_speed: 3.0,
            acceleration: 2.0,
            deceleration: 1.5,
            max_multiplier: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct SnakeConfig {
    /// Length of a freshly spawned snake.  A snake stuck against a stone
    /// that shrinks below this length ends the round.
    pub(crate) initial_length: usize,
    /// Brightness of the tail segment relative to the head
    pub(crate) tail_brightness: f32,
}

impl Default for SnakeConfig {
    fn default() -> SnakeConfig {
        SnakeConfig {
            initial_length: 3,
            tail_brightness: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct StoneConfig {
    pub(crate) min_count: usize,
    pub(crate) max_count: usize,
    /// Smallest footprint width/height of a stone group
    pub(crate) min_size: u16,
    /// Largest footprint width/height of a stone group
    pub(crate) max_size: u16,
    /// Minimum wrap-aware Chebyshev distance between two groups' anchors
    pub(crate) min_distance: u16,
    /// Number of anchors to try per group before giving up on it
    pub(crate) placement_attempts: u32,
}

impl Default for StoneConfig {
    fn default() -> StoneConfig {
        StoneConfig {
            min_count: 3,
            max_count: 7,
            min_size: 2,
            max_size: 4,
            min_distance: 5,
            placement_attempts: 200,
        }
    }
}

/// Animation timings, in seconds
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct AnimationConfig {
    pub(crate) move_duration: f32,
    pub(crate) grow_duration: f32,
    pub(crate) shrink_duration: f32,
    pub(crate) twitch_duration: f32,
    pub(crate) appear_duration: f32,
    /// Peak twitch displacement as a fraction of the cell size
    pub(crate) twitch_amplitude: f32,
}

impl Default for AnimationConfig {
    fn default() -> AnimationConfig {
        AnimationConfig {
            move_duration: 0.15,
            grow_duration: 0.2,
            shrink_duration: 0.3,
            twitch_duration: 0.4,
            appear_duration: 0.28,
            twitch_amplitude: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct AppleConfig {
    /// The next apple position is previewed while the snake's head is within
    /// this Chebyshev distance of the current apple
    pub(crate) hint_radius: u16,
    /// Seconds between particle pulses on the previewed cell
    pub(crate) hint_pulse_interval: f32,
}

impl Default for AppleConfig {
    fn default() -> AppleConfig {
        AppleConfig {
            hint_radius: 3,
            hint_pulse_interval: 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct ParticleConfig {
    /// Emissions beyond this many live particles are dropped
    pub(crate) max_particles: usize,
}

impl Default for ParticleConfig {
    fn default() -> ParticleConfig {
        ParticleConfig { max_particles: 256 }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub(crate) struct Palette {
    pub(crate) snake: Rgb,
    pub(crate) apple: Rgb,
    pub(crate) stone: Rgb,
}

impl Default for Palette {
    fn default() -> Palette {
        Palette {
            snake: Rgb::new(0, 255, 0),
            apple: Rgb::new(255, 0, 0),
            stone: Rgb::new(128, 128, 128),
        }
    }
}

/// An RGB color, written in configuration files as a `[r, g, b]` array
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(from = "[u8; 3]")]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Multiply every channel by `factor`, clamped to `[0, 1]`
    pub(crate) fn scale(self, factor: f32) -> Rgb {
        let factor = factor.clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ch = |c: u8| (f32::from(c) * factor) as u8;
        Rgb::new(ch(self.r), ch(self.g), ch(self.b))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Rgb {
        Rgb { r, g, b }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to determine path to local configuration directory")]
    NoPath,
    #[error("failed to read configuration file")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
    #[error("invalid round configuration")]
    Invalid(#[from] InvalidConfig),
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum InvalidConfig {
    #[error("grid width, height, and cell size must all be nonzero")]
    EmptyGrid,
    #[error("{0} must be a positive number")]
    NotPositive(&'static str),
    #[error("speed.max-multiplier must be at least 1")]
    MaxMultiplier,
    #[error("snake.initial-length {0} does not fit on the grid")]
    InitialLength(usize),
    #[error("snake.tail-brightness must be between 0 and 1")]
    TailBrightness,
    #[error("{0} must not exceed {1}")]
    Range(&'static str, &'static str),
}
