//! Immutable, render-ready views of a round
use crate::anim::AnimationLayer;
use crate::config::{Palette, Rgb};
use crate::particles::{ParticleSystem, Shape};
use crate::sim::direction::Direction;
use crate::sim::grid::Grid;
use crate::sim::{GameOverReason, Simulation};
use enum_dispatch::enum_dispatch;
use glam::Vec2;

/// Brightness factor applied to the apple color when drawing the preview of
/// the next apple
const HINT_BRIGHTNESS: f32 = 0.45;

/// Drawing order, back to front
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum Layer {
    Particles,
    Stones,
    Apple,
    Body,
    Head,
}

/// Something with a place on the board and a color
#[enum_dispatch]
pub(crate) trait Drawable {
    /// Top-left corner in board pixels, wrapped onto the board
    fn position(&self) -> Vec2;

    fn color(&self) -> Rgb;

    fn layer(&self) -> Layer;
}

#[enum_dispatch(Drawable)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Sprite {
    HeadSprite,
    SegmentSprite,
    GhostSprite,
    AppleSprite,
    HintSprite,
    StoneSprite,
    SparkSprite,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HeadSprite {
    pub(crate) pos: Vec2,
    pub(crate) color: Rgb,
    pub(crate) facing: Direction,
    /// True while the head is pressed against a stone
    pub(crate) stopped: bool,
}

impl Drawable for HeadSprite {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn color(&self) -> Rgb {
        self.color
    }

    fn layer(&self) -> Layer {
        Layer::Head
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SegmentSprite {
    pub(crate) pos: Vec2,
    pub(crate) color: Rgb,
}

impl Drawable for SegmentSprite {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn color(&self) -> Rgb {
        self.color
    }

    fn layer(&self) -> Layer {
        Layer::Body
    }
}

/// A fading tail segment that has just been shed
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GhostSprite {
    pub(crate) pos: Vec2,
    pub(crate) color: Rgb,
}

impl Drawable for GhostSprite {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn color(&self) -> Rgb {
        self.color
    }

    fn layer(&self) -> Layer {
        Layer::Body
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AppleSprite {
    pub(crate) pos: Vec2,
    pub(crate) color: Rgb,
    /// Progress of the appearance animation, from 0 to 1
    pub(crate) phase: f32,
    /// Eased size factor derived from `phase`
    pub(crate) scale: f32,
}

impl Drawable for AppleSprite {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn color(&self) -> Rgb {
        self.color
    }

    fn layer(&self) -> Layer {
        Layer::Apple
    }
}

/// Where the next apple will appear
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HintSprite {
    pub(crate) pos: Vec2,
    pub(crate) color: Rgb,
}

impl Drawable for HintSprite {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn color(&self) -> Rgb {
        self.color
    }

    fn layer(&self) -> Layer {
        Layer::Apple
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StoneSprite {
    pub(crate) pos: Vec2,
    pub(crate) color: Rgb,
}

impl Drawable for StoneSprite {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn color(&self) -> Rgb {
        self.color
    }

    fn layer(&self) -> Layer {
        Layer::Stones
    }
}

/// A single particle.  Unlike the other sprites, `pos` is the particle's
/// center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SparkSprite {
    pub(crate) pos: Vec2,
    pub(crate) color: Rgb,
    pub(crate) size: f32,
    pub(crate) shape: Shape,
}

impl Drawable for SparkSprite {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn color(&self) -> Rgb {
        self.color
    }

    fn layer(&self) -> Layer {
        Layer::Particles
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Overlay {
    pub(crate) paused: bool,
    pub(crate) game_over: Option<GameOverReason>,
}

impl Overlay {
    pub(crate) fn game_over_reason(&self) -> Option<&'static str> {
        self.game_over.map(GameOverReason::as_str)
    }
}

/// Everything needed to draw one frame.  Sprites are ordered back to front.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Snapshot {
    pub(crate) grid: Grid,
    pub(crate) sprites: Vec<Sprite>,
    pub(crate) overlay: Overlay,
    pub(crate) length: usize,
    pub(crate) best_length: u32,
    /// Current speed multiplier
    pub(crate) speed: f32,
}

impl Snapshot {
    pub(crate) fn capture<R>(
        sim: &Simulation<R>,
        anim: &AnimationLayer,
        particles: &ParticleSystem,
        overlay: Overlay,
        speed: f32,
    ) -> Snapshot {
        let grid = sim.grid();
        let config = sim.config();
        let palette: &Palette = &config.colors;
        let mut sprites = Vec::new();
        sprites.extend(particles.particles().iter().map(|p| {
            Sprite::from(SparkSprite {
                pos: grid.wrap_pixel(p.pos()),
                color: p.faded_color(),
                size: p.size(),
                shape: p.shape(),
            })
        }));
        let mut stones = sim.stones().cells().iter().copied().collect::<Vec<_>>();
        stones.sort_unstable();
        sprites.extend(stones.into_iter().map(|c| {
            Sprite::from(StoneSprite {
                pos: grid.to_pixel(c),
                color: palette.stone,
            })
        }));
        if let Some(p) = sim.apple().preview() {
            sprites.push(
                HintSprite {
                    pos: grid.to_pixel(p),
                    color: palette.apple.scale(HINT_BRIGHTNESS),
                }
                .into(),
            );
        }
        sprites.push(
            AppleSprite {
                pos: grid.to_pixel(anim.apple_cell()),
                color: palette.apple,
                phase: anim.apple_phase(),
                scale: anim.apple_scale(),
            }
            .into(),
        );
        let segments = anim.segments();
        let total = segments.len();
        let min = config.snake.tail_brightness;
        let tail_color = palette
            .snake
            .scale(segment_brightness(total.saturating_sub(1), total, min));
        let fade_config = anim.config();
        sprites.extend(anim.ghosts().iter().map(|g| {
            Sprite::from(GhostSprite {
                pos: grid.wrap_pixel(g.render()),
                color: tail_color.scale(g.fade(fade_config)),
            })
        }));
        for (i, seg) in segments.iter().enumerate().rev() {
            let pos = grid.wrap_pixel(seg.render());
            let color = palette.snake.scale(segment_brightness(i, total, min));
            if i == 0 {
                sprites.push(
                    HeadSprite {
                        pos,
                        color,
                        facing: sim.snake().direction(),
                        stopped: sim.snake().is_stopped(),
                    }
                    .into(),
                );
            } else {
                sprites.push(SegmentSprite { pos, color }.into());
            }
        }
        sprites.sort_by_key(Drawable::layer);
        Snapshot {
            grid,
            sprites,
            overlay,
            length: sim.snake().len(),
            best_length: sim.best_length(),
            speed,
        }
    }

    /// The snake's segments as `(position, color)` pairs, head first
    #[cfg(test)]
    pub(crate) fn snake(&self) -> Vec<(Vec2, Rgb)> {
        let mut segs = self
            .sprites
            .iter()
            .filter_map(|s| match s {
                Sprite::HeadSprite(h) => Some((h.pos, h.color)),
                Sprite::SegmentSprite(s) => Some((s.pos, s.color)),
                _ => None,
            })
            .collect::<Vec<_>>();
        // Segments are stored tail first with the head after them
        if let Some(head) = segs.pop() {
            segs.reverse();
            segs.insert(0, head);
        }
        segs
    }
}

/// Brightness of segment `index` of a `total`-segment snake: 1 at the head,
/// falling linearly to `min` at the tail
pub(crate) fn segment_brightness(index: usize, total: usize, min: f32) -> f32 {
    let span = total.saturating_sub(1).max(1);
    #[allow(clippy::cast_precision_loss)]
    let t = (index.min(span) as f32) / (span as f32);
    1.0 - t * (1.0 - min)
}
